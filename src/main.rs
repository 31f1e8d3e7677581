mod config;
mod lang;
mod markdown;
mod proposals;
mod site;

use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use config::SiteConfig;
use lang::Lang;
use markdown::Filters;
use proposals::ingest::{self, CsvColumns};
use proposals::{ProposalData, Source, inspect, load_records, tidy};

/// Build the bilingual Catalyst Fund 14 proposal site.
#[derive(Parser)]
#[command(name = "catalyst-site", version)]
struct Cli {
    #[command(flatten)]
    site: SiteArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args)]
struct SiteArgs {
    /// Directory holding the proposal JSON files
    #[arg(long, global = true, env = "CATALYST_SITE_DATA_DIR", default_value = config::DEFAULT_DATA_DIR)]
    data_dir: PathBuf,
    /// English proposals file, relative to the data directory
    #[arg(long, global = true, env = "CATALYST_SITE_EN_FILE", default_value = config::DEFAULT_EN_FILE)]
    en_file: PathBuf,
    /// Japanese proposals file, relative to the data directory
    #[arg(long, global = true, env = "CATALYST_SITE_JA_FILE", default_value = config::DEFAULT_JA_FILE)]
    ja_file: PathBuf,
    /// Site source directory (its `styles/` is copied verbatim)
    #[arg(long, global = true, env = "CATALYST_SITE_INPUT", default_value = config::DEFAULT_INPUT_DIR)]
    input: PathBuf,
    /// Output directory for the generated site
    #[arg(long, global = true, env = "CATALYST_SITE_OUTPUT", default_value = config::DEFAULT_OUTPUT_DIR)]
    output: PathBuf,
    /// Site title shown on every page
    #[arg(long, global = true, env = "CATALYST_SITE_TITLE", default_value = config::DEFAULT_TITLE)]
    title: String,
    /// Primary page language
    #[arg(long, global = true, env = "CATALYST_SITE_LANG", value_enum, default_value_t = Lang::Ja)]
    lang: Lang,
}

impl SiteArgs {
    fn into_config(self) -> SiteConfig {
        SiteConfig {
            data_dir: self.data_dir,
            en_file: self.en_file,
            ja_file: self.ja_file,
            input_dir: self.input,
            output_dir: self.output,
            title: self.title,
            lang: self.lang,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Merge the datasets and generate the site (default)
    Build,
    /// Print the merged proposal list as JSON
    Merge,
    /// Summarize one dataset: count, keys, long values
    Inspect {
        #[arg(value_enum, default_value_t = Lang::Ja)]
        dataset: Lang,
    },
    /// Build the English dataset from the results CSV export
    Ingest {
        /// Results CSV, relative to the data directory
        #[arg(default_value = config::DEFAULT_RESULTS_FILE)]
        csv: PathBuf,
        /// Write here instead of the English proposals file
        #[arg(long)]
        to: Option<PathBuf>,
        /// Column holding the proposal title
        #[arg(long, default_value = "Proposal")]
        title_column: String,
        /// Column holding the challenge name (omitted: every challenge is empty)
        #[arg(long)]
        challenge_column: Option<String>,
        /// Column holding the requested amount
        #[arg(long, default_value = "Requested Ada")]
        requested_column: String,
    },
    /// Repair titles and spacing in the Japanese dataset
    Tidy {
        /// Write here instead of rewriting the file in place
        #[arg(long)]
        to: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("catalyst_site=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.site.into_config();
    run(cli.command.unwrap_or(Command::Build), &config)
        .inspect_err(|e| tracing::error!("{e}"))?;
    Ok(())
}

fn run(command: Command, config: &SiteConfig) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Build => {
            info!(output = %config.output_dir.display(), "building site");
            let data = ProposalData::load(config)?;
            if data.is_empty() {
                tracing::warn!("japanese dataset is empty; only the index page will be written");
            }
            let report = site::build_site(config, &data, &Filters::new())?;
            info!(pages = report.pages, assets = report.assets, "done");
        }
        Command::Merge => {
            let data = ProposalData::load(config)?;
            let mut stdout = std::io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, data.records())?;
            writeln!(stdout)?;
        }
        Command::Inspect { dataset } => {
            let (source, path) = match dataset {
                Lang::Ja => (Source::Japanese, config.ja_path()),
                Lang::En => (Source::English, config.en_path()),
            };
            let records = load_records(source, &path)?;
            print!("{}", inspect::describe(&records));
        }
        Command::Ingest {
            csv,
            to,
            title_column,
            challenge_column,
            requested_column,
        } => {
            let columns = CsvColumns {
                title: title_column,
                challenge: challenge_column,
                requested: Some(requested_column),
            };
            let output = to.unwrap_or_else(|| config.en_path());
            ingest::ingest_file(&config.data_dir.join(csv), &output, &columns)?;
        }
        Command::Tidy { to } => {
            tidy::tidy_file(&config.ja_path(), to.as_deref())?;
        }
    }
    Ok(())
}
