//! Site generation: listing and detail pages plus verbatim asset passthrough.

mod layouts;

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use maud::Markup;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::SiteConfig;
use crate::markdown::Filters;
use crate::proposals::{ProposalData, Record};

use layouts::{ListingEntry, PageContext};

/// Directory under the output root holding one folder per proposal.
const PROPOSALS_DIR: &str = "proposals";

#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("I/O error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to walk passthrough directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("proposals '{first}' and '{second}' both map to page '{slug}'")]
    SlugCollision {
        slug: String,
        first: String,
        second: String,
    },

    #[error("proposal_id '{0}' has no characters usable in a page path")]
    EmptySlug(String),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> SiteError + '_ {
    move |source| SiteError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildReport {
    pub pages: usize,
    pub assets: usize,
}

/// Page path segment for a proposal id: lowercase ASCII alphanumerics with
/// every other run collapsed to a single hyphen.
pub fn slugify(id: &str) -> String {
    let mut slug = String::with_capacity(id.len());
    let mut prev_hyphen = true;
    for ch in id.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            prev_hyphen = false;
        } else if !prev_hyphen {
            slug.push('-');
            prev_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

fn assign_slugs(records: &[Record]) -> Result<HashMap<&str, String>, SiteError> {
    let mut owners: HashMap<String, &str> = HashMap::with_capacity(records.len());
    let mut slugs = HashMap::with_capacity(records.len());
    for record in records {
        let slug = slugify(record.id());
        if slug.is_empty() {
            return Err(SiteError::EmptySlug(record.id().to_string()));
        }
        if let Some(first) = owners.insert(slug.clone(), record.id()) {
            return Err(SiteError::SlugCollision {
                slug,
                first: first.to_string(),
                second: record.id().to_string(),
            });
        }
        slugs.insert(record.id(), slug);
    }
    Ok(slugs)
}

fn page_href(slug: &str) -> String {
    format!("{PROPOSALS_DIR}/{slug}/index.html")
}

fn write_page(path: &Path, markup: Markup) -> Result<(), SiteError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    fs::write(path, markup.into_string()).map_err(io_error(path))?;
    debug!(path = %path.display(), "wrote page");
    Ok(())
}

/// Copy `src` to `dst` byte for byte. Returns copied file paths relative to `src`.
///
/// A missing `src` is not an error; nothing is copied.
pub fn copy_passthrough(src: &Path, dst: &Path) -> Result<Vec<PathBuf>, SiteError> {
    if !src.is_dir() {
        warn!(path = %src.display(), "passthrough directory not found, skipping");
        return Ok(Vec::new());
    }

    let mut copied = Vec::new();
    for entry in WalkDir::new(src).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(io_error(&target))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target).map_err(io_error(&target))?;
            copied.push(rel.to_path_buf());
        }
    }
    Ok(copied)
}

/// Stylesheet links for copied assets, as paths from the site root.
fn stylesheet_links(styles_root: &str, assets: &[PathBuf]) -> Vec<String> {
    assets
        .iter()
        .filter(|p| p.extension().is_some_and(|e| e.eq_ignore_ascii_case("css")))
        .map(|p| {
            let parts: Vec<String> = p
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            format!("{styles_root}/{}", parts.join("/"))
        })
        .collect()
}

/// Generate the complete site into `config.output_dir`.
pub fn build_site(
    config: &SiteConfig,
    data: &ProposalData,
    filters: &Filters,
) -> Result<BuildReport, SiteError> {
    let out = &config.output_dir;
    fs::create_dir_all(out).map_err(io_error(out))?;

    let slugs = assign_slugs(data.records())?;

    let styles_out = config.styles_output_dir();
    let assets = copy_passthrough(&config.styles_dir(), &styles_out)?;
    let styles_root = styles_out
        .strip_prefix(out)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|_| "styles".to_string());
    let stylesheets = stylesheet_links(&styles_root, &assets);
    info!(assets = assets.len(), "static assets copied");

    let groups: Vec<(&str, Vec<ListingEntry>)> = data
        .by_challenge()
        .into_iter()
        .map(|(label, records)| {
            let entries = records
                .into_iter()
                .map(|record| ListingEntry {
                    record,
                    href: page_href(&slugs[record.id()]),
                })
                .collect();
            (label, entries)
        })
        .collect();

    let index_ctx = PageContext {
        site_title: &config.title,
        lang: config.lang,
        root: "",
        stylesheets: &stylesheets,
    };
    write_page(
        &out.join("index.html"),
        layouts::index_page(&index_ctx, &groups, data.len()),
    )?;

    let detail_ctx = PageContext {
        root: "../../",
        ..index_ctx
    };
    for record in data.records() {
        let path = out.join(PROPOSALS_DIR).join(&slugs[record.id()]).join("index.html");
        write_page(&path, layouts::proposal_page(&detail_ctx, record, filters))?;
    }

    let report = BuildReport {
        pages: data.len() + 1,
        assets: assets.len(),
    };
    info!(
        pages = report.pages,
        assets = report.assets,
        output = %out.display(),
        "site generation complete"
    );
    Ok(report)
}
