use std::path::PathBuf;

use crate::lang::Lang;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_EN_FILE: &str = "f14_proposals_en.json";
pub const DEFAULT_JA_FILE: &str = "f14_proposals_ja.json";
pub const DEFAULT_RESULTS_FILE: &str = "f14_results.csv";
pub const DEFAULT_INPUT_DIR: &str = "site";
pub const DEFAULT_OUTPUT_DIR: &str = "_site";
pub const DEFAULT_TITLE: &str = "Catalyst Fund 14 Proposals";

/// Directory under the input tree copied verbatim to the output.
const STYLES_DIR: &str = "styles";

/// Resolved paths and site metadata for one run.
///
/// Built from CLI flags, each of which can also come from a
/// `CATALYST_SITE_*` environment variable.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub data_dir: PathBuf,
    pub en_file: PathBuf,
    pub ja_file: PathBuf,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub title: String,
    pub lang: Lang,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            data_dir: DEFAULT_DATA_DIR.into(),
            en_file: DEFAULT_EN_FILE.into(),
            ja_file: DEFAULT_JA_FILE.into(),
            input_dir: DEFAULT_INPUT_DIR.into(),
            output_dir: DEFAULT_OUTPUT_DIR.into(),
            title: DEFAULT_TITLE.to_string(),
            lang: Lang::default(),
        }
    }
}

impl SiteConfig {
    pub fn en_path(&self) -> PathBuf {
        self.data_dir.join(&self.en_file)
    }

    pub fn ja_path(&self) -> PathBuf {
        self.data_dir.join(&self.ja_file)
    }

    pub fn styles_dir(&self) -> PathBuf {
        self.input_dir.join(STYLES_DIR)
    }

    pub fn styles_output_dir(&self) -> PathBuf {
        self.output_dir.join(STYLES_DIR)
    }
}
