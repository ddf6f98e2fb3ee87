// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{env, fs, path::Path, path::PathBuf, time::Duration};
use tracing::debug;

pub const PAGE_URL: &str =
    "https://www.gov.scot/publications/coronavirus-covid-19-trends-in-daily-data/";

/// Path segment shared by every published copy of the per-board workbook.
pub const DATASET_PATH: &str = "/binaries/content/documents/govscot/publications/statistics/2020/04/coronavirus-covid-19-trends-in-daily-data/documents/covid-19-data-by-nhs-board/";

pub const FORCE_DOWNLOAD_MARKER: &str = "?forceDownload";

/// Start of the human readable part of the download URL.
pub const FILE_NAME_MARKER: &str = "COVID-19%2B";

pub const WORKSHEET_TITLE: &str = "Table 1 - Cumulative cases";

/// Early rows hold `*` instead of counts below five, so deltas never reach
/// further back than this many rows from the newest one.
pub const DELTA_FLOOR: u32 = 39;

/// Runtime settings. Built from defaults, then an optional YAML file, then
/// `SCOTCASES_*` environment variables; the CLI applies its own flags last.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub page_url: String,
    pub dataset_path: String,
    pub file_name_marker: String,
    pub cache_dir: PathBuf,
    /// Superseded workbooks are moved here when set; otherwise they go to the
    /// system trash.
    pub trash_dir: Option<PathBuf>,
    /// How many superseded workbooks `trash_dir` keeps.
    pub trash_retain: usize,
    pub worksheet_title: String,
    pub timeout_secs: u64,
    pub delta_floor: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_url: PAGE_URL.to_string(),
            dataset_path: DATASET_PATH.to_string(),
            file_name_marker: FILE_NAME_MARKER.to_string(),
            cache_dir: PathBuf::from("ExcelFiles"),
            trash_dir: None,
            trash_retain: 5,
            worksheet_title: WORKSHEET_TITLE.to_string(),
            timeout_secs: 30,
            delta_floor: DELTA_FLOOR,
        }
    }
}

impl Config {
    /// Defaults overlaid with `file` (when given) and the environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut cfg = match file {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        cfg.apply_env(|key| env::var(key).ok())?;
        debug!(?cfg, "configuration loaded");
        Ok(cfg)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Overlay values found through `lookup`; taking a closure keeps tests off
    /// the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SCOTCASES_PAGE_URL") {
            self.page_url = v;
        }
        if let Some(v) = lookup("SCOTCASES_CACHE_DIR") {
            self.cache_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("SCOTCASES_TRASH_DIR") {
            self.trash_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("SCOTCASES_TIMEOUT_SECS") {
            self.timeout_secs = v
                .parse()
                .with_context(|| format!("SCOTCASES_TIMEOUT_SECS must be whole seconds, got `{v}`"))?;
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
