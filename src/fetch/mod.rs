// src/fetch/mod.rs

use anyhow::{Context, Result};
use reqwest::Client;

use crate::config::Config;

/// Locating the current workbook on the publication page.
pub mod links;

/// Saving a single remote file to disk.
pub mod download;

/// Build the one HTTP client used for the page fetch and the download.
pub fn client(cfg: &Config) -> Result<Client> {
    Client::builder()
        .timeout(cfg.timeout())
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building HTTP client")
}
