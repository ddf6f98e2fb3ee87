// src/fetch/download.rs

use anyhow::{Context, Result};
use reqwest::Client;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, instrument};
use url::Url;

/// Download `url` into `dest_dir/file_name` and return the full path.
///
/// The body lands in a temporary file inside `dest_dir` first and is renamed
/// into place once complete, so a failed transfer never leaves a file under
/// the final name.
#[instrument(level = "info", skip(client, url, dest_dir), fields(url = %url))]
pub async fn download_to(
    client: &Client,
    url: &Url,
    dest_dir: &Path,
    file_name: &str,
) -> Result<PathBuf> {
    let resp = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Non-success status {}", url))?;
    let bytes = resp
        .bytes()
        .await
        .with_context(|| format!("reading body from {}", url))?;

    let dest_path = dest_dir.join(file_name);
    let mut staged = NamedTempFile::new_in(dest_dir)
        .with_context(|| format!("staging download in {}", dest_dir.display()))?;
    staged.write_all(&bytes)?;
    staged
        .persist(&dest_path)
        .with_context(|| format!("moving download to {}", dest_path.display()))?;

    info!(bytes = bytes.len(), path = %dest_path.display(), "downloaded");
    Ok(dest_path)
}
