// src/cache/mod.rs

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Client;
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::SystemTime,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::fetch::{download::download_to, links::ResolvedFile};

/// Where superseded workbooks go. Removal has to be recoverable, so no
/// implementation erases a file outright.
pub trait Discard {
    fn discard(&self, path: &Path) -> Result<()>;
}

impl<T: Discard + ?Sized> Discard for Box<T> {
    fn discard(&self, path: &Path) -> Result<()> {
        (**self).discard(path)
    }
}

/// The desktop trash / recycle bin of the current user.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecycleBin;

impl Discard for RecycleBin {
    fn discard(&self, path: &Path) -> Result<()> {
        trash::delete(path).with_context(|| format!("moving {} to the trash", path.display()))?;
        debug!(path = %path.display(), "sent to trash");
        Ok(())
    }
}

/// Moves discarded files into a holding directory, suffixed with the time of
/// removal so repeated names never collide. Only the newest `retain` entries
/// are kept there.
#[derive(Debug, Clone)]
pub struct Quarantine {
    dir: PathBuf,
    retain: usize,
}

impl Quarantine {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            retain: usize::MAX,
        }
    }

    pub fn with_retention(mut self, retain: usize) -> Self {
        self.retain = retain.max(1);
        self
    }

    /// Delete the oldest held files beyond `retain`. Returns how many went.
    pub fn prune(&self) -> Result<usize> {
        let mut held: Vec<(SystemTime, PathBuf)> = fs::read_dir(&self.dir)
            .with_context(|| format!("listing trash directory {:?}", &self.dir))?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|e| {
                let modified = e
                    .metadata()
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                (modified, e.path())
            })
            .collect();
        if held.len() <= self.retain {
            return Ok(0);
        }
        // Newest first; equal mtimes fall back to name order.
        held.sort_by(|a, b| b.cmp(a));
        let mut pruned = 0;
        for (_, path) in held.into_iter().skip(self.retain) {
            fs::remove_file(&path).with_context(|| format!("pruning {}", path.display()))?;
            pruned += 1;
        }
        debug!(pruned, dir = %self.dir.display(), "pruned trash directory");
        Ok(pruned)
    }
}

impl Discard for Quarantine {
    fn discard(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating trash directory {:?}", &self.dir))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unnamed".to_string());
        let target = self
            .dir
            .join(format!("{}.{}", name, Utc::now().format("%Y%m%dT%H%M%S%.6f")));
        move_file(path, &target)
            .with_context(|| format!("moving {} to {}", path.display(), target.display()))?;
        debug!(from = %path.display(), to = %target.display(), "discarded");
        self.prune()?;
        Ok(())
    }
}

/// `rename`, or copy then remove when the two paths sit on different
/// filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Err(e) if crosses_devices(&e) => {
            debug!(from = %from.display(), "rename crosses filesystems, copying instead");
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
        other => other,
    }
}

// EXDEV on unix, ERROR_NOT_SAME_DEVICE on windows.
fn crosses_devices(e: &io::Error) -> bool {
    match e.raw_os_error() {
        Some(18) => cfg!(unix),
        Some(17) => cfg!(windows),
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOutcome {
    pub path: PathBuf,
    pub downloaded: bool,
    pub discarded: usize,
}

/// A directory that holds exactly one workbook: the latest one.
pub struct Cache<D: Discard> {
    dir: PathBuf,
    discard: D,
}

impl<D: Discard> Cache<D> {
    /// Open the cache at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>, discard: D) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| format!("creating cache directory {:?}", &dir))?;
        Ok(Self { dir, discard })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Make sure `resolved.local_file_name` is present, downloading from
    /// `source` (normally `resolved.remote_url`) only when it is not, then
    /// discard every other file in the directory.
    pub async fn ensure(
        &self,
        client: &Client,
        resolved: &ResolvedFile,
        source: &Url,
    ) -> Result<CacheOutcome> {
        let path = self.dir.join(&resolved.local_file_name);
        let downloaded = if path.is_file() {
            info!(file = %resolved.local_file_name, "a file with today's date already exists, using that");
            false
        } else {
            info!(file = %resolved.local_file_name, "local data is out of date, downloading");
            download_to(client, source, &self.dir, &resolved.local_file_name).await?;
            true
        };

        let discarded = self.sweep(&resolved.local_file_name)?;
        Ok(CacheOutcome {
            path,
            downloaded,
            discarded,
        })
    }

    /// Discard every regular file except `keep`. Returns how many went.
    pub fn sweep(&self, keep: &str) -> Result<usize> {
        let mut count = 0;
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("listing cache directory {:?}", &self.dir))?
        {
            let entry = entry?;
            if !entry.file_type()?.is_file() || entry.file_name() == keep {
                continue;
            }
            let path = entry.path();
            if let Err(e) = self.discard.discard(&path) {
                warn!(path = %path.display(), error = %e, "could not discard stale file");
                return Err(e);
            }
            count += 1;
        }
        if count > 0 {
            info!(count, "cleared out older workbooks");
        }
        Ok(count)
    }
}
