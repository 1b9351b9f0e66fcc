// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Filesystem state transitions: upload/ → printed/ or failed/.
//
// The destination name is the durable record of an attempt:
//   printed/<YYYY-MM-DD>_<jobId>_<name>
//   failed/<YYYY-MM-DD>_<name>

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use hotfolder_core::error::{HotfolderError, Result};
use hotfolder_core::types::{FileState, JobId};
use tracing::{debug, info, instrument, warn};

use crate::layout::WatchRoot;

/// Source of the date stamped into archived filenames.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always reports the same day.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Archive filename for a resolved file.
pub fn destination_name(date: NaiveDate, job_id: Option<JobId>, file_name: &str) -> String {
    match job_id {
        Some(id) => format!("{}_{}_{}", date.format("%Y-%m-%d"), id, file_name),
        None => format!("{}_{}", date.format("%Y-%m-%d"), file_name),
    }
}

/// Moves resolved files out of `upload/` with a single rename each.
pub struct FileStateMover {
    root: WatchRoot,
    clock: Arc<dyn Clock>,
}

impl FileStateMover {
    pub fn new(root: WatchRoot) -> Self {
        Self::with_clock(root, Arc::new(SystemClock))
    }

    pub fn with_clock(root: WatchRoot, clock: Arc<dyn Clock>) -> Self {
        Self { root, clock }
    }

    pub fn root(&self) -> &WatchRoot {
        &self.root
    }

    /// Where `path` would be archived in `state` today.
    ///
    /// Sub-directories below `upload/` are kept below the archive directory;
    /// only the file name gets the date (and job id) prefix.
    pub fn destination(&self, path: &Path, state: FileState, job_id: Option<JobId>) -> Result<PathBuf> {
        let relative = self.root.relative_to_upload(path)?;
        let file_name = relative
            .file_name()
            .ok_or_else(|| HotfolderError::NotInUpload(path.to_path_buf()))?
            .to_string_lossy();

        let mut destination = self.root.dir(state).to_path_buf();
        if let Some(parent) = relative.parent().filter(|p| !p.as_os_str().is_empty()) {
            destination.push(parent);
        }
        destination.push(destination_name(self.clock.today(), job_id, &file_name));
        Ok(destination)
    }

    /// Archive a printed file under `printed/`.
    #[instrument(skip(self), fields(path = %path.display(), %job_id))]
    pub async fn resolve_success(&self, path: &Path, job_id: JobId) -> Result<PathBuf> {
        let destination = self.destination(path, FileState::Printed, Some(job_id))?;
        self.relocate(path, destination).await
    }

    /// Archive a file whose submission failed under `failed/`.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn resolve_failure(&self, path: &Path) -> Result<PathBuf> {
        let destination = self.destination(path, FileState::Failed, None)?;
        self.relocate(path, destination).await
    }

    async fn relocate(&self, from: &Path, to: PathBuf) -> Result<PathBuf> {
        let to = unoccupied(to).await;

        if let Some(parent) = to.parent()
            && !tokio::fs::try_exists(parent).await.unwrap_or(false)
        {
            debug!(dir = %parent.display(), "creating archive sub-directory");
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| HotfolderError::Move {
                    from: from.to_path_buf(),
                    to: to.clone(),
                    source,
                })?;
        }

        tokio::fs::rename(from, &to)
            .await
            .map_err(|source| HotfolderError::Move {
                from: from.to_path_buf(),
                to: to.clone(),
                source,
            })?;

        info!(destination = %to.display(), "file archived");
        Ok(to)
    }
}

/// `path`, or the first free `<stem>~N.<ext>` next to it.
///
/// A rename onto an existing file would silently replace an earlier archive
/// entry with the same date, job id and name.
async fn unoccupied(path: PathBuf) -> PathBuf {
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return path;
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut n = 1u32;
    loop {
        let candidate = path.with_file_name(format!("{stem}~{n}{extension}"));
        if !tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            warn!(
                taken = %path.display(),
                using = %candidate.display(),
                "archive name already taken"
            );
            return candidate;
        }
        n += 1;
    }
}
