// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Polling intake strategy.
//
// Every interval the upload tree is walked and each printable file is handed
// to the manager, one after another. A file whose archive move failed is
// still in `upload/` on the next pass, which is what makes re-attempts
// happen; the manager's retry policy bounds them.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use hotfolder_core::error::{HotfolderError, Result};
use hotfolder_print::PrintSubmitter;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};
use walkdir::WalkDir;

use crate::manager::{IntakeManager, Outcome};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(3000);

pub struct Poller<S> {
    manager: Arc<IntakeManager<S>>,
    interval: Duration,
    settle_delay: Duration,
}

impl<S: PrintSubmitter> Poller<S> {
    pub fn new(manager: Arc<IntakeManager<S>>) -> Self {
        Self {
            manager,
            interval: DEFAULT_POLL_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Time a file is left alone before submission so that writers can finish.
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// One full pass over `upload/`.
    ///
    /// Per-file failures are logged and the pass continues; only failing to
    /// list the upload directory itself is an error.
    pub async fn run_once(&self) -> Result<()> {
        self.scan(&CancellationToken::new()).await
    }

    /// Scan every interval until `cancel` fires.
    ///
    /// A pass that cannot list `upload/` is logged and the next interval
    /// tries again. A submission already under way when cancellation arrives
    /// is allowed to finish.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        info!(
            upload = %self.manager.root().upload().display(),
            interval_ms = self.interval.as_millis() as u64,
            settle_ms = self.settle_delay.as_millis() as u64,
            "polling for documents"
        );

        while !cancel.is_cancelled() {
            if let Err(e) = self.scan(&cancel).await {
                warn!(error = %e, "poll pass failed, retrying next interval");
            }
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("poller stopped");
        Ok(())
    }

    #[instrument(skip_all)]
    async fn scan(&self, cancel: &CancellationToken) -> Result<()> {
        let upload = self.manager.root().upload().to_path_buf();
        let files = tokio::task::spawn_blocking(move || list_files(&upload))
            .await
            .map_err(|e| HotfolderError::Io(std::io::Error::other(e)))??;
        trace!(count = files.len(), "files in upload");

        for path in files {
            if !self.manager.filter().accepts(&path) {
                trace!(path = %path.display(), "ignoring non-document");
                continue;
            }

            if !self.settle_delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => return Ok(()),
                    _ = tokio::time::sleep(self.settle_delay) => {}
                }
            }

            match self.manager.handle(&path).await {
                Ok(Outcome::Printed { job_id, .. }) => {
                    debug!(path = %path.display(), %job_id, "poll pass printed file");
                }
                Ok(Outcome::Skipped(reason)) => {
                    debug!(path = %path.display(), ?reason, "poll pass skipped file");
                }
                Err(e) => warn!(path = %path.display(), error = %e, "attempt failed"),
            }
        }
        Ok(())
    }
}

/// Regular files below `upload`, sorted for a stable order.
///
/// Entries that disappear mid-walk are skipped; an unreadable `upload`
/// directory is an error.
fn list_files(upload: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(upload).follow_links(false) {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(e) if e.depth() == 0 => return Err(HotfolderError::Io(e.into())),
            Err(e) => debug!(error = %e, "skipping unreadable entry"),
        }
    }
    files.sort();
    Ok(files)
}
