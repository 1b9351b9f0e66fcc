// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test doubles shared by the intake unit tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use hotfolder_core::error::{HotfolderError, Result};
use hotfolder_core::types::{JobAttributes, JobId};
use hotfolder_print::PrintSubmitter;

use crate::layout::WatchRoot;
use crate::manager::IntakeManager;
use crate::mover::{FileStateMover, FixedClock};
use crate::retry::RetryPolicy;

/// Submitter that records calls instead of talking to a printer.
pub(crate) struct StubSubmitter {
    fail: bool,
    delay: Duration,
    next_job: AtomicI32,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    paths: Mutex<Vec<PathBuf>>,
}

impl StubSubmitter {
    /// Accepts every job, handing out ids from `first_job` upwards.
    pub(crate) fn accepting(first_job: i32) -> Self {
        Self {
            fail: false,
            delay: Duration::ZERO,
            next_job: AtomicI32::new(first_job),
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            paths: Mutex::new(Vec::new()),
        }
    }

    /// Rejects every job with an IPP error.
    pub(crate) fn rejecting() -> Self {
        Self {
            fail: true,
            ..Self::accepting(0)
        }
    }

    /// Hold each submission open for `delay`.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of submissions observed running at the same time.
    pub(crate) fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub(crate) fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl PrintSubmitter for StubSubmitter {
    async fn submit(&self, path: &Path, _attributes: &JobAttributes) -> Result<JobId> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut paths) = self.paths.lock() {
            paths.push(path.to_path_buf());
        }
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.fail {
            Err(HotfolderError::IppRequest(
                "Print-Job returned status ServerErrorServiceUnavailable".into(),
            ))
        } else {
            Ok(JobId(self.next_job.fetch_add(1, Ordering::SeqCst)))
        }
    }
}

pub(crate) fn scenario_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date")
}

/// A fresh watch root in a temp dir plus a manager over `submitter`.
pub(crate) fn manager_with(
    submitter: StubSubmitter,
) -> (tempfile::TempDir, Arc<IntakeManager<StubSubmitter>>) {
    manager_with_policy(submitter, RetryPolicy::default())
}

pub(crate) fn manager_with_policy(
    submitter: StubSubmitter,
    policy: RetryPolicy,
) -> (tempfile::TempDir, Arc<IntakeManager<StubSubmitter>>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = WatchRoot::new(dir.path()).expect("watch root");
    root.ensure().expect("ensure layout");
    let mover = FileStateMover::with_clock(root, Arc::new(FixedClock(scenario_day())));
    let manager =
        IntakeManager::new(submitter, mover, JobAttributes::new()).with_retry_policy(policy);
    (dir, Arc::new(manager))
}

/// Replace `printed/` with a regular file so every archive rename into it
/// fails with "not a directory", whatever the caller's privileges.
pub(crate) fn block_printed(manager: &IntakeManager<StubSubmitter>) {
    let printed = manager.root().printed();
    std::fs::remove_dir_all(printed).expect("remove printed");
    std::fs::write(printed, b"in the way").expect("write blocker");
}

/// Drop a file into `upload/` (creating sub-directories) and return its path.
pub(crate) fn drop_file(manager: &IntakeManager<StubSubmitter>, relative: &str) -> PathBuf {
    let path = manager.root().upload().join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    std::fs::write(&path, b"%PDF-1.4 test").expect("write upload");
    path
}

/// Every regular file below `dir`, relative to it.
pub(crate) fn files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.path().strip_prefix(dir).ok().map(Path::to_path_buf))
        .collect();
    files.sort();
    files
}
