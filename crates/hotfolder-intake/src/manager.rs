// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Intake manager: turns one candidate path into one resolved print attempt.
//
// Per attempt:  Observed → Filtering → Submitting → {Succeeded, Failed}
//
// Submissions are admitted one at a time through a single-permit semaphore,
// so the print server never sees more than one job from this process at once
// no matter how many notifications triggered them.

use std::path::{Path, PathBuf};

use hotfolder_core::error::{HotfolderError, Result};
use hotfolder_core::types::{JobAttributes, JobId, PrintAttempt};
use hotfolder_print::PrintSubmitter;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};

use crate::filter::ExtensionFilter;
use crate::layout::WatchRoot;
use crate::mover::FileStateMover;
use crate::retry::{AttemptLedger, RetryDecision, RetryPolicy};

/// Why a candidate was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The file was gone by the time its turn came (usually already archived).
    Vanished,
    /// Not a printable document.
    Filtered,
    /// The retry policy's budget for this path is spent.
    RetriesExhausted,
}

/// Successful result of [`IntakeManager::handle`].
///
/// A failed submission is reported as `Err` carrying the submission error,
/// after the file has been routed to `failed/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Skipped(SkipReason),
    Printed { job_id: JobId, destination: PathBuf },
}

/// Stage of an attempt, for log output.
#[derive(Debug, Clone, Copy)]
enum Stage {
    Observed,
    Filtering,
    Submitting,
    Succeeded,
    Failed,
}

/// Single entry point from notification sources into the print pipeline.
pub struct IntakeManager<S> {
    filter: ExtensionFilter,
    submitter: S,
    mover: FileStateMover,
    ledger: AttemptLedger,
    default_attributes: JobAttributes,
    admission: Semaphore,
}

impl<S: PrintSubmitter> IntakeManager<S> {
    pub fn new(submitter: S, mover: FileStateMover, default_attributes: JobAttributes) -> Self {
        Self {
            filter: ExtensionFilter::default(),
            submitter,
            mover,
            ledger: AttemptLedger::new(RetryPolicy::default()),
            default_attributes,
            admission: Semaphore::new(1),
        }
    }

    pub fn with_filter(mut self, filter: ExtensionFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.ledger = AttemptLedger::new(policy);
        self
    }

    pub fn filter(&self) -> &ExtensionFilter {
        &self.filter
    }

    pub fn root(&self) -> &WatchRoot {
        self.mover.root()
    }

    pub fn submitter(&self) -> &S {
        &self.submitter
    }

    /// Print `path` and archive it according to the result.
    ///
    /// On a failed submission the file is routed to `failed/` and the
    /// submission error is returned whether or not that move worked.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn handle(&self, path: &Path) -> Result<Outcome> {
        let _permit = self
            .admission
            .acquire()
            .await
            .map_err(|_| HotfolderError::Shutdown)?;
        debug!(stage = ?Stage::Observed, "admitted");

        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            self.ledger.clear(path);
            debug!("file no longer present, skipping");
            return Ok(Outcome::Skipped(SkipReason::Vanished));
        }

        debug!(stage = ?Stage::Filtering);
        let attempt = match PrintAttempt::new(path) {
            Some(attempt) if self.filter.accepts(path) => attempt,
            _ => {
                debug!("not a printable document, skipping");
                return Ok(Outcome::Skipped(SkipReason::Filtered));
            }
        };

        if let RetryDecision::GiveUp = self.ledger.check(path) {
            return Ok(Outcome::Skipped(SkipReason::RetriesExhausted));
        }

        info!(
            stage = ?Stage::Submitting,
            attempt = %attempt.id,
            document_type = ?attempt.document_type,
            "submitting document"
        );

        match self.submitter.submit(path, &self.default_attributes).await {
            Ok(job_id) => match self.mover.resolve_success(path, job_id).await {
                Ok(destination) => {
                    self.ledger.clear(path);
                    info!(stage = ?Stage::Succeeded, attempt = %attempt.id, %job_id, "printed");
                    Ok(Outcome::Printed {
                        job_id,
                        destination,
                    })
                }
                Err(move_err) => {
                    let attempts = self.ledger.record_unresolved(path);
                    error!(
                        attempt = %attempt.id,
                        %job_id,
                        attempts,
                        error = %move_err,
                        "printed but could not archive; file stays in upload"
                    );
                    Err(move_err)
                }
            },
            Err(submit_err) => {
                warn!(
                    stage = ?Stage::Failed,
                    attempt = %attempt.id,
                    error = %submit_err,
                    "print submission failed"
                );
                match self.mover.resolve_failure(path).await {
                    Ok(_) => self.ledger.clear(path),
                    Err(move_err) => {
                        let attempts = self.ledger.record_unresolved(path);
                        error!(
                            attempt = %attempt.id,
                            attempts,
                            error = %move_err,
                            "could not move failed file; it stays in upload"
                        );
                    }
                }
                Err(submit_err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        StubSubmitter, block_printed, drop_file, files_in, manager_with, manager_with_policy,
    };
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn printed_file_lands_in_printed_with_job_id() {
        let (_dir, manager) = manager_with(StubSubmitter::accepting(42));
        let path = drop_file(&manager, "report.pdf");

        let outcome = manager.handle(&path).await.expect("handle");
        let expected = manager.root().printed().join("2024-03-01_42_report.pdf");
        assert_eq!(
            outcome,
            Outcome::Printed {
                job_id: JobId(42),
                destination: expected.clone()
            }
        );
        assert!(expected.exists());
        assert!(files_in(manager.root().upload()).is_empty());
        assert!(files_in(manager.root().failed()).is_empty());
        assert_eq!(files_in(manager.root().printed()).len(), 1);
    }

    #[tokio::test]
    async fn disallowed_extension_is_left_alone() {
        let (_dir, manager) = manager_with(StubSubmitter::accepting(1));
        let path = drop_file(&manager, "report.txt");

        let outcome = manager.handle(&path).await.expect("handle");
        assert_eq!(outcome, Outcome::Skipped(SkipReason::Filtered));
        assert_eq!(manager.submitter().calls(), 0);
        assert!(path.exists());
        assert!(files_in(manager.root().printed()).is_empty());
        assert!(files_in(manager.root().failed()).is_empty());
    }

    #[tokio::test]
    async fn rejected_job_lands_in_failed_and_surfaces_error() {
        let (_dir, manager) = manager_with(StubSubmitter::rejecting());
        let path = drop_file(&manager, "report.pdf");

        let err = manager.handle(&path).await.expect_err("submission fails");
        assert!(matches!(err, HotfolderError::IppRequest(_)));
        assert!(manager.root().failed().join("2024-03-01_report.pdf").exists());
        assert!(!path.exists());
        assert!(files_in(manager.root().printed()).is_empty());
    }

    #[tokio::test]
    async fn vanished_file_is_not_submitted() {
        let (_dir, manager) = manager_with(StubSubmitter::accepting(1));
        let path = manager.root().upload().join("never-existed.pdf");

        let outcome = manager.handle(&path).await.expect("handle");
        assert_eq!(outcome, Outcome::Skipped(SkipReason::Vanished));
        assert_eq!(manager.submitter().calls(), 0);
    }

    #[tokio::test]
    async fn submissions_never_overlap() {
        let (_dir, manager) =
            manager_with(StubSubmitter::accepting(1).with_delay(Duration::from_millis(40)));
        let paths: Vec<_> = (0..4)
            .map(|i| drop_file(&manager, &format!("doc-{i}.pdf")))
            .collect();

        let mut handles = Vec::new();
        for path in paths {
            let manager = Arc::clone(&manager);
            handles.push(tokio::spawn(async move { manager.handle(&path).await }));
        }
        for handle in handles {
            handle.await.expect("join").expect("handle");
        }

        assert_eq!(manager.submitter().calls(), 4);
        assert_eq!(manager.submitter().max_concurrent(), 1);
        assert_eq!(files_in(manager.root().printed()).len(), 4);
    }

    #[tokio::test]
    async fn unarchivable_file_respects_retry_budget() {
        let (_dir, manager) =
            manager_with_policy(StubSubmitter::accepting(7), RetryPolicy::MaxAttempts(2));
        block_printed(&manager);
        let path = drop_file(&manager, "stuck.pdf");

        for _ in 0..2 {
            let err = manager.handle(&path).await.expect_err("archive blocked");
            assert!(matches!(err, HotfolderError::Move { .. }), "{err:?}");
        }
        let third = manager.handle(&path).await.expect("skipped");
        assert_eq!(third, Outcome::Skipped(SkipReason::RetriesExhausted));
        assert_eq!(manager.submitter().calls(), 2);
        assert!(path.exists(), "file must stay in upload");
    }

    #[tokio::test]
    async fn resolved_file_clears_its_budget() {
        let (_dir, manager) =
            manager_with_policy(StubSubmitter::accepting(7), RetryPolicy::MaxAttempts(2));
        block_printed(&manager);
        let path = drop_file(&manager, "late.pdf");
        assert!(manager.handle(&path).await.is_err());

        std::fs::remove_file(manager.root().printed()).expect("remove blocker");
        std::fs::create_dir(manager.root().printed()).expect("restore printed");
        let outcome = manager.handle(&path).await.expect("printed");
        assert!(matches!(outcome, Outcome::Printed { .. }));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn custom_filter_narrows_accepted_documents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = WatchRoot::new(dir.path()).expect("root");
        root.ensure().expect("ensure");
        let mover = FileStateMover::with_clock(
            root,
            Arc::new(crate::mover::FixedClock(crate::testing::scenario_day())),
        );
        let manager = IntakeManager::new(StubSubmitter::accepting(1), mover, JobAttributes::new())
            .with_filter(ExtensionFilter::new(["pdf"]));
        let png = drop_file(&manager, "scan.png");
        let pdf = drop_file(&manager, "scan.pdf");

        assert_eq!(
            manager.handle(&png).await.expect("handle"),
            Outcome::Skipped(SkipReason::Filtered)
        );
        assert!(matches!(
            manager.handle(&pdf).await.expect("handle"),
            Outcome::Printed { .. }
        ));
        assert_eq!(manager.submitter().paths(), vec![pdf]);
        assert!(png.exists());
    }
}
