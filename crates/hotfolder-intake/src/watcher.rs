// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Event-driven intake strategy.
//
// Filesystem notifications for `upload/` arrive in bursts: a single copy can
// produce a create, several data writes and a close. Each write-like event
// asks the deduplicator for an attempt on its path, so the whole burst ends
// up sharing one settle delay and one submission.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use hotfolder_core::error::{HotfolderError, Result};
use hotfolder_print::PrintSubmitter;
use notify::event::{AccessKind, AccessMode, CreateKind, ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, trace, warn};

use crate::dedup::Deduplicator;
use crate::manager::{IntakeManager, Outcome};
use crate::poller::DEFAULT_SETTLE_DELAY;

type EventStream = mpsc::UnboundedReceiver<notify::Result<Event>>;

pub struct EventWatcher<S> {
    manager: Arc<IntakeManager<S>>,
    dedup: Arc<Deduplicator<PathBuf, Result<Outcome>>>,
    settle_delay: Duration,
}

impl<S: PrintSubmitter> EventWatcher<S> {
    pub fn new(manager: Arc<IntakeManager<S>>) -> Self {
        Self {
            manager,
            dedup: Arc::new(Deduplicator::new()),
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Watch `upload/` until `cancel` fires, then wait for attempts already
    /// started to finish.
    ///
    /// Failing to open the watch is an error. If the event stream closes the
    /// watch is opened again; an error doing so ends the run.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let upload = self.manager.root().upload().to_path_buf();
        let (mut watcher, mut events) = subscribe(&upload)?;
        let tracker = TaskTracker::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                received = events.recv() => match received {
                    Some(Ok(event)) => self.dispatch(event, &tracker),
                    Some(Err(e)) => warn!(error = %e, "filesystem watch error"),
                    None => {
                        warn!("event stream closed, re-subscribing");
                        (watcher, events) = subscribe(&upload)?;
                    }
                },
            }
        }

        drop(watcher);
        tracker.close();
        if !tracker.is_empty() {
            info!(in_flight = tracker.len(), "waiting for in-flight attempts");
        }
        tracker.wait().await;
        info!("watcher stopped");
        Ok(())
    }

    /// Start (or join) one attempt per path named by a write-like event.
    fn dispatch(&self, event: Event, tracker: &TaskTracker) {
        if !is_write_event(&event.kind) {
            trace!(kind = ?event.kind, "ignoring event");
            return;
        }

        // A two-sided rename names the old path first; only the new one
        // can hold a document.
        let paths = match event.kind {
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                event.paths.last().cloned().into_iter().collect()
            }
            _ => event.paths,
        };

        for path in paths {
            if !self.manager.filter().accepts(&path) {
                trace!(path = %path.display(), "ignoring non-document");
                continue;
            }

            let manager = Arc::clone(&self.manager);
            let dedup = Arc::clone(&self.dedup);
            let settle_delay = self.settle_delay;
            tracker.spawn(async move {
                let key = path.clone();
                dedup
                    .run(key, move || attempt(manager, path, settle_delay))
                    .await;
            });
        }
    }
}

/// Settle, then hand `path` to the manager. Runs once per burst; the result
/// is logged here so that joined waiters do not repeat it.
async fn attempt<S: PrintSubmitter>(
    manager: Arc<IntakeManager<S>>,
    path: PathBuf,
    settle_delay: Duration,
) -> Result<Outcome> {
    tokio::time::sleep(settle_delay).await;
    let result = manager.handle(&path).await;
    match &result {
        Ok(Outcome::Printed { job_id, .. }) => {
            debug!(path = %path.display(), %job_id, "event attempt printed file");
        }
        Ok(Outcome::Skipped(reason)) => {
            debug!(path = %path.display(), ?reason, "event attempt skipped file");
        }
        Err(e) => warn!(path = %path.display(), error = %e, "attempt failed"),
    }
    result
}

/// Open a non-recursive watch on `upload`.
fn subscribe(upload: &Path) -> Result<(RecommendedWatcher, EventStream)> {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            if tx.send(res).is_err() {
                error!("watch event dropped, receiver is gone");
            }
        },
        Config::default(),
    )
    .map_err(|e| HotfolderError::Watch(format!("failed to create watcher: {e}")))?;

    watcher
        .watch(upload, RecursiveMode::NonRecursive)
        .map_err(|e| HotfolderError::Watch(format!("failed to watch {}: {e}", upload.display())))?;

    info!(upload = %upload.display(), "watching for documents");
    Ok((watcher, rx))
}

/// Create, content write, rename into place, or close after writing.
fn is_write_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(CreateKind::File | CreateKind::Any)
            | EventKind::Modify(
                ModifyKind::Data(_)
                    | ModifyKind::Any
                    | ModifyKind::Name(RenameMode::To | RenameMode::Both | RenameMode::Any)
            )
            | EventKind::Access(AccessKind::Close(AccessMode::Write))
    )
}
