// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Hotfolder Intake: turns activity in the `upload` directory into exactly one
// print attempt per file, then archives the file under `printed/` or
// `failed/`.
//
// Two notification strategies feed the same `IntakeManager`: a `Poller` that
// re-walks the upload tree on an interval, and an `EventWatcher` driven by
// filesystem notifications with per-path deduplication.

pub mod dedup;
pub mod filter;
pub mod layout;
pub mod manager;
pub mod mover;
pub mod poller;
pub mod retry;
pub mod watcher;

#[cfg(test)]
pub(crate) mod testing;

pub use dedup::Deduplicator;
pub use filter::ExtensionFilter;
pub use layout::WatchRoot;
pub use manager::{IntakeManager, Outcome, SkipReason};
pub use mover::{Clock, FileStateMover, FixedClock, SystemClock};
pub use poller::Poller;
pub use retry::RetryPolicy;
pub use watcher::EventWatcher;
