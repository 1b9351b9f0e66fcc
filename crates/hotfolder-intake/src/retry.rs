// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Retry budget for files that stay in `upload/` after an attempt.
//
// A file only stays behind when the rename that should archive it fails
// (permissions, cross-device moves). Every later scan or event would print it
// again, so the number of such attempts per path is tracked here and can be
// capped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

/// How many unresolved attempts a path may accumulate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Keep re-attempting for as long as the file sits in `upload/`.
    #[default]
    Forever,
    /// Stop after this many attempts that left the file in `upload/`.
    MaxAttempts(u32),
}

impl RetryPolicy {
    /// Map a configured maximum onto a policy; 0 means retry forever.
    pub fn from_max_attempts(max: u32) -> Self {
        if max == 0 {
            Self::Forever
        } else {
            Self::MaxAttempts(max)
        }
    }
}

/// Result of checking a path's budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Go ahead; the value is how many unresolved attempts came before.
    Attempt(u32),
    /// Budget spent; leave the file alone.
    GiveUp,
}

/// Per-path count of attempts that did not get the file out of `upload/`.
#[derive(Debug, Default)]
pub struct AttemptLedger {
    policy: RetryPolicy,
    unresolved: Mutex<HashMap<PathBuf, u32>>,
}

impl AttemptLedger {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            unresolved: Mutex::new(HashMap::new()),
        }
    }

    /// Decide whether `path` may be attempted again.
    pub fn check(&self, path: &Path) -> RetryDecision {
        let previous = self
            .unresolved
            .lock()
            .map(|map| map.get(path).copied().unwrap_or(0))
            .unwrap_or(0);

        match self.policy {
            RetryPolicy::MaxAttempts(max) if previous >= max => {
                debug!(path = %path.display(), previous, "retry budget spent, skipping");
                RetryDecision::GiveUp
            }
            _ => RetryDecision::Attempt(previous),
        }
    }

    /// Note an attempt that left `path` in `upload/`; returns the new count.
    pub fn record_unresolved(&self, path: &Path) -> u32 {
        let count = match self.unresolved.lock() {
            Ok(mut map) => {
                let entry = map.entry(path.to_path_buf()).or_insert(0);
                *entry += 1;
                *entry
            }
            Err(_) => return 0,
        };

        if let RetryPolicy::MaxAttempts(max) = self.policy
            && count == max
        {
            warn!(
                path = %path.display(),
                attempts = count,
                "giving up on file; it stays in upload until moved by hand"
            );
        }
        count
    }

    /// Forget `path` once it has left `upload/`.
    pub fn clear(&self, path: &Path) {
        if let Ok(mut map) = self.unresolved.lock() {
            map.remove(path);
        }
    }
}
