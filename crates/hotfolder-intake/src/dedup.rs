// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-flight deduplication of work keyed by path.
//
// A burst of notifications for the same file (create, several writes, close)
// must produce one print attempt. The first caller for a key starts the work
// as a shared future; later callers for the same key join it and all of them
// receive the same result. The entry is removed when the last waiter has
// seen the result, so the next burst starts fresh.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::trace;

type SharedOutcome<T> = Shared<BoxFuture<'static, Arc<T>>>;

struct InFlight<T> {
    /// Distinguishes successive runs for the same key.
    generation: u64,
    future: SharedOutcome<T>,
    waiters: usize,
}

/// Collapses concurrent runs for the same key into one.
pub struct Deduplicator<K, T> {
    in_flight: Mutex<HashMap<K, InFlight<T>>>,
    next_generation: AtomicU64,
}

impl<K, T> Default for Deduplicator<K, T>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    T: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> Deduplicator<K, T>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    T: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, InFlight<T>>> {
        // The map is only mutated in short, panic-free sections.
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `work` for `key`, or join the run already in flight for it.
    ///
    /// `work` is only invoked when no unresolved run is in flight. The run is
    /// driven by whichever waiters are polling it; if every waiter is dropped
    /// before it completes, the entry is removed and the work is abandoned.
    pub async fn run<F, Fut>(&self, key: K, work: F) -> Arc<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (generation, future) = {
            let mut map = self.lock();
            match map.entry(key.clone()) {
                Entry::Occupied(mut entry) if entry.get().future.peek().is_some() => {
                    // Resolved but not yet released: a new burst gets a new run.
                    let fresh = self.start(work);
                    trace!(?key, generation = fresh.generation, "restarting resolved run");
                    let handle = (fresh.generation, fresh.future.clone());
                    entry.insert(fresh);
                    handle
                }
                Entry::Occupied(mut entry) => {
                    let in_flight = entry.get_mut();
                    in_flight.waiters += 1;
                    trace!(?key, waiters = in_flight.waiters, "joining in-flight run");
                    (in_flight.generation, in_flight.future.clone())
                }
                Entry::Vacant(entry) => {
                    let fresh = self.start(work);
                    trace!(?key, generation = fresh.generation, "starting run");
                    let handle = (fresh.generation, fresh.future.clone());
                    entry.insert(fresh);
                    handle
                }
            }
        };

        let _waiter = Waiter {
            owner: self,
            key,
            generation,
        };
        future.await
    }

    fn start<F, Fut>(&self, work: F) -> InFlight<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        InFlight {
            generation: self.next_generation.fetch_add(1, Ordering::Relaxed),
            future: work().map(Arc::new).boxed().shared(),
            waiters: 1,
        }
    }

    /// Number of keys with a run in flight.
    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }

    fn release(&self, key: &K, generation: u64) {
        let mut map = self.lock();
        if let Some(in_flight) = map.get_mut(key)
            && in_flight.generation == generation
        {
            in_flight.waiters -= 1;
            if in_flight.waiters == 0 {
                map.remove(key);
                trace!(?key, generation, "run released");
            }
        }
    }
}

/// Drops one waiter reference when the awaiting caller finishes or is
/// cancelled.
struct Waiter<'a, K, T>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    T: Send + Sync + 'static,
{
    owner: &'a Deduplicator<K, T>,
    key: K,
    generation: u64,
}

impl<K, T> Drop for Waiter<'_, K, T>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    T: Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.owner.release(&self.key, self.generation);
    }
}
