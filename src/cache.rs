//! Single-flight memoisation of an expensive computation.
//!
//! `ModelCache` holds at most one value and moves through an explicit
//! lifecycle:
//!
//! ```text
//! Uninitialized ──get_or_compute──▶ Computing ──ok──▶ Ready
//!       ▲                               │                │
//!       └────────────── error/panic ────┘                │
//!       └──────────────────────── reset ─────────────────┘
//! ```
//!
//! Only one computation is ever in flight. Callers arriving while it runs
//! block until it finishes and then observe its value, or its error. `reset`
//! never interrupts a computation: it waits for it to finish and then clears
//! the slot.
//!
//! The constructor is `const`, so a cache can live in a `static`:
//!
//! ```rust
//! use sitescore::ModelCache;
//!
//! static SQUARES: ModelCache<Vec<u64>> = ModelCache::new();
//!
//! let first = SQUARES.get_or_compute(|| Ok((0..4).map(|n| n * n).collect()))?;
//! let again = SQUARES.get_or_compute(|| unreachable!("already cached"))?;
//! assert!(std::sync::Arc::ptr_eq(&first, &again));
//! # Ok::<(), sitescore::SiteError>(())
//! ```

use crate::error::{Result, SiteError};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

/// Observable lifecycle state of a [`ModelCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Uninitialized,
    Computing,
    Ready,
}

enum Slot<T> {
    Uninitialized,
    Computing { generation: u64 },
    Ready(Arc<T>),
}

struct State<T> {
    slot: Slot<T>,
    /// Incremented each time a computation starts
    generation: u64,
    /// Error of the most recent failed computation, shared with its waiters
    last_failure: Option<(u64, SiteError)>,
}

/// Thread-safe, single-flight cache for one computed value.
pub struct ModelCache<T> {
    state: Mutex<State<T>>,
    changed: Condvar,
}

impl<T> ModelCache<T> {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(State {
                slot: Slot::Uninitialized,
                generation: 0,
                last_failure: None,
            }),
            changed: Condvar::new(),
        }
    }

    pub fn status(&self) -> CacheStatus {
        match self.state.lock().slot {
            Slot::Uninitialized => CacheStatus::Uninitialized,
            Slot::Computing { .. } => CacheStatus::Computing,
            Slot::Ready(_) => CacheStatus::Ready,
        }
    }

    /// The cached value, without computing or waiting.
    pub fn peek(&self) -> Option<Arc<T>> {
        match &self.state.lock().slot {
            Slot::Ready(value) => Some(Arc::clone(value)),
            _ => None,
        }
    }

    /// Return the cached value, computing it first if needed.
    ///
    /// If another thread is already computing, this blocks until it is done
    /// and returns that computation's value or error instead of starting a
    /// second one.
    pub fn get_or_compute<F>(&self, compute: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        let mut state = self.state.lock();
        loop {
            let waiting_on = match &state.slot {
                Slot::Ready(value) => return Ok(Arc::clone(value)),
                Slot::Uninitialized => break,
                Slot::Computing { generation } => *generation,
            };

            self.changed.wait(&mut state);

            if let Some((failed, err)) = &state.last_failure
                && *failed == waiting_on
            {
                return Err(err.clone());
            }
        }

        state.generation += 1;
        let generation = state.generation;
        state.slot = Slot::Computing { generation };
        drop(state);

        log::debug!("Cache computation #{} started", generation);

        let guard = InFlight { cache: self };
        let outcome = compute();
        std::mem::forget(guard);

        let mut state = self.state.lock();
        let result = match outcome {
            Ok(value) => {
                let value = Arc::new(value);
                state.slot = Slot::Ready(Arc::clone(&value));
                state.last_failure = None;
                Ok(value)
            }
            Err(err) => {
                log::warn!("Cache computation #{} failed: {}", generation, err);
                state.slot = Slot::Uninitialized;
                state.last_failure = Some((generation, err.clone()));
                Err(err)
            }
        };
        self.changed.notify_all();
        result
    }

    /// Clear the cached value. Waits for an in-flight computation first.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        while matches!(state.slot, Slot::Computing { .. }) {
            self.changed.wait(&mut state);
        }
        state.slot = Slot::Uninitialized;
        state.last_failure = None;
        log::debug!("Cache reset");
    }

    /// Discard the cached value and compute a fresh one.
    pub fn refresh<F>(&self, compute: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        self.reset();
        self.get_or_compute(compute)
    }
}

impl<T> Default for ModelCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the cache to `Uninitialized` if the computation unwinds.
struct InFlight<'a, T> {
    cache: &'a ModelCache<T>,
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        let mut state = self.cache.state.lock();
        state.slot = Slot::Uninitialized;
        drop(state);
        self.cache.changed.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Barrier, mpsc};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_single_flight_under_contention() {
        let cache = Arc::new(ModelCache::<usize>::new());
        let runs = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let runs = Arc::clone(&runs);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .get_or_compute(|| {
                            runs.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(50));
                            Ok(42)
                        })
                        .unwrap()
                })
            })
            .collect();

        let values: Vec<Arc<usize>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
        assert_eq!(cache.status(), CacheStatus::Ready);
    }

    #[test]
    fn test_failure_leaves_cache_uninitialized() {
        let cache = ModelCache::<u32>::new();

        let err = cache
            .get_or_compute(|| Err(SiteError::EmptyFacilitySet))
            .unwrap_err();
        assert_eq!(err, SiteError::EmptyFacilitySet);
        assert_eq!(cache.status(), CacheStatus::Uninitialized);

        assert_eq!(*cache.get_or_compute(|| Ok(7)).unwrap(), 7);
    }

    #[test]
    fn test_waiters_observe_failure() {
        let cache = Arc::new(ModelCache::<u32>::new());
        let barrier = Arc::new(Barrier::new(4));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache.get_or_compute(|| {
                        thread::sleep(Duration::from_millis(50));
                        Err(SiteError::InvalidInput("bad data".to_string()))
                    })
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(
                handle.join().unwrap().unwrap_err(),
                SiteError::InvalidInput("bad data".to_string())
            );
        }
    }

    #[test]
    fn test_reset_waits_for_in_flight_computation() {
        let cache = Arc::new(ModelCache::<u32>::new());
        let finished = Arc::new(AtomicBool::new(false));
        let (started_tx, started_rx) = mpsc::channel();

        let worker = {
            let cache = Arc::clone(&cache);
            let finished = Arc::clone(&finished);
            thread::spawn(move || {
                cache
                    .get_or_compute(|| {
                        started_tx.send(()).unwrap();
                        thread::sleep(Duration::from_millis(100));
                        finished.store(true, Ordering::SeqCst);
                        Ok(1)
                    })
                    .unwrap()
            })
        };

        started_rx.recv().unwrap();
        assert_eq!(cache.status(), CacheStatus::Computing);

        cache.reset();
        assert!(finished.load(Ordering::SeqCst));
        assert_eq!(cache.status(), CacheStatus::Uninitialized);
        assert!(cache.peek().is_none());

        assert_eq!(*worker.join().unwrap(), 1);
    }

    #[test]
    fn test_panic_unwinds_to_uninitialized() {
        let cache = ModelCache::<u32>::new();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            cache.get_or_compute(|| panic!("computation blew up"))
        }));
        assert!(outcome.is_err());
        assert_eq!(cache.status(), CacheStatus::Uninitialized);

        assert_eq!(*cache.get_or_compute(|| Ok(3)).unwrap(), 3);
    }

    #[test]
    fn test_refresh_recomputes() {
        let cache = ModelCache::<u32>::new();
        assert_eq!(*cache.get_or_compute(|| Ok(1)).unwrap(), 1);
        assert_eq!(*cache.get_or_compute(|| Ok(2)).unwrap(), 1);
        assert_eq!(*cache.refresh(|| Ok(2)).unwrap(), 2);
        assert_eq!(*cache.peek().unwrap(), 2);
    }
}
