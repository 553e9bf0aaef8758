//! Bounded-concurrency memoizing asset loader
//!
//! Every key maps to at most one shared fetch. At most `ceiling` fetches run
//! at once; the rest wait in a FIFO queue. Failed fetches are evicted so the
//! next `get` retries.

use crate::error::AppError;
use crate::model::AssetPayload;
use crate::ports::AssetFetcher;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::oneshot;

pub type AssetResult = Result<AssetPayload, AppError>;

/// Cloneable handle to a cached, in-flight or queued fetch
pub type AssetFuture = Shared<BoxFuture<'static, AssetResult>>;

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Keys currently cached (resolved, in flight or queued)
    pub entries: usize,
    pub in_flight: usize,
    pub queued: usize,
    /// Fetches admitted since creation
    pub fetches: u64,
    pub failures: u64,
    /// `get` calls served by an existing entry
    pub hits: u64,
}

struct CacheEntry {
    future: AssetFuture,
    id: u64,
}

struct Request {
    key: String,
    id: u64,
    tx: oneshot::Sender<AssetResult>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    queue: VecDeque<Request>,
    in_flight: usize,
    next_id: u64,
    fetches: u64,
    failures: u64,
    hits: u64,
}

impl CacheState {
    /// Pop the oldest queued request that still has a waiter
    fn admit_next(&mut self) -> Option<Request> {
        while let Some(request) = self.queue.pop_front() {
            if request.tx.is_closed() {
                tracing::debug!("Skipping abandoned request: {}", request.key);
                continue;
            }
            self.in_flight += 1;
            self.fetches += 1;
            return Some(request);
        }
        None
    }
}

struct Inner {
    fetcher: Arc<dyn AssetFetcher>,
    ceiling: usize,
    state: Mutex<CacheState>,
}

impl Inner {
    fn start(self: &Arc<Self>, request: Request) {
        tracing::debug!("Fetch admitted: {}", request.key);
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            // A panicking fetcher is treated like a failed fetch
            let result = AssertUnwindSafe(inner.fetcher.fetch_asset_bytes(&request.key))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    tracing::error!("Fetcher panicked on {}", request.key);
                    Err(AppError::io(request.key.as_str(), "fetch panicked"))
                });
            inner.finish(request, result);
        });
    }

    fn finish(self: &Arc<Self>, request: Request, result: AssetResult) {
        let next = {
            let mut state = self.state.lock();
            state.in_flight = state.in_flight.saturating_sub(1);

            if let Err(e) = &result {
                state.failures += 1;
                let owned = state
                    .entries
                    .get(&request.key)
                    .is_some_and(|entry| entry.id == request.id);
                if owned {
                    state.entries.remove(&request.key);
                }
                tracing::debug!("Fetch failed, evicted {}: {}", request.key, e);
            }

            state.admit_next()
        };

        // Waiters may all be gone; the result is simply unused then
        let _ = request.tx.send(result);

        if let Some(next) = next {
            self.start(next);
        }
    }
}

/// Process-wide asset cache; clones share the same state
#[derive(Clone)]
pub struct AssetCache {
    inner: Arc<Inner>,
}

impl AssetCache {
    /// Create a cache admitting at most `ceiling` concurrent fetches (minimum 1)
    pub fn new(fetcher: Arc<dyn AssetFetcher>, ceiling: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                ceiling: ceiling.max(1),
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    pub fn ceiling(&self) -> usize {
        self.inner.ceiling
    }

    /// Get the payload for `key`, starting or queueing a fetch when not cached
    ///
    /// Must be called within a tokio runtime.
    pub fn get(&self, key: &str) -> AssetFuture {
        let mut state = self.inner.state.lock();

        if let Some(entry) = state.entries.get(key) {
            let future = entry.future.clone();
            state.hits += 1;
            return future;
        }

        let id = state.next_id;
        state.next_id += 1;

        let (tx, rx) = oneshot::channel();
        let dropped_key = key.to_string();
        let future = async move {
            match rx.await {
                Ok(result) => result,
                Err(_) => Err(AppError::Dropped(dropped_key)),
            }
        }
        .boxed()
        .shared();

        state.entries.insert(
            key.to_string(),
            CacheEntry {
                future: future.clone(),
                id,
            },
        );

        let request = Request {
            key: key.to_string(),
            id,
            tx,
        };

        if state.in_flight < self.inner.ceiling {
            state.in_flight += 1;
            state.fetches += 1;
            drop(state);
            self.inner.start(request);
        } else {
            tracing::debug!("Fetch queued ({} waiting): {}", state.queue.len() + 1, key);
            state.queue.push_back(request);
        }

        future
    }

    /// Whether `key` has a live entry
    pub fn contains(&self, key: &str) -> bool {
        self.inner.state.lock().entries.contains_key(key)
    }

    /// Evict every key starting with `prefix`
    ///
    /// Admitted fetches keep running and still resolve their waiters, but
    /// their results are no longer cached.
    pub fn invalidate(&self, prefix: &str) -> usize {
        let mut state = self.inner.state.lock();
        let before = state.entries.len();
        state.entries.retain(|key, _| !key.starts_with(prefix));
        let evicted = before - state.entries.len();
        if evicted > 0 {
            tracing::debug!("Invalidated {} entries under {}", evicted, prefix);
        }
        evicted
    }

    /// Evict everything and drop queued requests without running them
    ///
    /// Waiters of dropped requests resolve with [`AppError::Dropped`].
    pub fn clear(&self) {
        let dropped = {
            let mut state = self.inner.state.lock();
            state.entries.clear();
            std::mem::take(&mut state.queue)
        };
        tracing::debug!("Cache cleared, dropped {} queued requests", dropped.len());
        drop(dropped);
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.inner.state.lock();
        CacheStats {
            entries: state.entries.len(),
            in_flight: state.in_flight,
            queued: state.queue.len(),
            fetches: state.fetches,
            failures: state.failures,
            hits: state.hits,
        }
    }
}
