//! Single-flight registry for concurrent fetches

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

type SharedFetch<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

/// Tracks fetches that are currently running, keyed by cache key
///
/// The first caller for a key starts the fetch; every caller that arrives
/// while it is still running awaits the same future and receives a clone
/// of its result. Once the fetch resolves the key is released, so the next
/// miss starts a new one.
pub struct InFlight<V, E> {
    pending: Mutex<HashMap<String, SharedFetch<V, E>>>,
}

impl<V, E> Default for InFlight<V, E> {
    fn default() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }
}

impl<V, E> InFlight<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<String, SharedFetch<V, E>>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `start()` for `key` unless a fetch for it is already running,
    /// in which case join that one
    ///
    /// `start` is only invoked by the caller that becomes the leader.
    pub async fn run<F, Fut>(&self, key: &str, start: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let shared = {
            let mut pending = self.pending();
            // A resolved future left behind by cancelled waiters is not reused
            let running = pending
                .get(key)
                .filter(|existing| existing.peek().is_none())
                .cloned();

            match running {
                Some(existing) => {
                    debug!("Joining in-flight fetch for {}", key);
                    existing
                }
                None => {
                    let fetch = start().boxed().shared();
                    pending.insert(key.to_string(), fetch.clone());
                    fetch
                }
            }
        };

        let result = shared.clone().await;

        let mut pending = self.pending();
        if pending
            .get(key)
            .is_some_and(|current| current.ptr_eq(&shared))
        {
            pending.remove(key);
        }

        result
    }

    /// Whether a fetch for `key` is currently running
    pub fn is_running(&self, key: &str) -> bool {
        self.pending()
            .get(key)
            .is_some_and(|fetch| fetch.peek().is_none())
    }
}
