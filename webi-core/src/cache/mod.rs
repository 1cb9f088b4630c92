//! In-memory caching layer
//!
//! - [`TtlCache`]: bounded key/value store with per-entry expiry, LRU
//!   eviction and optional stale serving
//! - [`get_cached`]: read-through helper with stale-while-error fallback
//! - [`InFlight`]: single-flight registry so concurrent misses for the
//!   same key share one fetch
//!
//! Nothing here touches disk; every cache lives as long as its owner.

mod inflight;
mod ttl;

pub use inflight::InFlight;
pub use ttl::{CacheOptions, Lookup, TtlCache};

use std::fmt::Display;
use std::future::Future;
use tracing::{debug, warn};

/// Read-through lookup
///
/// Returns a fresh hit immediately. On a miss, runs `fetch` and stores the
/// result. If `fetch` fails and the cache still holds an expired entry that
/// may be served stale, that entry is returned instead of the error.
///
/// Concurrent misses for one key are *not* coalesced here; wrap the call in
/// [`InFlight::run`] when that matters.
pub async fn get_cached<V, E, F, Fut>(cache: &TtlCache<V>, key: &str, fetch: F) -> Result<V, E>
where
    V: Clone,
    E: Display,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>>,
{
    let stale = match cache.lookup(key) {
        Some(Lookup::Fresh(value)) => {
            debug!("Cache hit for {} ({})", key, cache.name());
            return Ok(value);
        }
        Some(Lookup::Stale(value)) => Some(value),
        None => None,
    };

    debug!("Cache miss for {} ({}), fetching data...", key, cache.name());

    match fetch().await {
        Ok(value) => {
            cache.set(key, value.clone());
            Ok(value)
        }
        Err(e) => match stale {
            Some(value) => {
                warn!("Serving stale {} entry for {}: {}", cache.name(), key, e);
                Ok(value)
            }
            None => Err(e),
        },
    }
}
