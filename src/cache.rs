//! An in-process cache with a fixed time-to-live.
//!
//! Values are stored as serialized JSON bytes so that one cache can hold the transaction list and
//! the dashboard side by side. Entries are never returned once they are `ttl` old. Expiry and
//! eviction are handled by `moka`; there is no size bound.
//!
//! The cache is an explicit object owned by `Finance` and shared (cheaply cloned) with the `Store`,
//! so each `Finance`, and each test, gets its own.

use moka::future::Cache as MokaCache;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Key under which the full, date-sorted transaction list is cached.
pub const ALL_TRANSACTIONS: &str = "all_transactions";

/// Key under which the aggregated dashboard is cached.
pub const DASHBOARD_DATA: &str = "dashboard_data";

/// Five minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
pub struct Cache {
    inner: MokaCache<String, Arc<Vec<u8>>>,
}

impl Default for Cache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl Cache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: MokaCache::builder().time_to_live(ttl).build(),
        }
    }

    /// Returns the value stored under `key` unless it is missing or expired.
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.get(key).await.map(|value| (*value).clone())
    }

    /// Stores `value` under `key`, replacing any previous value and restarting its TTL.
    pub async fn set(&self, key: &str, value: Vec<u8>) {
        self.inner.insert(key.to_string(), Arc::new(value)).await;
    }

    /// Removes the entry under `key`, or every entry when `key` is `None`.
    pub async fn clear(&self, key: Option<&str>) {
        match key {
            Some(key) => self.inner.invalidate(key).await,
            None => {
                debug!("Clearing the whole cache");
                self.inner.invalidate_all();
            }
        }
    }

    /// Reads and deserializes a value. A value that no longer deserializes is dropped and treated
    /// as a miss.
    pub(crate) async fn get_json<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let bytes = self.inner.get(key).await?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding unreadable cache entry '{key}': {e}");
                self.clear(Some(key)).await;
                None
            }
        }
    }

    /// Serializes and stores a value. Serialization failures are logged and the value is simply
    /// not cached.
    pub(crate) async fn set_json<T>(&self, key: &str, value: &T)
    where
        T: Serialize,
    {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.set(key, bytes).await,
            Err(e) => warn!("Unable to cache '{key}': {e}"),
        }
    }
}
