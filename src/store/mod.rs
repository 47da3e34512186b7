//! # Persisted Record Store
//!
//! Generic load/save of JSON collections over a [`StorageBackend`]. Reads
//! fail soft: a missing or corrupt collection is an empty collection, logged
//! and never propagated to the caller. Saves overwrite the entire
//! collection; last writer wins. That is only safe because the engine has a
//! single writer; sharing a backend between processes would silently drop
//! concurrent writes.

pub mod backend;


use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::errors::{OrderFlowError, OrderFlowResult};

pub use backend::{FileBackend, MemoryBackend, StorageBackend};

/// Collection key for orders.
pub const ORDERS: &str = "orders";
/// Collection key for the returned-items ledger.
pub const RETURNED_ITEMS: &str = "returned_items";
/// Collection key for the payments ledger.
pub const PAYMENTS: &str = "payments";

/// Record store over a key-value backend, one JSON array per collection.
pub struct RecordStore {
    backend: Box<dyn StorageBackend>,
}

impl RecordStore {
    /// Creates a store over the given backend.
    #[must_use]
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Creates a store over a fresh in-memory backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()))
    }

    /// Loads a collection. Absent or unparseable data yields an empty
    /// vector; the failure is logged, not returned.
    pub fn load<T: DeserializeOwned>(&self, collection: &str) -> Vec<T> {
        match self.decode(collection) {
            Ok(records) => records,
            Err(err) => {
                warn!(%err, collection, "treating unreadable collection as empty");
                Vec::new()
            },
        }
    }

    /// Serializes and overwrites an entire collection.
    pub fn save<T: Serialize>(&self, collection: &str, records: &[T]) -> OrderFlowResult<()> {
        let raw = serde_json::to_string(records).map_err(|e| OrderFlowError::StoreWrite {
            collection: collection.to_string(),
            reason:     e.to_string(),
        })?;
        self.backend.set(collection, &raw)
    }

    fn decode<T: DeserializeOwned>(&self, collection: &str) -> OrderFlowResult<Vec<T>> {
        let Some(raw) = self.backend.get(collection) else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|e| OrderFlowError::StoreRead {
            collection: collection.to_string(),
            reason:     e.to_string(),
        })
    }
}
