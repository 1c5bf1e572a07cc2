//! Whole-collection persistence of the reaction ledger.
//!
//! The ledger is stored as a JSON array of records under a single key.
//! Every save replaces the whole value; there are no partial writes.

use log::{debug, warn};
use serde_json::Value;

use super::error::Result;
use super::kv::KeyValueStore;
use super::types::{ReactionCache, ReactionRecord};

/// Reads and writes the full [`ReactionCache`] under one storage key.
pub struct ReactionStore<S> {
    kv: S,
    key: String,
}

impl<S: KeyValueStore> ReactionStore<S> {
    /// Creates a store that keeps the ledger under `key` in `kv`.
    pub fn new(kv: S, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    /// Returns the underlying key-value medium.
    #[must_use]
    pub const fn kv(&self) -> &S {
        &self.kv
    }

    /// Returns the storage key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the persisted ledger, or an empty one if none exists.
    ///
    /// Never fails: a corrupt payload or an unreadable medium both load as
    /// an empty ledger.
    #[must_use]
    pub fn load(&self) -> ReactionCache {
        self.try_load().unwrap_or_else(|e| {
            warn!("Reading reaction cache {} failed, using empty: {e}", self.key);
            ReactionCache::new()
        })
    }

    /// Like [`load`](Self::load), but surfaces medium read failures.
    ///
    /// Corrupt payloads still load as empty. Writers use this so a
    /// transient read failure never clobbers the stored ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying medium cannot be read.
    pub fn try_load(&self) -> Result<ReactionCache> {
        Ok(self
            .kv
            .get(&self.key)?
            .map_or_else(ReactionCache::new, |payload| self.decode(&payload)))
    }

    /// Serializes and persists the whole ledger, replacing the prior value.
    ///
    /// # Errors
    ///
    /// Returns [`ReactionError::CapacityExceeded`](super::ReactionError::CapacityExceeded)
    /// if the medium refuses the write, or another error if it fails.
    pub fn save(&self, cache: &[ReactionRecord]) -> Result<()> {
        let payload = serde_json::to_string(cache)?;
        self.kv.put(&self.key, &payload)?;
        debug!("Saved {} reactions under {}", cache.len(), self.key);
        Ok(())
    }

    /// Removes the persisted ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be written.
    pub fn clear(&self) -> Result<()> {
        self.kv.remove(&self.key)
    }

    /// Decodes a payload element by element.
    ///
    /// A payload that is not a JSON array loads as empty. Elements that are
    /// not objects are skipped. Inside an object, absent and wrong-typed
    /// fields both default, so a record with a bad `timestamp` still keeps
    /// its endpoints and content.
    fn decode(&self, payload: &str) -> ReactionCache {
        let elements: Vec<Value> = match serde_json::from_str(payload) {
            Ok(elements) => elements,
            Err(e) => {
                warn!("Corrupt reaction cache under {}, using empty: {e}", self.key);
                return ReactionCache::new();
            }
        };

        elements
            .iter()
            .filter_map(|element| {
                let record = record_from_value(element);
                if record.is_none() {
                    warn!("Skipping non-object reaction in {}: {element}", self.key);
                }
                record
            })
            .collect()
    }
}

/// Builds a record from a JSON object one field at a time.
///
/// Numeric ids are kept as their decimal text so dedup still applies.
fn record_from_value(element: &Value) -> Option<ReactionRecord> {
    let fields = element.as_object()?;
    let text = |name: &str| {
        fields
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let id = match fields.get("id") {
        Some(Value::Number(n)) => n.to_string(),
        _ => text("id"),
    };

    Some(ReactionRecord {
        id,
        from: text("from"),
        to: text("to"),
        content: text("content"),
        timestamp: fields
            .get("timestamp")
            .and_then(Value::as_i64)
            .unwrap_or_default(),
    })
}
