//! Mutual-visibility policy over the reaction ledger.
//!
//! This module provides the [`VisibilityEngine`], which ingests reactions
//! with dedup by event id and decides whether two users may be shown to each
//! other in a discovery feed.
//!
//! # Policy
//!
//! - Users who never interacted are always shown.
//! - A single rejection between a pair, by either side, hides them from each
//!   other permanently. Later approvals never reverse it.
//! - Self-reactions and records with an empty endpoint are ignored.

use std::sync::Mutex;

use log::debug;
use nostr::Event;

use super::error::{ReactionError, Result};
use super::kv::KeyValueStore;
use super::retention;
use super::storage::ReactionStore;
use super::types::{ReactionCache, ReactionCacheConfig, ReactionRecord, RetentionPolicy};

/// High-level API for recording reactions and deciding visibility.
///
/// All mutations are serialized through an internal lock, so concurrent
/// [`add_reaction`](Self::add_reaction) calls on one engine never lose an
/// append. Two engines sharing one storage key do not coordinate.
///
/// # Example
///
/// ```
/// use rapport_core::reaction::{
///     ReactionCacheConfig, ReactionRecord, SqliteKeyValueStore, VisibilityEngine,
/// };
///
/// let kv = SqliteKeyValueStore::in_memory().unwrap();
/// let engine = VisibilityEngine::new(kv, ReactionCacheConfig::default());
///
/// engine
///     .add_reaction(ReactionRecord::new("e2", "bob", "alice", "-", 200))
///     .unwrap();
/// assert!(!engine.should_show_user("alice", "bob"));
/// assert!(engine.should_show_user("carol", "bob"));
/// ```
pub struct VisibilityEngine<S> {
    store: ReactionStore<S>,
    retention: RetentionPolicy,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> VisibilityEngine<S> {
    /// Creates an engine persisting into `kv` under the configured key.
    pub fn new(kv: S, config: ReactionCacheConfig) -> Self {
        Self {
            store: ReactionStore::new(kv, config.storage_key),
            retention: config.retention,
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the underlying reaction store.
    #[must_use]
    pub const fn store(&self) -> &ReactionStore<S> {
        &self.store
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|e| ReactionError::Storage(format!("Failed to acquire write lock: {e}")))
    }

    // ==================== Ingestion ====================

    /// Records a reaction unless one with the same id is already stored.
    ///
    /// The record is stored as-is; no validation of `from`/`to` is done.
    ///
    /// # Returns
    ///
    /// `true` if the record was appended, `false` if it was a duplicate.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read or written, including
    /// [`ReactionError::CapacityExceeded`] when the medium is full. The
    /// stored ledger is unchanged on error.
    pub fn add_reaction(&self, reaction: ReactionRecord) -> Result<bool> {
        let _guard = self.lock()?;

        let mut cache = self.store.try_load()?;
        if cache.iter().any(|r| r.id == reaction.id) {
            debug!("Ignoring duplicate reaction {}", reaction.id);
            return Ok(false);
        }

        debug!(
            "Recording reaction {} ({} -> {}: {:?})",
            reaction.id, reaction.from, reaction.to, reaction.content
        );
        cache.push(reaction);

        if let RetentionPolicy::CompactPerPair { threshold } = self.retention {
            if cache.len() > threshold {
                let before = cache.len();
                cache = retention::compact(&cache);
                debug!("Compacted reaction cache from {before} to {}", cache.len());
            }
        }

        self.store.save(&cache)?;
        Ok(true)
    }

    /// Converts a NIP-25 reaction event and records it.
    ///
    /// # Errors
    ///
    /// Returns [`ReactionError::InvalidEvent`] if the event is not a usable
    /// reaction, or any error from [`add_reaction`](Self::add_reaction).
    pub fn ingest_event(&self, event: &Event) -> Result<bool> {
        let record = ReactionRecord::try_from(event)?;
        self.add_reaction(record)
    }

    /// Compacts the ledger to one record per pair.
    ///
    /// No pair's visibility decision changes.
    ///
    /// # Returns
    ///
    /// The number of records removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read or written.
    pub fn compact(&self) -> Result<usize> {
        let _guard = self.lock()?;

        let cache = self.store.try_load()?;
        let compacted = retention::compact(&cache);
        let removed = cache.len() - compacted.len();
        if removed > 0 {
            self.store.save(&compacted)?;
            debug!("Compaction removed {removed} reactions");
        }
        Ok(removed)
    }

    // ==================== Queries ====================

    /// Returns a snapshot of the persisted ledger.
    #[must_use]
    pub fn reactions(&self) -> ReactionCache {
        self.store.load()
    }

    /// Returns whether any stored record links the pair, in either direction.
    #[must_use]
    pub fn has_interaction(&self, pubkey_a: &str, pubkey_b: &str) -> bool {
        has_interaction_in(&self.store.load(), pubkey_a, pubkey_b)
    }

    /// Returns `false` iff a rejection exists between the pair.
    ///
    /// Returns `true` when the pair never interacted.
    #[must_use]
    pub fn can_interact(&self, pubkey_a: &str, pubkey_b: &str) -> bool {
        can_interact_in(&self.store.load(), pubkey_a, pubkey_b)
    }

    /// Decides whether `candidate` may be shown to `viewer`.
    ///
    /// Unseen users are always shown; otherwise this is
    /// [`can_interact`](Self::can_interact). A `false` result means the
    /// candidate must never be rendered to this viewer.
    #[must_use]
    pub fn should_show_user(&self, candidate: &str, viewer: &str) -> bool {
        let cache = self.store.load();
        if !has_interaction_in(&cache, candidate, viewer) {
            return true;
        }
        can_interact_in(&cache, candidate, viewer)
    }
}

fn has_interaction_in(cache: &[ReactionRecord], a: &str, b: &str) -> bool {
    cache.iter().any(|r| r.links(a, b))
}

fn can_interact_in(cache: &[ReactionRecord], a: &str, b: &str) -> bool {
    !cache.iter().any(|r| r.is_rejection() && r.links(a, b))
}
