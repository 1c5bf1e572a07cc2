//! Mutual-visibility reaction cache.
//!
//! This module keeps a local ledger of approve/reject reactions exchanged
//! between pairs of users and derives from it whether two users should be
//! shown to each other in a discovery feed.
//!
//! # Architecture
//!
//! ```text
//! VisibilityEngine (dedup, policy, retention)
//!     └── ReactionStore (whole-ledger JSON under one key)
//!             └── KeyValueStore (SQLite, or in-memory for tests)
//! ```
//!
//! # Failure Model
//!
//! - A missing or corrupt ledger loads as empty, so everyone is shown
//! - A refused write surfaces as [`ReactionError::CapacityExceeded`]
//! - A stored rejection is never undone
//!
//! # Types
//!
//! - [`ReactionRecord`]: One approve/reject signal between two users
//! - [`ReactionCacheConfig`]: Storage key and retention policy
//! - [`RetentionPolicy`]: Whether and when the ledger is compacted

mod engine;
mod error;
mod kv;
mod nostr;
mod retention;
mod storage;
pub mod types;

pub use engine::VisibilityEngine;
pub use error::{ReactionError, Result};
#[cfg(any(test, feature = "test-utils"))]
pub use kv::MemoryKeyValueStore;
pub use kv::{KeyValueStore, SqliteKeyValueStore};
pub use retention::compact;
pub use storage::ReactionStore;
pub use types::{
    ReactionCache, ReactionCacheConfig, ReactionKind, ReactionRecord, RetentionPolicy, APPROVE,
    DEFAULT_STORAGE_KEY, REJECT,
};
