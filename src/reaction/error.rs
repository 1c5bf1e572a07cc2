//! Error types for reaction cache operations.
//!
//! This module defines errors that can occur while persisting reactions,
//! ingesting Nostr events, and compacting the ledger. Corrupt payloads are
//! not represented here: they are recovered as an empty ledger on load.

use thiserror::Error;

/// Error type for reaction cache operations.
#[derive(Error, Debug)]
pub enum ReactionError {
    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database error from `SQLite`.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization of the ledger failed.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The storage medium refused a write because it would exceed its quota.
    #[error("Capacity exceeded for key {key}: {size} bytes (limit {limit})")]
    CapacityExceeded {
        /// Storage key that was being written.
        key: String,
        /// Size of the rejected value in bytes.
        size: usize,
        /// Configured limit in bytes.
        limit: usize,
    },

    /// The storage medium ran out of space with no configured quota.
    #[error("Storage full while writing key {key} ({size} bytes)")]
    StorageFull {
        /// Storage key that was being written.
        key: String,
        /// Size of the rejected value in bytes.
        size: usize,
    },

    /// The event is not a usable reaction.
    #[error("Invalid event: {0}")]
    InvalidEvent(String),
}

impl ReactionError {
    /// Returns whether the medium refused a write for lack of space.
    ///
    /// Callers use this to skip caching a reaction instead of failing the feed.
    #[must_use]
    pub const fn is_capacity_exceeded(&self) -> bool {
        matches!(
            self,
            Self::CapacityExceeded { .. } | Self::StorageFull { .. }
        )
    }
}

/// Result type alias for reaction cache operations.
pub type Result<T> = std::result::Result<T, ReactionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_display() {
        let err = ReactionError::Storage("lock poisoned".to_string());
        assert_eq!(err.to_string(), "Storage error: lock poisoned");
    }

    #[test]
    fn capacity_exceeded_display() {
        let err = ReactionError::CapacityExceeded {
            key: "reaction_cache".to_string(),
            size: 2048,
            limit: 1024,
        };
        assert_eq!(
            err.to_string(),
            "Capacity exceeded for key reaction_cache: 2048 bytes (limit 1024)"
        );
        assert!(err.is_capacity_exceeded());
    }

    #[test]
    fn storage_full_display() {
        let err = ReactionError::StorageFull {
            key: "reaction_cache".to_string(),
            size: 4096,
        };
        assert_eq!(
            err.to_string(),
            "Storage full while writing key reaction_cache (4096 bytes)"
        );
        assert!(err.is_capacity_exceeded());
    }

    #[test]
    fn invalid_event_display() {
        let err = ReactionError::InvalidEvent("missing p tag".to_string());
        assert_eq!(err.to_string(), "Invalid event: missing p tag");
        assert!(!err.is_capacity_exceeded());
    }

    #[test]
    fn error_from_serde_json() {
        let json_err = serde_json::from_str::<i32>("invalid").unwrap_err();
        let err: ReactionError = json_err.into();
        assert!(matches!(err, ReactionError::Serialization(_)));
    }

    #[test]
    fn error_from_rusqlite() {
        let err: ReactionError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, ReactionError::Database(_)));
        assert!(err.to_string().starts_with("Database error:"));
    }
}
