//! Core types for the reaction cache.
//!
//! A [`ReactionRecord`] is one approve/reject signal observed between two
//! users. The persisted ledger is a plain ordered list of records; policy
//! decisions only ever look at set membership, never at order.

use serde::{Deserialize, Serialize};

/// Default storage key under which the ledger is persisted.
pub const DEFAULT_STORAGE_KEY: &str = "reaction_cache";

/// Reaction content meaning approval.
pub const APPROVE: &str = "+";

/// Reaction content meaning rejection.
pub const REJECT: &str = "-";

/// The full persisted collection of reactions, in insertion order.
pub type ReactionCache = Vec<ReactionRecord>;

/// Policy meaning of a reaction's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    /// `"+"`: the actor approves of the subject.
    Approve,
    /// `"-"`: the actor rejects the subject.
    Reject,
    /// Any other content. Stored, but carries no policy meaning.
    Other,
}

impl ReactionKind {
    /// Classifies raw reaction content.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        match content {
            APPROVE => Self::Approve,
            REJECT => Self::Reject,
            _ => Self::Other,
        }
    }
}

/// One observed social signal between two users.
///
/// Fields missing from a persisted payload default to empty values, so a
/// malformed record loads fine and simply matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionRecord {
    /// Id of the originating protocol event (dedup key).
    pub id: String,
    /// Public key of the user who reacted.
    pub from: String,
    /// Public key of the user who was reacted to.
    pub to: String,
    /// `"+"` or `"-"`; anything else is passed through.
    pub content: String,
    /// Event time in seconds. Not monotonic per user.
    pub timestamp: i64,
}

impl ReactionRecord {
    /// Creates a new reaction record.
    ///
    /// # Example
    ///
    /// ```
    /// use rapport_core::reaction::{ReactionKind, ReactionRecord};
    ///
    /// let record = ReactionRecord::new("e1", "alice", "bob", "+", 100);
    /// assert_eq!(record.kind(), ReactionKind::Approve);
    /// ```
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        content: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            content: content.into(),
            timestamp,
        }
    }

    /// Returns the policy meaning of this record's content.
    #[must_use]
    pub fn kind(&self) -> ReactionKind {
        ReactionKind::parse(&self.content)
    }

    /// Returns whether this record is a rejection.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        self.kind() == ReactionKind::Reject
    }

    /// Returns whether this record can influence visibility at all.
    ///
    /// Self-reactions and records with an empty endpoint are ignored.
    #[must_use]
    pub fn is_meaningful(&self) -> bool {
        !self.from.is_empty() && !self.to.is_empty() && self.from != self.to
    }

    /// Returns whether this record links `a` and `b`, in either direction.
    #[must_use]
    pub fn links(&self, a: &str, b: &str) -> bool {
        self.is_meaningful()
            && ((self.from == a && self.to == b) || (self.from == b && self.to == a))
    }

    /// Returns the unordered pair this record belongs to, smaller key first.
    ///
    /// `None` for records without policy meaning.
    #[must_use]
    pub fn pair(&self) -> Option<(&str, &str)> {
        if !self.is_meaningful() {
            return None;
        }
        let (from, to) = (self.from.as_str(), self.to.as_str());
        Some(if from <= to { (from, to) } else { (to, from) })
    }
}

/// How the ledger is kept bounded over long client lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetentionPolicy {
    /// Never evict anything.
    #[default]
    KeepAll,
    /// Compact to one record per pair once the ledger exceeds `threshold`.
    CompactPerPair {
        /// Ledger size above which an append triggers compaction.
        threshold: usize,
    },
}

/// Configuration for a [`VisibilityEngine`](super::VisibilityEngine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionCacheConfig {
    /// Key under which the ledger is stored.
    pub storage_key: String,
    /// Retention policy for the ledger.
    pub retention: RetentionPolicy,
}

impl Default for ReactionCacheConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            retention: RetentionPolicy::default(),
        }
    }
}

impl ReactionCacheConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the storage key.
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Sets the retention policy.
    #[must_use]
    pub const fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }
}
