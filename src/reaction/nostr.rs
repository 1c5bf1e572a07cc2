//! Conversion of NIP-25 reaction events into ledger records.
//!
//! A kind 7 event authored by `pubkey` with a `p` tag naming the reacted-to
//! author becomes one [`ReactionRecord`]. Per NIP-25 the last `p` tag is the
//! author of the reacted event.

use nostr::{Event, Kind};

use super::error::{ReactionError, Result};
use super::types::ReactionRecord;

impl TryFrom<&Event> for ReactionRecord {
    type Error = ReactionError;

    fn try_from(event: &Event) -> Result<Self> {
        if event.kind != Kind::Reaction {
            return Err(ReactionError::InvalidEvent(format!(
                "Expected reaction kind 7, got {}",
                event.kind.as_u16()
            )));
        }

        let to = event.tags.public_keys().last().ok_or_else(|| {
            ReactionError::InvalidEvent("Reaction has no p tag".to_string())
        })?;

        let timestamp = i64::try_from(event.created_at.as_u64()).map_err(|_| {
            ReactionError::InvalidEvent("Reaction timestamp out of range".to_string())
        })?;

        Ok(Self {
            id: event.id.to_hex(),
            from: event.pubkey.to_hex(),
            to: to.to_hex(),
            content: event.content.clone(),
            timestamp,
        })
    }
}
