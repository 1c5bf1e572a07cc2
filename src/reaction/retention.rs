//! Ledger compaction.
//!
//! Compaction bounds the ledger to one record per pair without changing any
//! pair's visibility decision:
//!
//! - a pair with any rejection keeps its earliest-inserted rejection
//! - any other pair keeps its latest record by timestamp
//! - records without policy meaning are dropped
//!
//! Survivors keep their relative insertion order.

use std::collections::HashMap;

use super::types::{ReactionCache, ReactionRecord};

/// Compacts `cache` to at most one record per unordered pair.
#[must_use]
pub fn compact(cache: &[ReactionRecord]) -> ReactionCache {
    // pair -> index of the surviving record
    let mut keep: HashMap<(&str, &str), usize> = HashMap::new();

    for (index, record) in cache.iter().enumerate() {
        let Some(pair) = record.pair() else {
            continue;
        };

        match keep.get(&pair).map(|&kept| &cache[kept]) {
            None => {
                keep.insert(pair, index);
            }
            Some(kept) if kept.is_rejection() => {}
            Some(kept) => {
                if record.is_rejection() || record.timestamp >= kept.timestamp {
                    keep.insert(pair, index);
                }
            }
        }
    }

    let mut survivors: Vec<usize> = keep.into_values().collect();
    survivors.sort_unstable();
    survivors.into_iter().map(|i| cache[i].clone()).collect()
}
