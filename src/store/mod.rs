//! The ranked-score store: a hash index for point lookups joined with a
//! skip list for order and rank, kept consistent behind one reader-writer
//! domain.

pub mod hash_index;
pub mod skiplist;

use std::sync::RwLock;

use tracing::debug;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::models::{RankEntry, RankedCustomer};

pub use hash_index::{HashIndex, StableKey};
pub use skiplist::{RankedSkipList, SortKey};

/// Orchestrates the hash index and the ranked skip list.
///
/// The skip list's lock doubles as the store-wide writer domain:
/// `update_score` holds the write guard across the removal, the score
/// mutation, the reinsertion and the index upsert, and queries take the
/// read guard before consulting the index. A reader therefore always sees
/// the two structures in a consistent state, and operations on the same
/// customer are linearizable. Lock order is always list-then-index.
pub struct RankStore {
    index: HashIndex<i64, RankEntry>,
    ranked: RwLock<RankedSkipList>,
}

impl RankStore {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let index = HashIndex::with_capacity(config.initial_capacity, config.load_factor)?;
        let ranked = match config.level_seed {
            Some(seed) => RankedSkipList::with_seed(seed),
            None => RankedSkipList::new(),
        };
        Ok(Self {
            index,
            ranked: RwLock::new(ranked),
        })
    }

    /// Applies `delta` to the customer's total and reconciles ranked
    /// membership, returning the new total.
    ///
    /// The entry stays in the index whatever the total becomes; only the
    /// skip list is conditional on a strictly positive score. Never fails:
    /// a zero or negative result is a membership transition, not an error.
    pub fn update_score(&self, customer_id: i64, delta: i64) -> i64 {
        let mut ranked = self.ranked.write().expect("rank store lock poisoned");

        let entry = match self.index.get(&customer_id) {
            Some(mut entry) => {
                // No-op when the entry was not ranked.
                ranked.remove(SortKey::new(entry.score, customer_id));
                entry.score = entry.score.saturating_add(delta);
                entry
            }
            None => RankEntry::new(customer_id, delta),
        };

        if entry.score > 0 {
            ranked.insert(SortKey::new(entry.score, customer_id));
        }
        self.index.put(customer_id, entry);

        debug!(
            customer_id,
            delta,
            total = entry.score,
            ranked = entry.score > 0,
            "score updated"
        );
        entry.score
    }

    /// Inclusive rank range, clamped to the current ranked population.
    ///
    /// Ranks are stamped as `start + index` over the returned slice; an
    /// empty range after clamping is an empty result, not an error.
    pub fn leaderboard(&self, start: i64, end: i64) -> Vec<RankedCustomer> {
        let ranked = self.ranked.read().expect("rank store lock poisoned");

        let start = start.max(1);
        let end = end.min(ranked.len() as i64);
        if start > end {
            return Vec::new();
        }

        ranked
            .range_by_rank(start, end)
            .into_iter()
            .enumerate()
            .map(|(offset, key)| RankedCustomer {
                customer_id: key.customer_id,
                score: key.score,
                rank: start as u64 + offset as u64,
            })
            .collect()
    }

    /// The customer plus up to `count_above` ranked neighbors before it and
    /// `count_below` after it, in rank order.
    ///
    /// Empty when the customer is unknown or currently unranked. Negative
    /// neighbor counts behave as zero. Entries with non-positive scores are
    /// skipped without counting; such entries should never be in the list,
    /// but the walk does not rely on that.
    pub fn customer_neighborhood(
        &self,
        customer_id: i64,
        count_above: i64,
        count_below: i64,
    ) -> Vec<RankedCustomer> {
        let ranked = self.ranked.read().expect("rank store lock poisoned");

        let entry = match self.index.get(&customer_id) {
            Some(entry) if entry.score > 0 => entry,
            _ => return Vec::new(),
        };
        let node = match ranked.locate(SortKey::new(entry.score, customer_id)) {
            Some(node) => node,
            None => return Vec::new(),
        };

        let count_above = count_above.max(0) as usize;
        let count_below = count_below.max(0) as usize;
        let self_rank = node.rank() as u64;

        // Collected nearest-first, then reversed so ranks ascend toward self.
        let mut above = Vec::with_capacity(count_above);
        let mut rank = self_rank;
        for key in node.predecessors() {
            if above.len() == count_above {
                break;
            }
            if key.score > 0 {
                rank -= 1;
                above.push(RankedCustomer {
                    customer_id: key.customer_id,
                    score: key.score,
                    rank,
                });
            }
        }

        let mut result = Vec::with_capacity(above.len() + 1 + count_below);
        result.extend(above.into_iter().rev());
        result.push(RankedCustomer {
            customer_id,
            score: entry.score,
            rank: self_rank,
        });

        let mut below = 0;
        let mut rank = self_rank;
        for key in node.successors() {
            if below == count_below {
                break;
            }
            if key.score > 0 {
                below += 1;
                rank += 1;
                result.push(RankedCustomer {
                    customer_id: key.customer_id,
                    score: key.score,
                    rank,
                });
            }
        }

        result
    }

    /// Customers currently holding a positive score.
    pub fn ranked_count(&self) -> usize {
        self.ranked.read().expect("rank store lock poisoned").len()
    }

    /// Customers ever seen, whatever their current total.
    pub fn tracked_count(&self) -> usize {
        self.index.len()
    }
}
