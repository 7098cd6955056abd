//! Ranked skip list over positively scored customers.
//!
//! A probabilistic multi-level linked structure sorted by
//! (score descending, customer id ascending). Nodes live in a growable
//! arena and link to each other by index, with a free list recycling the
//! slots of unlinked nodes; every level is doubly linked so neighborhood
//! queries can walk in both directions from a located node.
//!
//! Rank and range lookups are linear walks from the nearer of head and
//! tail; no per-level span counts are maintained.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, ServiceError};

/// Hard cap on node height; level 0 is the fully linked base list.
const MAX_LEVEL: usize = 16;

/// Arena slot of the head sentinel.
const HEAD: usize = 0;

/// Ordering key: score descending, then customer id ascending.
///
/// The order is strictly total — two keys compare equal only when both
/// fields match, so entries for different customers never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub score: i64,
    pub customer_id: i64,
}

impl SortKey {
    pub fn new(score: i64, customer_id: i64) -> Self {
        Self { score, customer_id }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| self.customer_id.cmp(&other.customer_id))
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone)]
struct Node {
    key: SortKey,
    /// `forward[i]` / `backward[i]` are the neighbors at level i, as arena
    /// indices. `None` means the level ends here (or, for `backward`, that
    /// the head sentinel precedes this node).
    forward: [Option<usize>; MAX_LEVEL],
    backward: [Option<usize>; MAX_LEVEL],
}

impl Node {
    fn new(key: SortKey) -> Self {
        Self {
            key,
            forward: [None; MAX_LEVEL],
            backward: [None; MAX_LEVEL],
        }
    }
}

/// Skip list keyed by [`SortKey`], backed by an index arena.
pub struct RankedSkipList {
    nodes: Vec<Node>,
    /// Recycled arena slots of removed nodes.
    free: Vec<usize>,
    /// Last node at level 0.
    tail: Option<usize>,
    /// Number of populated levels, 1..=MAX_LEVEL.
    level: usize,
    len: usize,
    rng: StdRng,
}

impl RankedSkipList {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic level assignment for reproducible tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        // The sentinel's synthetic key sorts before every real key.
        let sentinel = Node::new(SortKey::new(i64::MAX, i64::MIN));
        Self {
            nodes: vec![sentinel],
            free: Vec::new(),
            tail: None,
            level: 1,
            len: 0,
            rng,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Unbiased coin flips: each success grows the node one level, capped.
    fn random_level(&mut self) -> usize {
        let mut level = 1;
        while level < MAX_LEVEL && self.rng.gen_bool(0.5) {
            level += 1;
        }
        level
    }

    fn alloc(&mut self, node: Node) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Records the predecessor of `key` at every populated level.
    fn predecessors_of(&self, key: SortKey) -> [usize; MAX_LEVEL] {
        let mut update = [HEAD; MAX_LEVEL];
        let mut cur = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[cur].forward[i] {
                if self.nodes[next].key < key {
                    cur = next;
                } else {
                    break;
                }
            }
            update[i] = cur;
        }
        update
    }

    /// Splices a node for `key` into every level up to its assigned height.
    ///
    /// Returns false without touching the list when an equal key is already
    /// present; callers always remove before re-inserting, so a duplicate
    /// indicates a skipped removal rather than a legal state.
    pub fn insert(&mut self, key: SortKey) -> bool {
        let update = self.predecessors_of(key);

        if let Some(next) = self.nodes[update[0]].forward[0] {
            if self.nodes[next].key == key {
                return false;
            }
        }

        let node_level = self.random_level();
        if node_level > self.level {
            // update[] already holds the head for the new levels.
            self.level = node_level;
        }

        let idx = self.alloc(Node::new(key));
        for i in 0..node_level {
            let pred = update[i];
            let next = self.nodes[pred].forward[i];
            self.nodes[idx].forward[i] = next;
            self.nodes[idx].backward[i] = (pred != HEAD).then_some(pred);
            if let Some(follower) = next {
                self.nodes[follower].backward[i] = Some(idx);
            }
            self.nodes[pred].forward[i] = Some(idx);
        }
        if self.nodes[idx].forward[0].is_none() {
            self.tail = Some(idx);
        }
        self.len += 1;
        true
    }

    /// Unlinks the node for `key`'s customer, returning whether it was found.
    pub fn remove(&mut self, key: SortKey) -> bool {
        let update = self.predecessors_of(key);

        let target = match self.nodes[update[0]].forward[0] {
            Some(idx) if self.nodes[idx].key.customer_id == key.customer_id => idx,
            _ => return false,
        };

        for i in 0..self.level {
            // Once a predecessor stops pointing at the target, every level
            // above it does too.
            if self.nodes[update[i]].forward[i] != Some(target) {
                break;
            }
            let next = self.nodes[target].forward[i];
            self.nodes[update[i]].forward[i] = next;
            if let Some(follower) = next {
                self.nodes[follower].backward[i] = (update[i] != HEAD).then_some(update[i]);
            }
        }

        if self.tail == Some(target) {
            self.tail = self.nodes[target].backward[0];
        }
        self.free.push(target);
        self.len -= 1;
        true
    }

    /// Level-0 walk to the node holding the 1-based `rank`, entering from
    /// whichever of head and tail is nearer.
    fn node_at_rank(&self, rank: usize) -> Option<usize> {
        if rank < 1 || rank > self.len {
            return None;
        }
        if rank <= self.len / 2 {
            let mut idx = self.nodes[HEAD].forward[0]?;
            for _ in 1..rank {
                idx = self.nodes[idx].forward[0]?;
            }
            Some(idx)
        } else {
            let mut idx = self.tail?;
            for _ in rank..self.len {
                idx = self.nodes[idx].backward[0]?;
            }
            Some(idx)
        }
    }

    /// Key at the 1-based `rank`; ranks outside `[1, len]` are an error,
    /// distinct from an empty query result.
    pub fn get_by_rank(&self, rank: i64) -> Result<SortKey> {
        if rank < 1 || rank > self.len as i64 {
            return Err(ServiceError::RankOutOfRange {
                rank,
                count: self.len,
            });
        }
        self.node_at_rank(rank as usize)
            .map(|idx| self.nodes[idx].key)
            .ok_or(ServiceError::RankOutOfRange {
                rank,
                count: self.len,
            })
    }

    /// Keys at ranks `start..=end`, in rank order. Out-of-bounds or inverted
    /// bounds yield an empty result rather than an error.
    pub fn range_by_rank(&self, start: i64, end: i64) -> Vec<SortKey> {
        if start < 1 || end > self.len as i64 || start > end {
            return Vec::new();
        }

        let size = (end - start + 1) as usize;
        let mut out = Vec::with_capacity(size);
        let Some(mut idx) = self.node_at_rank(start as usize) else {
            return out;
        };
        loop {
            out.push(self.nodes[idx].key);
            if out.len() == size {
                break;
            }
            match self.nodes[idx].forward[0] {
                Some(next) => idx = next,
                None => break,
            }
        }
        out
    }

    /// Linear scan for the node holding exactly `key`, with its rank at the
    /// time of the scan. Exits early once the scan passes the key's position.
    pub fn locate(&self, key: SortKey) -> Option<NodeRef<'_>> {
        let mut rank = 0;
        let mut cursor = self.nodes[HEAD].forward[0];
        while let Some(idx) = cursor {
            rank += 1;
            let node_key = self.nodes[idx].key;
            if node_key == key {
                return Some(NodeRef {
                    list: self,
                    idx,
                    rank,
                });
            }
            if key < node_key {
                return None;
            }
            cursor = self.nodes[idx].forward[0];
        }
        None
    }
}

impl Default for RankedSkipList {
    fn default() -> Self {
        Self::new()
    }
}

/// A located node together with the rank it held when found.
pub struct NodeRef<'a> {
    list: &'a RankedSkipList,
    idx: usize,
    rank: usize,
}

impl<'a> NodeRef<'a> {
    pub fn key(&self) -> SortKey {
        self.list.nodes[self.idx].key
    }

    /// 1-based rank at location time.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Level-0 predecessors, nearest first (walking toward rank 1).
    pub fn predecessors(&self) -> impl Iterator<Item = SortKey> + 'a {
        let list = self.list;
        std::iter::successors(list.nodes[self.idx].backward[0], move |&idx| {
            list.nodes[idx].backward[0]
        })
        .map(move |idx| list.nodes[idx].key)
    }

    /// Level-0 successors, nearest first (walking toward the tail).
    pub fn successors(&self) -> impl Iterator<Item = SortKey> + 'a {
        let list = self.list;
        std::iter::successors(list.nodes[self.idx].forward[0], move |&idx| {
            list.nodes[idx].forward[0]
        })
        .map(move |idx| list.nodes[idx].key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_with(entries: &[(i64, i64)]) -> RankedSkipList {
        let mut list = RankedSkipList::with_seed(42);
        for &(score, id) in entries {
            assert!(list.insert(SortKey::new(score, id)));
        }
        list
    }

    fn ids_in_order(list: &RankedSkipList) -> Vec<i64> {
        list.range_by_rank(1, list.len() as i64)
            .iter()
            .map(|key| key.customer_id)
            .collect()
    }

    #[test]
    fn orders_by_score_desc_then_id_asc() {
        let list = list_with(&[(100, 3), (200, 1), (150, 2), (150, 4), (150, 1)]);
        // 150 appears for ids 1, 2 and 4; ties break on ascending id.
        assert_eq!(ids_in_order(&list), vec![1, 1, 2, 4, 3]);
        assert_eq!(list.get_by_rank(1).unwrap(), SortKey::new(200, 1));
    }

    #[test]
    fn duplicate_insert_is_a_noop() {
        let mut list = list_with(&[(100, 1)]);
        assert!(!list.insert(SortKey::new(100, 1)));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn remove_unlinks_and_keeps_order() {
        let mut list = list_with(&[(50, 4), (100, 1), (200, 2), (150, 3)]);
        assert!(list.remove(SortKey::new(150, 3)));
        assert_eq!(list.len(), 3);
        assert_eq!(ids_in_order(&list), vec![2, 1, 4]);
        assert!(list.locate(SortKey::new(150, 3)).is_none());
    }

    #[test]
    fn remove_absent_returns_false() {
        let mut list = list_with(&[(100, 1)]);
        assert!(!list.remove(SortKey::new(100, 2)));
        assert!(!RankedSkipList::with_seed(7).remove(SortKey::new(1, 1)));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn tail_tracks_last_node() {
        let mut list = list_with(&[(300, 1), (200, 2), (100, 3)]);
        assert_eq!(list.nodes[list.tail.unwrap()].key.customer_id, 3);

        assert!(list.remove(SortKey::new(100, 3)));
        assert_eq!(list.nodes[list.tail.unwrap()].key.customer_id, 2);

        assert!(list.remove(SortKey::new(200, 2)));
        assert!(list.remove(SortKey::new(300, 1)));
        assert!(list.tail.is_none());
        assert!(list.is_empty());
    }

    #[test]
    fn get_by_rank_rejects_out_of_range() {
        let list = list_with(&[(100, 1), (200, 2)]);
        assert!(matches!(
            list.get_by_rank(0),
            Err(ServiceError::RankOutOfRange { rank: 0, count: 2 })
        ));
        assert!(list.get_by_rank(3).is_err());
        assert!(RankedSkipList::with_seed(7).get_by_rank(1).is_err());
    }

    #[test]
    fn get_by_rank_agrees_from_both_ends() {
        // Odd length exercises both the forward and the backward walk.
        let entries: Vec<(i64, i64)> = (1..=9).map(|id| (id * 10, id)).collect();
        let list = list_with(&entries);
        let in_order = list.range_by_rank(1, 9);
        for rank in 1..=9i64 {
            assert_eq!(list.get_by_rank(rank).unwrap(), in_order[(rank - 1) as usize]);
        }
    }

    #[test]
    fn range_by_rank_bounds() {
        let list = list_with(&[(100, 1), (200, 2), (150, 3)]);
        assert_eq!(list.range_by_rank(1, 3).len(), 3);
        assert_eq!(
            list.range_by_rank(2, 2),
            vec![SortKey::new(150, 3)]
        );
        assert!(list.range_by_rank(0, 2).is_empty());
        assert!(list.range_by_rank(1, 4).is_empty());
        assert!(list.range_by_rank(3, 2).is_empty());
    }

    #[test]
    fn locate_reports_rank_and_misses() {
        let list = list_with(&[(100, 1), (200, 2), (150, 3)]);
        let node = list.locate(SortKey::new(150, 3)).unwrap();
        assert_eq!(node.rank(), 2);
        assert_eq!(node.key().customer_id, 3);

        // Same customer under a stale score is not a match.
        assert!(list.locate(SortKey::new(140, 3)).is_none());
        assert!(list.locate(SortKey::new(999, 9)).is_none());
    }

    #[test]
    fn neighbors_walk_both_directions_nearest_first() {
        let list = list_with(&[(100, 1), (200, 2), (150, 3), (50, 4)]);
        let node = list.locate(SortKey::new(150, 3)).unwrap();

        let above: Vec<i64> = node.predecessors().map(|k| k.customer_id).collect();
        let below: Vec<i64> = node.successors().map(|k| k.customer_id).collect();
        assert_eq!(above, vec![2]);
        assert_eq!(below, vec![1, 4]);
    }

    #[test]
    fn backward_links_mirror_forward_links() {
        let mut list = list_with(&[(10, 1), (90, 2), (40, 3), (70, 4), (20, 5), (60, 6)]);
        assert!(list.remove(SortKey::new(40, 3)));
        assert!(list.insert(SortKey::new(55, 7)));

        let forward: Vec<i64> = ids_in_order(&list);
        let mut backward: Vec<i64> = Vec::new();
        let mut cursor = list.tail;
        while let Some(idx) = cursor {
            backward.push(list.nodes[idx].key.customer_id);
            cursor = list.nodes[idx].backward[0];
        }
        backward.reverse();
        assert_eq!(forward, backward);
    }

    #[test]
    fn removed_slots_are_recycled() {
        let mut list = list_with(&[(100, 1), (200, 2), (150, 3)]);
        let arena_size = list.nodes.len();

        assert!(list.remove(SortKey::new(200, 2)));
        assert!(list.insert(SortKey::new(120, 9)));
        assert_eq!(list.nodes.len(), arena_size);
    }

    #[test]
    fn level_assignment_stays_within_cap() {
        let mut list = RankedSkipList::with_seed(1);
        for _ in 0..10_000 {
            let level = list.random_level();
            assert!((1..=MAX_LEVEL).contains(&level));
        }
    }
}
