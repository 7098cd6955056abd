/// Domain models for the leaderboard service
use serde::Serialize;

/// A customer's accumulated score as stored in the index.
///
/// The identifier is fixed at creation; only the score mutates. An entry is
/// created on the first score update for a customer and is kept for the
/// process lifetime regardless of where the total ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankEntry {
    pub customer_id: i64,
    pub score: i64,
}

impl RankEntry {
    pub fn new(customer_id: i64, score: i64) -> Self {
        Self { customer_id, score }
    }
}

/// One row of a leaderboard response.
///
/// The rank is computed from the current list position at query time and is
/// only meaningful within the response that carries it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RankedCustomer {
    pub customer_id: i64,
    pub score: i64,
    pub rank: u64,
}
