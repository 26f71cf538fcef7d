//! Review history types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Card;
use crate::fsrs::{CardState, MemoryState, Rating};

/// One applied rating. Created with the card update, deleted by undo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLogEntry {
    pub id: i64,
    pub card_id: i64,
    pub rating: Rating,
    pub review_at: DateTime<Utc>,
    pub elapsed_days: f64,
    pub scheduled_days: f64,
    /// Card state immediately before this review
    pub state: CardState,
    pub duration_ms: i64,
    /// Full pre-review memory state; absent on rows written before snapshots existed
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub previous: Option<MemoryState>,
}

impl ReviewLogEntry {
    /// Whether this review moved a Review card into Relearning
    pub fn caused_lapse(&self) -> bool {
        self.state == CardState::Review && self.rating == Rating::Again
    }
}

/// Result of a committed review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub card: Card,
    pub log: ReviewLogEntry,
}
