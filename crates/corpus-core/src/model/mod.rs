//! Model module - Core types and data structures
//!
//! - Cards with content and FSRS memory state
//! - Review log entries carrying the pre-review snapshot used by undo
//! - Daily statistics and dashboard aggregates
//! - Pillar / domain / topic taxonomy and the topic graph

mod card;
mod review;
mod stats;
mod taxonomy;

pub use card::{Card, CardType, CardUpdate, NewCard};
pub use review::{ReviewLogEntry, ReviewOutcome};
pub use stats::{DailyStats, DashboardData, PillarProgress};
pub use taxonomy::{Domain, GraphEdge, GraphNode, Link, Pillar, Topic};

use serde::{Deserialize, Serialize};

/// Entity kind stored in the full-text index for cards
pub const CARD_ENTITY: &str = "card";

/// A ranked full-text match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub entity_id: String,
    pub entity_type: String,
    pub title: String,
    /// Content excerpt with matches wrapped in `<mark>` tags
    pub snippet: String,
    /// FTS5 rank, lower is better
    pub rank: f64,
}
