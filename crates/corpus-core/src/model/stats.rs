//! Statistics types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Counters for one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: NaiveDate,
    pub cards_reviewed: i64,
    /// Reviews of cards that were New before the review
    pub cards_new: i64,
    pub time_spent_ms: i64,
    /// Reserved, not populated by review processing
    pub domains_touched: Vec<String>,
}

impl DailyStats {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            cards_reviewed: 0,
            cards_new: 0,
            time_spent_ms: 0,
            domains_touched: Vec::new(),
        }
    }
}

/// Card totals for one pillar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PillarProgress {
    pub pillar_id: String,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub total: i64,
    /// Cards currently in Review state
    pub mastered: i64,
}

/// Home screen aggregates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub due_today: i64,
    pub new_available: i64,
    pub reviewed_today: i64,
    pub streak: i64,
    pub pillar_progress: Vec<PillarProgress>,
    pub recent_activity: Vec<DailyStats>,
}
