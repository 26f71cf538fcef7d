//! Review channels
//!
//! `review:get-session`, `review:process-rating`, `review:undo`,
//! `review:preview`.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use corpus_core::{Rating, Storage, DEFAULT_DUE_LIMIT};

use super::{blocking, parse_args, parse_optional_args, to_json, HandlerResult};

pub fn get_session_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "limit": {
                "type": "integer",
                "description": "Maximum session size before daily budgets apply (default: 50)",
                "default": DEFAULT_DUE_LIMIT
            }
        }
    })
}

pub fn process_rating_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "cardId": { "type": "integer" },
            "rating": {
                "type": "integer",
                "description": "1=Again (forgot), 2=Hard, 3=Good, 4=Easy",
                "minimum": 1,
                "maximum": 4
            },
            "durationMs": {
                "type": "integer",
                "description": "Time spent answering in milliseconds",
                "minimum": 0,
                "default": 0
            }
        },
        "required": ["cardId", "rating"]
    })
}

pub fn card_id_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "cardId": { "type": "integer" }
        },
        "required": ["cardId"]
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionArgs {
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RatingArgs {
    card_id: i64,
    rating: Rating,
    #[serde(default)]
    duration_ms: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardIdArgs {
    card_id: i64,
}

pub async fn get_session(storage: &Arc<Storage>, args: Option<Value>) -> HandlerResult {
    let args: SessionArgs = parse_optional_args(args)?;
    let limit = args.limit.unwrap_or(DEFAULT_DUE_LIMIT);
    let cards = blocking(storage, move |s| s.get_review_session(limit)).await?;
    to_json(&cards)
}

/// Returns `{ card, log }` for the applied rating
pub async fn process_rating(storage: &Arc<Storage>, args: Option<Value>) -> HandlerResult {
    let args: RatingArgs = parse_args(args)?;
    let outcome = blocking(storage, move |s| {
        s.process_review(args.card_id, args.rating, args.duration_ms)
    })
    .await?;
    to_json(&outcome)
}

/// Restored card, or `null` when there was nothing to undo
pub async fn undo(storage: &Arc<Storage>, args: Option<Value>) -> HandlerResult {
    let args: CardIdArgs = parse_args(args)?;
    let card = blocking(storage, move |s| s.undo_review(args.card_id)).await?;
    to_json(&card)
}

pub async fn preview(storage: &Arc<Storage>, args: Option<Value>) -> HandlerResult {
    let args: CardIdArgs = parse_args(args)?;
    let preview = blocking(storage, move |s| s.preview_review(args.card_id)).await?;
    to_json(&preview)
}

// ============================================================================
// TESTS
// ============================================================================
