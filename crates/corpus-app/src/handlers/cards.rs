//! Card channels
//!
//! `cards:get-due`, `cards:get-by-topic`, `cards:create`, `cards:update`,
//! `cards:delete`, `cards:count`.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use corpus_core::{CardType, CardUpdate, NewCard, Storage, DEFAULT_DUE_LIMIT};

use super::{blocking, parse_args, parse_optional_args, to_json, HandlerResult};

// ============================================================================
// SCHEMAS
// ============================================================================

pub fn get_due_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "limit": {
                "type": "integer",
                "description": "Maximum number of cards (default: 50)",
                "default": DEFAULT_DUE_LIMIT
            }
        }
    })
}

pub fn get_by_topic_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "topicId": { "type": "string", "description": "Topic id, e.g. 'technical-mastery/python/decorators'" }
        },
        "required": ["topicId"]
    })
}

pub fn create_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "topicId": { "type": "string" },
            "front": { "type": "string", "description": "Question side" },
            "back": { "type": "string", "description": "Answer side" },
            "cardType": { "type": "string", "enum": ["basic", "cloze"], "default": "basic" },
            "imageUrl": { "type": "string" }
        },
        "required": ["topicId", "front", "back"]
    })
}

pub fn update_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "id": { "type": "integer" },
            "front": { "type": "string" },
            "back": { "type": "string" },
            "topicId": { "type": "string" }
        },
        "required": ["id"]
    })
}

pub fn delete_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "id": { "type": "integer" }
        },
        "required": ["id"]
    })
}

pub fn count_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

// ============================================================================
// ARGUMENTS
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LimitArgs {
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopicArgs {
    topic_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateArgs {
    topic_id: String,
    front: String,
    back: String,
    #[serde(default)]
    card_type: CardType,
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateArgs {
    id: i64,
    front: Option<String>,
    back: Option<String>,
    topic_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdArgs {
    id: i64,
}

// ============================================================================
// HANDLERS
// ============================================================================

pub async fn get_due(storage: &Arc<Storage>, args: Option<Value>) -> HandlerResult {
    let args: LimitArgs = parse_optional_args(args)?;
    let limit = args.limit.unwrap_or(DEFAULT_DUE_LIMIT);
    let cards = blocking(storage, move |s| s.get_due_cards(limit)).await?;
    to_json(&cards)
}

pub async fn get_by_topic(storage: &Arc<Storage>, args: Option<Value>) -> HandlerResult {
    let args: TopicArgs = parse_args(args)?;
    let cards = blocking(storage, move |s| s.get_cards_by_topic(&args.topic_id)).await?;
    to_json(&cards)
}

pub async fn create(storage: &Arc<Storage>, args: Option<Value>) -> HandlerResult {
    let args: CreateArgs = parse_args(args)?;
    let input = NewCard {
        topic_id: args.topic_id,
        front: args.front,
        back: args.back,
        card_type: args.card_type,
        image_url: args.image_url,
    };
    let card = blocking(storage, move |s| s.create_card(input)).await?;

    Ok(serde_json::json!({
        "id": card.id,
        "card": to_json(&card)?,
    }))
}

pub async fn update(storage: &Arc<Storage>, args: Option<Value>) -> HandlerResult {
    let args: UpdateArgs = parse_args(args)?;
    let id = args.id;
    let update = CardUpdate {
        front: args.front,
        back: args.back,
        topic_id: args.topic_id,
    };
    let success = blocking(storage, move |s| s.update_card(id, update)).await?;
    Ok(serde_json::json!({ "success": success }))
}

pub async fn delete(storage: &Arc<Storage>, args: Option<Value>) -> HandlerResult {
    let args: IdArgs = parse_args(args)?;
    let success = blocking(storage, move |s| s.delete_card(args.id)).await?;
    Ok(serde_json::json!({ "success": success }))
}

pub async fn count(storage: &Arc<Storage>) -> HandlerResult {
    let count = blocking(storage, |s| s.count_cards()).await?;
    Ok(serde_json::json!({ "count": count }))
}

// ============================================================================
// TESTS
// ============================================================================
