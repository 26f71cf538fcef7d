//! Taxonomy navigation channels
//!
//! `pillars:get-all`, `domains:get-all`, `domains:get-by-pillar`,
//! `topics:get-all`, `topics:get-by-domain`, `topics:get`.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use corpus_core::Storage;

use super::{blocking, parse_args, to_json, HandlerResult};

pub fn no_args_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

pub fn pillar_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "pillarId": { "type": "string" }
        },
        "required": ["pillarId"]
    })
}

pub fn domain_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "domainId": { "type": "string" }
        },
        "required": ["domainId"]
    })
}

pub fn topic_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "id": { "type": "string" }
        },
        "required": ["id"]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PillarArgs {
    pillar_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DomainArgs {
    domain_id: String,
}

#[derive(Debug, Deserialize)]
struct TopicArgs {
    id: String,
}

pub async fn pillars(storage: &Arc<Storage>) -> HandlerResult {
    let pillars = blocking(storage, |s| s.get_pillars()).await?;
    to_json(&pillars)
}

pub async fn domains(storage: &Arc<Storage>) -> HandlerResult {
    let domains = blocking(storage, |s| s.get_domains(None)).await?;
    to_json(&domains)
}

pub async fn domains_by_pillar(storage: &Arc<Storage>, args: Option<Value>) -> HandlerResult {
    let args: PillarArgs = parse_args(args)?;
    let domains = blocking(storage, move |s| s.get_domains(Some(&args.pillar_id))).await?;
    to_json(&domains)
}

pub async fn topics(storage: &Arc<Storage>) -> HandlerResult {
    let topics = blocking(storage, |s| s.get_topics(None)).await?;
    to_json(&topics)
}

pub async fn topics_by_domain(storage: &Arc<Storage>, args: Option<Value>) -> HandlerResult {
    let args: DomainArgs = parse_args(args)?;
    let topics = blocking(storage, move |s| s.get_topics(Some(&args.domain_id))).await?;
    to_json(&topics)
}

/// Single topic, or `null`
pub async fn topic(storage: &Arc<Storage>, args: Option<Value>) -> HandlerResult {
    let args: TopicArgs = parse_args(args)?;
    let topic = blocking(storage, move |s| s.get_topic(&args.id)).await?;
    to_json(&topic)
}
