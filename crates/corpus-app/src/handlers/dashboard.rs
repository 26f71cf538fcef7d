//! Dashboard and statistics channels
//!
//! `dashboard:get-data`, `dashboard:get-streak`, `stats:get-daily`,
//! `stats:get-range`.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use corpus_core::Storage;

use super::{blocking, parse_args, to_json, HandlerResult};

pub fn no_args_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

pub fn daily_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "date": { "type": "string", "format": "date", "description": "YYYY-MM-DD" }
        },
        "required": ["date"]
    })
}

pub fn range_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "start": { "type": "string", "format": "date" },
            "end": { "type": "string", "format": "date" }
        },
        "required": ["start", "end"]
    })
}

#[derive(Debug, Deserialize)]
struct DailyArgs {
    date: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct RangeArgs {
    start: NaiveDate,
    end: NaiveDate,
}

pub async fn data(storage: &Arc<Storage>) -> HandlerResult {
    let dashboard = blocking(storage, |s| s.get_dashboard_data()).await?;
    to_json(&dashboard)
}

pub async fn streak(storage: &Arc<Storage>) -> HandlerResult {
    let streak = blocking(storage, |s| s.calculate_streak()).await?;
    Ok(serde_json::json!({ "streak": streak }))
}

pub async fn daily(storage: &Arc<Storage>, args: Option<Value>) -> HandlerResult {
    let args: DailyArgs = parse_args(args)?;
    let stats = blocking(storage, move |s| s.get_daily_stats(args.date)).await?;
    to_json(&stats)
}

pub async fn range(storage: &Arc<Storage>, args: Option<Value>) -> HandlerResult {
    let args: RangeArgs = parse_args(args)?;
    let stats = blocking(storage, move |s| s.get_stats_range(args.start, args.end)).await?;
    to_json(&stats)
}
