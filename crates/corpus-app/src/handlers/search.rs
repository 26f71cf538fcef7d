//! Search channel: `search:query`

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use corpus_core::{Storage, DEFAULT_SEARCH_LIMIT};

use super::{blocking, parse_args, to_json, HandlerResult};

pub fn schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "Free text; every word must match"
            },
            "limit": {
                "type": "integer",
                "description": "Maximum number of results (default: 20)",
                "default": DEFAULT_SEARCH_LIMIT,
                "minimum": 1,
                "maximum": 100
            }
        },
        "required": ["query"]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchArgs {
    query: String,
    limit: Option<i64>,
}

/// Returns `{ query, total, results }`
pub async fn query(storage: &Arc<Storage>, args: Option<Value>) -> HandlerResult {
    let args: SearchArgs = parse_args(args)?;
    let limit = args.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).clamp(1, 100);
    let text = args.query.clone();
    let hits = blocking(storage, move |s| s.search(&text, limit)).await?;

    Ok(serde_json::json!({
        "query": args.query,
        "total": hits.len(),
        "results": to_json(&hits)?,
    }))
}
