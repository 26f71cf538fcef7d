//! Topic graph channels: `graph:get-nodes`, `graph:get-edges`

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use corpus_core::Storage;

use super::{blocking, parse_optional_args, to_json, HandlerResult};

pub fn schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "pillarId": {
                "type": "string",
                "description": "Restrict to one pillar (default: whole graph)"
            }
        }
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphArgs {
    pillar_id: Option<String>,
}

pub async fn nodes(storage: &Arc<Storage>, args: Option<Value>) -> HandlerResult {
    let args: GraphArgs = parse_optional_args(args)?;
    let nodes = blocking(storage, move |s| s.get_graph_nodes(args.pillar_id.as_deref())).await?;
    to_json(&nodes)
}

pub async fn edges(storage: &Arc<Storage>, args: Option<Value>) -> HandlerResult {
    let args: GraphArgs = parse_optional_args(args)?;
    let edges = blocking(storage, move |s| s.get_graph_edges(args.pillar_id.as_deref())).await?;
    to_json(&edges)
}
