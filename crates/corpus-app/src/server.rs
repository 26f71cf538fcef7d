//! Channel Server Core
//!
//! Routes JSON-RPC methods to the named channel handlers. Each channel call
//! is awaited under a per-request timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::handlers::{self, HandlerError};
use crate::protocol::types::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use corpus_core::Storage;

/// Default time a caller waits for one channel call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// CHANNEL REGISTRY
// ============================================================================

struct Channel {
    name: &'static str,
    description: &'static str,
    schema: fn() -> Value,
}

const CHANNELS: &[Channel] = &[
    // Cards
    Channel { name: "cards:get-due", description: "Cards eligible for review now: due cards by due date, then new cards", schema: handlers::cards::get_due_schema },
    Channel { name: "cards:get-by-topic", description: "All cards of a topic in creation order", schema: handlers::cards::get_by_topic_schema },
    Channel { name: "cards:create", description: "Create a new card and index it for search", schema: handlers::cards::create_schema },
    Channel { name: "cards:update", description: "Edit card text or move it to another topic", schema: handlers::cards::update_schema },
    Channel { name: "cards:delete", description: "Delete a card with its review history", schema: handlers::cards::delete_schema },
    Channel { name: "cards:count", description: "Total number of cards", schema: handlers::cards::count_schema },
    // Review
    Channel { name: "review:get-session", description: "Due set capped by today's review and new-card budget", schema: handlers::review::get_session_schema },
    Channel { name: "review:process-rating", description: "Apply a rating (1-4) to a card", schema: handlers::review::process_rating_schema },
    Channel { name: "review:undo", description: "Revert the most recent review of a card", schema: handlers::review::card_id_schema },
    Channel { name: "review:preview", description: "Outcome of each rating without applying it", schema: handlers::review::card_id_schema },
    // Navigation
    Channel { name: "pillars:get-all", description: "All pillars in display order", schema: handlers::navigation::no_args_schema },
    Channel { name: "domains:get-all", description: "All domains by tier", schema: handlers::navigation::no_args_schema },
    Channel { name: "domains:get-by-pillar", description: "Domains of one pillar by tier", schema: handlers::navigation::pillar_schema },
    Channel { name: "topics:get-all", description: "All topics", schema: handlers::navigation::no_args_schema },
    Channel { name: "topics:get-by-domain", description: "Topics of one domain", schema: handlers::navigation::domain_schema },
    Channel { name: "topics:get", description: "One topic by id, or null", schema: handlers::navigation::topic_schema },
    // Graph and search
    Channel { name: "graph:get-nodes", description: "Topic nodes with card and mastered counts", schema: handlers::graph::schema },
    Channel { name: "graph:get-edges", description: "Links between topics", schema: handlers::graph::schema },
    Channel { name: "search:query", description: "Ranked full-text search with highlighted snippets", schema: handlers::search::schema },
    // Dashboard
    Channel { name: "dashboard:get-data", description: "Due, new, reviewed today, streak, pillar progress and recent activity", schema: handlers::dashboard::no_args_schema },
    Channel { name: "dashboard:get-streak", description: "Consecutive days with reviews ending today", schema: handlers::dashboard::no_args_schema },
    Channel { name: "stats:get-daily", description: "Counters for one date", schema: handlers::dashboard::daily_schema },
    Channel { name: "stats:get-range", description: "Daily counters between two dates inclusive", schema: handlers::dashboard::range_schema },
];

/// Entry of a `channels/list` response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelDescription {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Every channel the server answers, in registry order
pub fn channel_descriptions() -> Vec<ChannelDescription> {
    CHANNELS
        .iter()
        .map(|c| ChannelDescription {
            name: c.name.to_string(),
            description: c.description.to_string(),
            input_schema: (c.schema)(),
        })
        .collect()
}

// ============================================================================
// SERVER
// ============================================================================

/// Channel server over a shared storage handle
pub struct ChannelServer {
    storage: Arc<Storage>,
    timeout: Duration,
}

impl ChannelServer {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    /// Handle an incoming JSON-RPC request. Notifications get no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!("Handling request: {}", request.method);

        let result = match request.method.as_str() {
            "ping" => Ok(serde_json::json!({})),
            "channels/list" => Ok(serde_json::json!({ "channels": channel_descriptions() })),
            method => {
                let call = self.call_channel(method, request.params);
                with_timeout(method, self.timeout, call).await
            }
        };

        if request.id.is_none() {
            return None;
        }

        Some(match result {
            Ok(result) => JsonRpcResponse::success(request.id, result),
            Err(error) => JsonRpcResponse::error(request.id, error),
        })
    }

    async fn call_channel(&self, method: &str, args: Option<Value>) -> Result<Value, JsonRpcError> {
        let storage = &self.storage;
        let result = match method {
            // ================================================================
            // CARDS
            // ================================================================
            "cards:get-due" => handlers::cards::get_due(storage, args).await,
            "cards:get-by-topic" => handlers::cards::get_by_topic(storage, args).await,
            "cards:create" => handlers::cards::create(storage, args).await,
            "cards:update" => handlers::cards::update(storage, args).await,
            "cards:delete" => handlers::cards::delete(storage, args).await,
            "cards:count" => handlers::cards::count(storage).await,

            // ================================================================
            // REVIEW
            // ================================================================
            "review:get-session" => handlers::review::get_session(storage, args).await,
            "review:process-rating" => handlers::review::process_rating(storage, args).await,
            "review:undo" => handlers::review::undo(storage, args).await,
            "review:preview" => handlers::review::preview(storage, args).await,

            // ================================================================
            // NAVIGATION
            // ================================================================
            "pillars:get-all" => handlers::navigation::pillars(storage).await,
            "domains:get-all" => handlers::navigation::domains(storage).await,
            "domains:get-by-pillar" => handlers::navigation::domains_by_pillar(storage, args).await,
            "topics:get-all" => handlers::navigation::topics(storage).await,
            "topics:get-by-domain" => handlers::navigation::topics_by_domain(storage, args).await,
            "topics:get" => handlers::navigation::topic(storage, args).await,

            // ================================================================
            // GRAPH / SEARCH
            // ================================================================
            "graph:get-nodes" => handlers::graph::nodes(storage, args).await,
            "graph:get-edges" => handlers::graph::edges(storage, args).await,
            "search:query" => handlers::search::query(storage, args).await,

            // ================================================================
            // DASHBOARD / STATS
            // ================================================================
            "dashboard:get-data" => handlers::dashboard::data(storage).await,
            "dashboard:get-streak" => handlers::dashboard::streak(storage).await,
            "stats:get-daily" => handlers::dashboard::daily(storage, args).await,
            "stats:get-range" => handlers::dashboard::range(storage, args).await,

            name => {
                warn!("Unknown channel: {}", name);
                return Err(JsonRpcError::method_not_found(name));
            }
        };

        result.map_err(|e| to_rpc_error(method, e))
    }
}

/// Await a channel call, giving up after `timeout`.
///
/// Giving up only stops waiting: storage work already handed to the
/// blocking pool finishes and commits on its own.
async fn with_timeout<F>(method: &str, timeout: Duration, call: F) -> Result<Value, JsonRpcError>
where
    F: Future<Output = Result<Value, JsonRpcError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(method, timeout_ms = timeout.as_millis() as u64, "Channel call timed out");
            Err(JsonRpcError::request_timeout(method, timeout.as_millis()))
        }
    }
}

fn to_rpc_error(method: &str, error: HandlerError) -> JsonRpcError {
    match error {
        HandlerError::InvalidParams(message) => JsonRpcError::invalid_params(&message),
        HandlerError::NotFound(message) => JsonRpcError::not_found(&message),
        HandlerError::Failed(message) => {
            warn!(method, "Channel call failed: {}", message);
            JsonRpcError::internal_error(&message)
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
