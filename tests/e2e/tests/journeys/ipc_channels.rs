//! Journey: the renderer talking to the channel server
//!
//! Requests go through the same JSON-RPC path the desktop shell uses,
//! either one at a time or as a newline-delimited stdio script.

use std::io::Cursor;

use corpus_app::protocol::stdio::StdioTransport;
use corpus_app::protocol::types::{JsonRpcRequest, JsonRpcResponse};
use corpus_app::ChannelServer;
use corpus_e2e_tests::mocks::TEST_TOPIC;
use corpus_e2e_tests::TestDatabaseManager;
use serde_json::{json, Value};

async fn call(server: &ChannelServer, method: &str, params: Value) -> Value {
    let request = JsonRpcRequest::new(json!(1), method, Some(params));
    let response = server.handle_request(request).await.unwrap();
    assert!(response.error.is_none(), "{} failed: {:?}", method, response.error);
    response.result.unwrap()
}

async fn call_err(server: &ChannelServer, method: &str, params: Value) -> i32 {
    let request = JsonRpcRequest::new(json!(1), method, Some(params));
    let response = server.handle_request(request).await.unwrap();
    response.error.unwrap().code
}

async fn run_script(server: &ChannelServer, lines: &[Value]) -> Vec<JsonRpcResponse> {
    let input: String = lines.iter().map(|l| format!("{}\n", l)).collect();
    let mut output = Vec::new();
    StdioTransport::new()
        .serve(server, Cursor::new(input), &mut output)
        .await
        .unwrap();

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_author_review_undo_over_channels() {
    let db = TestDatabaseManager::new_temp();
    let server = ChannelServer::new(db.storage.clone());

    let created = call(
        &server,
        "cards:create",
        json!({"topicId": TEST_TOPIC, "front": "Capital of Peru?", "back": "Lima"}),
    )
    .await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["card"]["state"], 0);

    let session = call(&server, "review:get-session", json!({})).await;
    assert_eq!(session.as_array().unwrap().len(), 1);

    let preview = call(&server, "review:preview", json!({"cardId": id})).await;
    for key in ["again", "hard", "good", "easy"] {
        assert!(preview[key]["due"].is_string(), "{} has no due", key);
    }

    let outcome = call(
        &server,
        "review:process-rating",
        json!({"cardId": id, "rating": 3, "durationMs": 2500}),
    )
    .await;
    assert_eq!(outcome["card"]["reps"], 1);
    assert_eq!(outcome["log"]["rating"], 3);
    assert_eq!(outcome["card"]["due"], preview["good"]["due"]);

    let dashboard = call(&server, "dashboard:get-data", json!(null)).await;
    assert_eq!(dashboard["reviewedToday"], 1);
    assert_eq!(call(&server, "dashboard:get-streak", json!(null)).await["streak"], 1);

    let restored = call(&server, "review:undo", json!({"cardId": id})).await;
    assert_eq!(restored["state"], 0);
    assert_eq!(restored["reps"], 0);
    assert_eq!(call(&server, "review:undo", json!({"cardId": id})).await, Value::Null);

    let today = db.storage.today().to_string();
    let daily = call(&server, "stats:get-daily", json!({"date": today})).await;
    assert_eq!(daily["cardsReviewed"], 0);
}

#[tokio::test]
async fn test_channel_errors_are_typed() {
    let db = TestDatabaseManager::new_temp();
    let server = ChannelServer::new(db.storage.clone());

    assert_eq!(call_err(&server, "cards:teleport", json!({})).await, -32601);
    assert_eq!(call_err(&server, "cards:create", json!({"front": "no topic"})).await, -32602);
    assert_eq!(
        call_err(&server, "review:process-rating", json!({"cardId": 1, "rating": 7})).await,
        -32602
    );
    assert_eq!(
        call_err(&server, "review:process-rating", json!({"cardId": 404, "rating": 3})).await,
        -32002
    );
    assert_eq!(call(&server, "topics:get", json!({"id": "missing/topic"})).await, Value::Null);
    assert_eq!(db.storage.count_cards().unwrap(), 0);
}

#[tokio::test]
async fn test_navigation_and_search_on_seeded_data() {
    let db = TestDatabaseManager::new_seeded();
    let server = ChannelServer::new(db.storage.clone());

    let pillars = call(&server, "pillars:get-all", json!(null)).await;
    assert_eq!(pillars.as_array().unwrap().len(), 6);

    let domains = call(&server, "domains:get-by-pillar", json!({"pillarId": "ai-symbiosis"})).await;
    assert_eq!(domains.as_array().unwrap().len(), 3);

    let topics = call(
        &server,
        "topics:get-by-domain",
        json!({"domainId": "technical-mastery/python"}),
    )
    .await;
    assert_eq!(topics.as_array().unwrap().len(), 2);

    let cards = call(
        &server,
        "cards:get-by-topic",
        json!({"topicId": "technical-mastery/python/decorators"}),
    )
    .await;
    assert_eq!(cards.as_array().unwrap().len(), 2);

    let found = call(&server, "search:query", json!({"query": "Ebbinghaus"})).await;
    assert_eq!(found["total"], 1);
    assert_eq!(found["results"][0]["title"], "What is the spacing effect?");

    let nodes = call(&server, "graph:get-nodes", json!({"pillarId": "technical-mastery"})).await;
    assert!(!nodes.as_array().unwrap().is_empty());
    let edges = call(&server, "graph:get-edges", json!({})).await;
    assert!(edges.is_array());
}

#[tokio::test]
async fn test_stdio_script() {
    let db = TestDatabaseManager::new_temp();
    let server = ChannelServer::new(db.storage.clone());

    let responses = run_script(
        &server,
        &[
            json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "cards:create",
                   "params": {"topicId": TEST_TOPIC, "front": "2 + 2?", "back": "4"}}),
            // Notification: executed, never answered
            json!({"jsonrpc": "2.0", "method": "review:process-rating",
                   "params": {"cardId": 1, "rating": 4}}),
            json!({"jsonrpc": "1.0", "id": 3, "method": "ping"}),
            json!({"jsonrpc": "2.0", "id": 4, "method": "cards:count"}),
            json!({"jsonrpc": "2.0", "id": "five", "method": "channels/list"}),
        ],
    )
    .await;

    assert_eq!(responses.len(), 5);
    assert_eq!(responses[0].id, Some(json!(1)));
    assert_eq!(responses[1].result.as_ref().unwrap()["id"], 1);
    assert_eq!(responses[2].error.as_ref().unwrap().code, -32600);
    assert_eq!(responses[3].result.as_ref().unwrap()["count"], 1);
    assert_eq!(responses[4].id, Some(json!("five")));
    let channels = responses[4].result.as_ref().unwrap()["channels"].as_array().unwrap().len();
    assert_eq!(channels, 23);

    // The notification's rating landed
    let card = db.storage.get_card(1).unwrap().unwrap();
    assert_eq!(card.memory.reps, 1);
}

#[tokio::test]
async fn test_stdio_survives_garbage_lines() {
    let db = TestDatabaseManager::new_temp();
    let server = ChannelServer::new(db.storage.clone());

    let input = "not json\n\n{\"jsonrpc\":\"2.0\",\"id\":9,\"method\":\"ping\"}\n";
    let mut output = Vec::new();
    StdioTransport::new()
        .serve(&server, Cursor::new(input), &mut output)
        .await
        .unwrap();

    let responses: Vec<JsonRpcResponse> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0].error.as_ref().unwrap().code, -32700);
    assert_eq!(responses[1].id, Some(json!(9)));
}
