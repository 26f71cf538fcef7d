//! stdio Transport
//!
//! Handles JSON-RPC communication over stdin/stdout, one message per line.

use std::io::{self, BufRead, BufReader, Write};
use tracing::{debug, error, warn};

use super::types::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION};
use crate::server::ChannelServer;

/// Sent when a response cannot be serialized, so the client never hangs
const FALLBACK_RESPONSE: &str =
    r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal error"}}"#;

/// stdio Transport for the channel server
pub struct StdioTransport;

impl StdioTransport {
    pub fn new() -> Self {
        Self
    }

    /// Run the channel server over the process stdio until stdin closes
    pub async fn run(self, server: ChannelServer) -> Result<(), io::Error> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.serve(&server, BufReader::new(stdin.lock()), stdout.lock())
            .await
    }

    /// Serve requests read from `reader`, writing responses to `writer`
    pub async fn serve<R, W>(&self, server: &ChannelServer, reader: R, mut writer: W) -> Result<(), io::Error>
    where
        R: BufRead,
        W: Write,
    {
        for line in reader.lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    error!("Failed to read line: {}", e);
                    break;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            debug!("Received: {} bytes", line.len());

            let request: JsonRpcRequest = match serde_json::from_str(&line) {
                Ok(r) => r,
                Err(e) => {
                    warn!("Failed to parse request: {}", e);
                    let response = JsonRpcResponse::error(None, JsonRpcError::parse_error());
                    write_response(&mut writer, &response)?;
                    continue;
                }
            };

            if request.jsonrpc != JSONRPC_VERSION {
                let response = JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_request("jsonrpc must be \"2.0\""),
                );
                write_response(&mut writer, &response)?;
                continue;
            }

            if let Some(response) = server.handle_request(request).await {
                write_response(&mut writer, &response)?;
            }
        }

        Ok(())
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn write_response<W: Write>(writer: &mut W, response: &JsonRpcResponse) -> Result<(), io::Error> {
    match serde_json::to_string(response) {
        Ok(json) => {
            debug!("Sending: {} bytes", json.len());
            writeln!(writer, "{}", json)?;
            writer.flush()
        }
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            let _ = writeln!(writer, "{}", FALLBACK_RESPONSE);
            let _ = writer.flush();
            Ok(())
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use corpus_core::Storage;
    use serde_json::Value;
    use std::io::Cursor;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn serve_lines(input: &str) -> (Vec<Value>, TempDir) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(Some(dir.path().join("stdio.db"))).unwrap();
        let server = ChannelServer::new(Arc::new(storage));

        let mut output = Vec::new();
        StdioTransport::new()
            .serve(&server, Cursor::new(input.as_bytes()), &mut output)
            .await
            .unwrap();

        let responses = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (responses, dir)
    }

    #[tokio::test]
    async fn test_one_response_per_request_line() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#, "\n",
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"cards:count"}"#, "\n",
        );
        let (responses, _dir) = serve_lines(input).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(responses[1]["result"]["count"], 0);
    }

    #[tokio::test]
    async fn test_garbage_line_gets_parse_error() {
        let input = "not json\n{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"ping\"}\n";
        let (responses, _dir) = serve_lines(input).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[1]["id"], 3);
    }

    #[tokio::test]
    async fn test_notifications_are_silent() {
        let input = "{\"jsonrpc\":\"2.0\",\"method\":\"ping\"}\n";
        let (responses, _dir) = serve_lines(input).await;
        assert!(responses.is_empty());
    }

    #[tokio::test]
    async fn test_null_id_still_gets_a_response() {
        let input = "{\"jsonrpc\":\"2.0\",\"id\":null,\"method\":\"cards:count\"}\n";
        let (responses, _dir) = serve_lines(input).await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[0]["result"]["count"], 0);
    }

    #[tokio::test]
    async fn test_wrong_version_is_invalid_request() {
        let input = "{\"jsonrpc\":\"1.0\",\"id\":4,\"method\":\"ping\"}\n";
        let (responses, _dir) = serve_lines(input).await;
        assert_eq!(responses[0]["error"]["code"], -32600);
        assert_eq!(responses[0]["id"], 4);
    }
}
