//! Channel Handlers
//!
//! One module per channel family. Every handler takes the shared storage and
//! the raw JSON arguments and returns a JSON value. Storage calls are
//! synchronous SQLite work, so they run on the blocking thread pool.

pub mod cards;
pub mod dashboard;
pub mod graph;
pub mod navigation;
pub mod review;
pub mod search;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use corpus_core::{Storage, StorageError};

// ============================================================================
// ERRORS
// ============================================================================

/// Failure of a single channel call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    /// Arguments missing, malformed or rejected by validation
    #[error("{0}")]
    InvalidParams(String),
    /// Referenced card or topic does not exist
    #[error("{0}")]
    NotFound(String),
    /// Storage or runtime failure
    #[error("{0}")]
    Failed(String),
}

impl From<StorageError> for HandlerError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(_) => HandlerError::NotFound(e.to_string()),
            StorageError::InvalidInput(_) => HandlerError::InvalidParams(e.to_string()),
            other => HandlerError::Failed(other.to_string()),
        }
    }
}

pub type HandlerResult = Result<Value, HandlerError>;

// ============================================================================
// HELPERS
// ============================================================================

/// Deserialize required arguments
pub(crate) fn parse_args<T: DeserializeOwned>(args: Option<Value>) -> Result<T, HandlerError> {
    match args {
        Some(v) => serde_json::from_value(v)
            .map_err(|e| HandlerError::InvalidParams(format!("Invalid arguments: {}", e))),
        None => Err(HandlerError::InvalidParams("Missing arguments".to_string())),
    }
}

/// Deserialize arguments that may be omitted entirely
pub(crate) fn parse_optional_args<T: DeserializeOwned + Default>(args: Option<Value>) -> Result<T, HandlerError> {
    match args {
        None | Some(Value::Null) => Ok(T::default()),
        Some(v) => serde_json::from_value(v)
            .map_err(|e| HandlerError::InvalidParams(format!("Invalid arguments: {}", e))),
    }
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> HandlerResult {
    serde_json::to_value(value).map_err(|e| HandlerError::Failed(format!("Serialization failed: {}", e)))
}

/// Run a storage call on the blocking pool.
///
/// The closure always runs to completion once started, even if the awaiting
/// request is dropped on timeout, so a transaction is never cut short.
pub(crate) async fn blocking<T, F>(storage: &Arc<Storage>, f: F) -> Result<T, HandlerError>
where
    T: Send + 'static,
    F: FnOnce(&Storage) -> corpus_core::Result<T> + Send + 'static,
{
    let storage = Arc::clone(storage);
    tokio::task::spawn_blocking(move || f(&storage))
        .await
        .map_err(|e| HandlerError::Failed(format!("Storage task failed: {}", e)))?
        .map_err(HandlerError::from)
}

// ============================================================================
// TEST SUPPORT
// ============================================================================
