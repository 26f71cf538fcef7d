//! Storage Module
//!
//! SQLite-based storage layer with:
//! - Atomic review and undo transactions over cards, review logs and daily stats
//! - Card content CRUD kept in sync with the FTS5 search index
//! - Taxonomy navigation and the topic graph
//! - Transactional schema migrations

mod migrations;
mod review;
mod search;
mod seed;
mod sqlite;
mod stats;
mod taxonomy;

pub use migrations::MIGRATIONS;
pub use review::{DEFAULT_DUE_LIMIT, MAX_REVIEW_DURATION_MS};
pub use search::{sanitize_fts5_query, DEFAULT_SEARCH_LIMIT};
pub use sqlite::{Result, Storage, StorageError, StorageOptions};
pub use stats::streak_from_dates;
pub use taxonomy::DEFAULT_RELATION;
