//! Full-text search over the FTS5 `search_index` table
//!
//! Card content writers keep one document per card (title = front,
//! content = back) in sync through `index_card` / `unindex_card`, always
//! inside the caller's transaction.

use rusqlite::{params, Connection};

use super::sqlite::{Result, Storage};
use crate::model::{SearchHit, CARD_ENTITY};

/// Result count when the caller does not pass one
pub const DEFAULT_SEARCH_LIMIT: i64 = 20;

/// Sanitize user input for FTS5 MATCH.
///
/// Every whitespace-separated token becomes a quoted phrase, so operators and
/// syntax characters (`"`, `*`, `:`, `(`, `NEAR`, `AND`...) are matched
/// literally instead of raising a query error. Tokens are implicitly ANDed.
pub fn sanitize_fts5_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|token| format!("\"{}\"", token.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(super) fn index_card(conn: &Connection, card_id: i64, front: &str, back: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO search_index (entity_id, entity_type, title, content) VALUES (?1, ?2, ?3, ?4)",
        params![card_id.to_string(), CARD_ENTITY, front, back],
    )?;
    Ok(())
}

pub(super) fn unindex_card(conn: &Connection, card_id: i64) -> Result<()> {
    conn.execute(
        "DELETE FROM search_index WHERE entity_id = ?1 AND entity_type = ?2",
        params![card_id.to_string(), CARD_ENTITY],
    )?;
    Ok(())
}

impl Storage {
    /// Ranked matches, best first. A blank query returns nothing.
    pub fn search(&self, query: &str, limit: i64) -> Result<Vec<SearchHit>> {
        let sanitized = sanitize_fts5_query(query);
        if sanitized.is_empty() || limit <= 0 {
            return Ok(Vec::new());
        }

        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare_cached(
            "SELECT
                entity_id,
                entity_type,
                title,
                snippet(search_index, 3, '<mark>', '</mark>', '...', 32) AS snippet,
                rank
             FROM search_index
             WHERE search_index MATCH ?1
             ORDER BY rank
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![sanitized, limit], |row| {
            Ok(SearchHit {
                entity_id: row.get("entity_id")?,
                entity_type: row.get("entity_type")?,
                title: row.get::<_, Option<String>>("title")?.unwrap_or_default(),
                snippet: row.get::<_, Option<String>>("snippet")?.unwrap_or_default(),
                rank: row.get("rank")?,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }
}
