//! Database Migrations
//!
//! Schema migration definitions for the storage layer. Version 1 matches the
//! schema written by earlier releases, so existing databases upgrade in place.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: taxonomy, cards, review logs, daily stats, search index",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Pre-review memory snapshots on review logs for exact undo",
        up: MIGRATION_V2_UP,
    },
];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: Initial schema
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT
);

-- ============================================================================
-- TAXONOMY: pillar -> domain -> topic
-- ============================================================================

CREATE TABLE IF NOT EXISTS pillars (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    icon TEXT,
    color TEXT,
    sort_order INTEGER
);

CREATE TABLE IF NOT EXISTS domains (
    id TEXT PRIMARY KEY,
    pillar_id TEXT REFERENCES pillars(id),
    name TEXT NOT NULL,
    tier INTEGER DEFAULT 2,
    sort_order INTEGER
);

CREATE TABLE IF NOT EXISTS topics (
    id TEXT PRIMARY KEY,
    domain_id TEXT REFERENCES domains(id),
    name TEXT NOT NULL,
    content_path TEXT,
    sort_order INTEGER
);

-- ============================================================================
-- CARDS with FSRS memory state
-- ============================================================================

CREATE TABLE IF NOT EXISTS cards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    topic_id TEXT REFERENCES topics(id),
    front TEXT NOT NULL,
    back TEXT NOT NULL,
    card_type TEXT DEFAULT 'basic',
    image_url TEXT,
    created_at TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),

    stability REAL DEFAULT 0,
    difficulty REAL DEFAULT 0,
    due TEXT,
    last_review TEXT,
    reps INTEGER DEFAULT 0,
    lapses INTEGER DEFAULT 0,
    state INTEGER DEFAULT 0,
    elapsed_days REAL DEFAULT 0,
    scheduled_days REAL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_cards_topic ON cards(topic_id);
CREATE INDEX IF NOT EXISTS idx_cards_due ON cards(due);
CREATE INDEX IF NOT EXISTS idx_cards_state ON cards(state);

-- ============================================================================
-- REVIEW HISTORY
-- ============================================================================

CREATE TABLE IF NOT EXISTS review_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    card_id INTEGER REFERENCES cards(id) ON DELETE CASCADE,
    rating INTEGER NOT NULL,
    review_at TEXT NOT NULL,
    elapsed_days REAL,
    scheduled_days REAL,
    state INTEGER,
    duration_ms INTEGER
);

CREATE INDEX IF NOT EXISTS idx_review_logs_card ON review_logs(card_id);

-- ============================================================================
-- KNOWLEDGE GRAPH + INGESTION
-- ============================================================================

CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_id TEXT NOT NULL,
    target_id TEXT NOT NULL,
    relation TEXT DEFAULT 'related',
    weight REAL DEFAULT 1.0
);

CREATE INDEX IF NOT EXISTS idx_links_source ON links(source_id);
CREATE INDEX IF NOT EXISTS idx_links_target ON links(target_id);

CREATE TABLE IF NOT EXISTS sources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT UNIQUE,
    title TEXT,
    origin TEXT,
    star_list TEXT,
    ingested_at TEXT,
    status TEXT DEFAULT 'pending'
);

-- ============================================================================
-- PROGRESS
-- ============================================================================

CREATE TABLE IF NOT EXISTS daily_stats (
    date TEXT PRIMARY KEY,
    cards_reviewed INTEGER DEFAULT 0,
    cards_new INTEGER DEFAULT 0,
    time_spent_ms INTEGER DEFAULT 0,
    domains_touched TEXT
);

-- ============================================================================
-- FULL-TEXT SEARCH
-- ============================================================================

CREATE VIRTUAL TABLE IF NOT EXISTS search_index USING fts5(
    entity_id,
    entity_type,
    title,
    content,
    tokenize='porter unicode61'
);
"#;

/// V2: Snapshot of the card's full memory state before each review.
/// Rows written before this migration keep has_snapshot = 0 and undo falls
/// back to the approximate restoration for them.
const MIGRATION_V2_UP: &str = r#"
ALTER TABLE review_logs ADD COLUMN prev_stability REAL;
ALTER TABLE review_logs ADD COLUMN prev_difficulty REAL;
ALTER TABLE review_logs ADD COLUMN prev_due TEXT;
ALTER TABLE review_logs ADD COLUMN prev_last_review TEXT;
ALTER TABLE review_logs ADD COLUMN prev_reps INTEGER;
ALTER TABLE review_logs ADD COLUMN prev_lapses INTEGER;
ALTER TABLE review_logs ADD COLUMN prev_elapsed_days REAL;
ALTER TABLE review_logs ADD COLUMN prev_scheduled_days REAL;
ALTER TABLE review_logs ADD COLUMN has_snapshot INTEGER NOT NULL DEFAULT 0;

-- Undo walks a card's history newest-first with id as the tiebreak
CREATE INDEX IF NOT EXISTS idx_review_logs_card_order ON review_logs(card_id, review_at, id);
"#;

/// Get current schema version from database
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Apply pending migrations, each in its own transaction
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );

            let tx = conn.unchecked_transaction()?;
            tx.execute_batch(migration.up)?;
            tx.execute(
                "INSERT OR REPLACE INTO schema_version (version, applied_at)
                 VALUES (?1, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))",
                [migration.version],
            )?;
            tx.commit()?;

            applied += 1;
        }
    }

    Ok(applied)
}
