//! SQLite Storage Implementation
//!
//! Connection lifecycle, row mapping and card content CRUD. Review
//! processing, statistics, taxonomy, search and seeding live in sibling
//! modules as further `impl Storage` blocks.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use directories::ProjectDirs;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::search::{index_card, unindex_card};
use crate::clock::{to_storage_precision, Clock, DayBoundary, SystemClock};
use crate::config::{CorpusConfig, ReviewLimits, DB_FILE_NAME};
use crate::fsrs::{CardState, FSRSParameters, FSRSScheduler, MemoryState, Rating};
use crate::model::{Card, CardType, CardUpdate, NewCard, ReviewLogEntry};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Card, topic or other entity not found
    #[error("Not found: {0}")]
    NotFound(String),
    /// Rejected input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid timestamp
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// OPTIONS
// ============================================================================

/// Everything a storage handle needs besides its path
#[derive(Debug, Clone)]
pub struct StorageOptions {
    pub parameters: FSRSParameters,
    pub day_boundary: DayBoundary,
    pub limits: ReviewLimits,
    pub clock: Arc<dyn Clock>,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            parameters: FSRSParameters::default(),
            day_boundary: DayBoundary::default(),
            limits: ReviewLimits::default(),
            clock: Arc::new(SystemClock),
        }
    }
}

impl StorageOptions {
    pub fn from_config(config: &CorpusConfig) -> Self {
        Self {
            parameters: config.parameters.clone(),
            day_boundary: config.day_boundary(),
            limits: config.limits,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

// ============================================================================
// STORAGE
// ============================================================================

/// Main storage handle
///
/// Uses separate reader/writer connections for interior mutability.
/// All methods take `&self`, making Storage `Send + Sync` so callers share
/// it as `Arc<Storage>`. The writer mutex serializes every review and undo.
pub struct Storage {
    pub(super) writer: Mutex<Connection>,
    pub(super) reader: Mutex<Connection>,
    pub(super) scheduler: FSRSScheduler,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) day_boundary: DayBoundary,
    pub(super) limits: ReviewLimits,
    path: PathBuf,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("path", &self.path)
            .field("day_boundary", &self.day_boundary)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl Storage {
    /// Apply PRAGMAs and optional encryption to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        // Apply encryption key if SQLCipher is enabled and key is provided
        #[cfg(feature = "encryption")]
        {
            if let Ok(key) = std::env::var("CORPUS_ENCRYPTION_KEY") {
                if !key.is_empty() {
                    conn.pragma_update(None, "key", &key)?;
                }
            }
        }

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;

        Ok(())
    }

    /// Resolve the database path, creating directories as needed
    fn resolve_path(db_path: Option<PathBuf>) -> Result<PathBuf> {
        match db_path {
            Some(p) => {
                if let Some(parent) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
                    if !parent.exists() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                Ok(p)
            }
            None => {
                let proj_dirs = ProjectDirs::from("com", "corpus", "corpus").ok_or_else(|| {
                    StorageError::Init("Could not determine project directories".to_string())
                })?;

                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                // Restrict directory permissions to owner-only on Unix
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let perms = std::fs::Permissions::from_mode(0o700);
                    let _ = std::fs::set_permissions(data_dir, perms);
                }
                Ok(data_dir.join(DB_FILE_NAME))
            }
        }
    }

    /// Open storage at `db_path` (platform data directory when `None`)
    /// with default scheduling parameters and the system clock.
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        Self::open(db_path, StorageOptions::default())
    }

    /// Open storage as described by a loaded configuration
    pub fn from_config(config: &CorpusConfig) -> Result<Self> {
        Self::open(config.db_path(), StorageOptions::from_config(config))
    }

    /// Open storage with explicit options
    pub fn open(db_path: Option<PathBuf>, options: StorageOptions) -> Result<Self> {
        let path = Self::resolve_path(db_path)?;

        // Open writer connection
        let writer_conn = Connection::open(&path)?;

        // Restrict database file permissions to owner-only on Unix
        #[cfg(unix)]
        if path.exists() {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&path, perms);
        }

        Self::configure_connection(&writer_conn)?;

        // Apply migrations on writer only
        let applied = super::migrations::apply_migrations(&writer_conn)?;
        if applied > 0 {
            tracing::info!(applied, path = %path.display(), "Database schema up to date");
        }

        // Open reader connection to same path
        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
            scheduler: FSRSScheduler::new(options.parameters),
            clock: options.clock,
            day_boundary: options.day_boundary,
            limits: options.limits,
            path,
        })
    }

    /// Close both connections, reporting any error SQLite raises on close
    pub fn close(self) -> Result<()> {
        let Storage { writer, reader, .. } = self;

        let reader = reader
            .into_inner()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        reader.close().map_err(|(_, e)| StorageError::Database(e))?;

        let writer = writer
            .into_inner()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        writer.execute_batch("PRAGMA optimize;")?;
        writer.close().map_err(|(_, e)| StorageError::Database(e))?;

        tracing::debug!("Storage closed");
        Ok(())
    }

    /// Database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn scheduler(&self) -> &FSRSScheduler {
        &self.scheduler
    }

    pub fn limits(&self) -> ReviewLimits {
        self.limits
    }

    pub fn day_boundary(&self) -> DayBoundary {
        self.day_boundary
    }

    /// Current instant at persisted precision
    pub fn now(&self) -> DateTime<Utc> {
        to_storage_precision(self.clock.now())
    }

    /// Current study date
    pub fn today(&self) -> NaiveDate {
        self.day_boundary.date_of(self.now())
    }

    pub(super) fn lock_writer(&self) -> Result<MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))
    }

    pub(super) fn lock_reader(&self) -> Result<MutexGuard<'_, Connection>> {
        self.reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))
    }

    // ========================================================================
    // CARD CRUD
    // ========================================================================

    /// Create a New card and its search document in one transaction
    pub fn create_card(&self, input: NewCard) -> Result<Card> {
        validate_text("front", &input.front)?;
        validate_text("back", &input.back)?;
        let now = self.now();

        let mut writer = self.lock_writer()?;
        let tx = writer.transaction_with_behavior(TransactionBehavior::Immediate)?;

        require_topic(&tx, &input.topic_id)?;

        tx.execute(
            "INSERT INTO cards (topic_id, front, back, card_type, image_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                input.topic_id,
                input.front,
                input.back,
                input.card_type.as_str(),
                input.image_url,
                format_timestamp(now),
            ],
        )?;
        let id = tx.last_insert_rowid();
        index_card(&tx, id, &input.front, &input.back)?;

        let card = load_card(&tx, id)?
            .ok_or_else(|| StorageError::NotFound(format!("Card {}", id)))?;
        tx.commit()?;

        tracing::debug!(card_id = id, topic_id = %card.topic_id, "Card created");
        Ok(card)
    }

    /// Apply a content update. Returns `false` when there is nothing to change.
    pub fn update_card(&self, id: i64, update: CardUpdate) -> Result<bool> {
        if update.is_empty() {
            return Ok(false);
        }
        if let Some(front) = &update.front {
            validate_text("front", front)?;
        }
        if let Some(back) = &update.back {
            validate_text("back", back)?;
        }

        let mut writer = self.lock_writer()?;
        let tx = writer.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = load_card(&tx, id)?
            .ok_or_else(|| StorageError::NotFound(format!("Card {}", id)))?;
        if let Some(topic_id) = &update.topic_id {
            require_topic(&tx, topic_id)?;
        }

        tx.execute(
            "UPDATE cards SET
                front = COALESCE(?1, front),
                back = COALESCE(?2, back),
                topic_id = COALESCE(?3, topic_id)
             WHERE id = ?4",
            params![update.front, update.back, update.topic_id, id],
        )?;

        if update.touches_text() {
            let front = update.front.as_deref().unwrap_or(&existing.front);
            let back = update.back.as_deref().unwrap_or(&existing.back);
            unindex_card(&tx, id)?;
            index_card(&tx, id, front, back)?;
        }

        tx.commit()?;
        Ok(true)
    }

    /// Delete a card, its search document and (by cascade) its review logs
    pub fn delete_card(&self, id: i64) -> Result<bool> {
        let mut writer = self.lock_writer()?;
        let tx = writer.transaction_with_behavior(TransactionBehavior::Immediate)?;

        unindex_card(&tx, id)?;
        let rows = tx.execute("DELETE FROM cards WHERE id = ?1", params![id])?;
        tx.commit()?;

        if rows > 0 {
            tracing::debug!(card_id = id, "Card deleted");
        }
        Ok(rows > 0)
    }

    /// Get a card by ID
    pub fn get_card(&self, id: i64) -> Result<Option<Card>> {
        let reader = self.lock_reader()?;
        load_card(&reader, id)
    }

    /// Cards of a topic in creation order
    pub fn get_cards_by_topic(&self, topic_id: &str) -> Result<Vec<Card>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare(
            "SELECT * FROM cards
             WHERE topic_id = ?1
             ORDER BY created_at ASC, id ASC",
        )?;

        let cards = stmt.query_map(params![topic_id], row_to_card)?;

        let mut result = Vec::new();
        for card in cards {
            result.push(card?);
        }
        Ok(result)
    }

    pub fn count_cards(&self) -> Result<i64> {
        let reader = self.lock_reader()?;
        let count = reader.query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Create a consistent backup using VACUUM INTO
    pub fn backup_to(&self, path: &Path) -> Result<()> {
        let path_str = path.to_str().ok_or_else(|| {
            StorageError::Init("Invalid backup path encoding".to_string())
        })?;
        if path_str.bytes().any(|b| b < 0x20 && b != b'\t') {
            return Err(StorageError::Init("Backup path contains invalid characters".to_string()));
        }
        let reader = self.lock_reader()?;
        // VACUUM INTO doesn't support parameterized queries; escape single quotes
        reader.execute_batch(&format!("VACUUM INTO '{}'", path_str.replace('\'', "''")))?;
        Ok(())
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

fn validate_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StorageError::InvalidInput(format!("Card {} cannot be empty", field)));
    }
    Ok(())
}

pub(super) fn require_topic(conn: &Connection, topic_id: &str) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM topics WHERE id = ?1)",
        params![topic_id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(StorageError::NotFound(format!("Topic {}", topic_id)))
    }
}

// ============================================================================
// ROW MAPPING
// ============================================================================

impl ToSql for CardState {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_i32()))
    }
}

impl FromSql for CardState {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = i64::column_result(value)?;
        i32::try_from(raw)
            .ok()
            .and_then(CardState::from_i32)
            .ok_or(FromSqlError::OutOfRange(raw))
    }
}

impl ToSql for Rating {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_i32()))
    }
}

impl FromSql for Rating {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = i64::column_result(value)?;
        i32::try_from(raw)
            .ok()
            .and_then(Rating::from_i32)
            .ok_or(FromSqlError::OutOfRange(raw))
    }
}

/// Persisted instant format: RFC 3339, UTC, millisecond precision, `Z` suffix.
/// Fixed width, so text order equals time order.
pub(crate) fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a persisted instant. Also accepts SQLite's `datetime('now')` format.
pub(super) fn parse_timestamp(value: &str, field_name: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map(|naive| naive.and_utc())
        })
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("Invalid {} timestamp '{}': {}", field_name, value, e),
                )),
            )
        })
}

pub(super) fn parse_optional_timestamp(
    value: Option<String>,
    field_name: &str,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value.map(|s| parse_timestamp(&s, field_name)).transpose()
}

pub(super) fn parse_date(value: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Invalid date '{}': {}", value, e),
            )),
        )
    })
}

/// Convert a row to Card
pub(super) fn row_to_card(row: &rusqlite::Row) -> rusqlite::Result<Card> {
    let created_at: Option<String> = row.get("created_at")?;
    let created_at = match created_at {
        Some(s) => parse_timestamp(&s, "created_at")?,
        None => DateTime::<Utc>::UNIX_EPOCH,
    };
    let due = parse_optional_timestamp(row.get("due")?, "due")?;
    let last_review = parse_optional_timestamp(row.get("last_review")?, "last_review")?;

    let card_type: Option<String> = row.get("card_type")?;
    let card_type = card_type
        .and_then(|s| s.parse::<CardType>().ok())
        .unwrap_or_default();

    Ok(Card {
        id: row.get("id")?,
        topic_id: row.get::<_, Option<String>>("topic_id")?.unwrap_or_default(),
        front: row.get("front")?,
        back: row.get("back")?,
        card_type,
        image_url: row.get("image_url")?,
        created_at,
        memory: MemoryState {
            state: row.get::<_, Option<CardState>>("state")?.unwrap_or_default(),
            stability: row.get::<_, Option<f64>>("stability")?.unwrap_or(0.0),
            difficulty: row.get::<_, Option<f64>>("difficulty")?.unwrap_or(0.0),
            due,
            last_review,
            reps: row.get::<_, Option<i32>>("reps")?.unwrap_or(0),
            lapses: row.get::<_, Option<i32>>("lapses")?.unwrap_or(0),
            elapsed_days: row.get::<_, Option<f64>>("elapsed_days")?.unwrap_or(0.0),
            scheduled_days: row.get::<_, Option<f64>>("scheduled_days")?.unwrap_or(0.0),
        },
    })
}

/// Convert a row to ReviewLogEntry, including the snapshot when present
pub(super) fn row_to_log(row: &rusqlite::Row) -> rusqlite::Result<ReviewLogEntry> {
    let review_at: String = row.get("review_at")?;
    let state = row.get::<_, Option<CardState>>("state")?.unwrap_or_default();
    let has_snapshot = row.get::<_, Option<i64>>("has_snapshot")?.unwrap_or(0) != 0;

    let previous = if has_snapshot {
        Some(MemoryState {
            state,
            stability: row.get::<_, Option<f64>>("prev_stability")?.unwrap_or(0.0),
            difficulty: row.get::<_, Option<f64>>("prev_difficulty")?.unwrap_or(0.0),
            due: parse_optional_timestamp(row.get("prev_due")?, "prev_due")?,
            last_review: parse_optional_timestamp(row.get("prev_last_review")?, "prev_last_review")?,
            reps: row.get::<_, Option<i32>>("prev_reps")?.unwrap_or(0),
            lapses: row.get::<_, Option<i32>>("prev_lapses")?.unwrap_or(0),
            elapsed_days: row.get::<_, Option<f64>>("prev_elapsed_days")?.unwrap_or(0.0),
            scheduled_days: row.get::<_, Option<f64>>("prev_scheduled_days")?.unwrap_or(0.0),
        })
    } else {
        None
    };

    Ok(ReviewLogEntry {
        id: row.get("id")?,
        card_id: row.get("card_id")?,
        rating: row.get("rating")?,
        review_at: parse_timestamp(&review_at, "review_at")?,
        elapsed_days: row.get::<_, Option<f64>>("elapsed_days")?.unwrap_or(0.0),
        scheduled_days: row.get::<_, Option<f64>>("scheduled_days")?.unwrap_or(0.0),
        state,
        duration_ms: row.get::<_, Option<i64>>("duration_ms")?.unwrap_or(0),
        previous,
    })
}

/// Load a card through any connection or open transaction
pub(super) fn load_card(conn: &Connection, id: i64) -> Result<Option<Card>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM cards WHERE id = ?1")?;
    let card = stmt.query_row(params![id], row_to_card).optional()?;
    Ok(card)
}

/// Overwrite a card's memory-state columns
pub(super) fn write_memory(conn: &Connection, id: i64, memory: &MemoryState) -> Result<()> {
    conn.execute(
        "UPDATE cards SET
            state = ?1,
            stability = ?2,
            difficulty = ?3,
            due = ?4,
            last_review = ?5,
            reps = ?6,
            lapses = ?7,
            elapsed_days = ?8,
            scheduled_days = ?9
         WHERE id = ?10",
        params![
            memory.state,
            memory.stability,
            memory.difficulty,
            memory.due.map(format_timestamp),
            memory.last_review.map(format_timestamp),
            memory.reps,
            memory.lapses,
            memory.elapsed_days,
            memory.scheduled_days,
            id,
        ],
    )?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
