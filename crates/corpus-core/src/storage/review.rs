//! Review transactions
//!
//! `process_review` and `undo_review` are the only writers of card memory
//! state. Each runs as one IMMEDIATE transaction on the writer connection, so
//! the card row, its review log and the daily statistics row move together.

use chrono::{DateTime, Utc};
use rusqlite::{named_params, params, Connection, OptionalExtension, TransactionBehavior};

use super::sqlite::{
    format_timestamp, load_card, row_to_card, row_to_log, write_memory, Result, Storage,
    StorageError,
};
use crate::fsrs::{CardState, MemoryState, PreviewResults, Rating};
use crate::model::{Card, ReviewLogEntry, ReviewOutcome};

/// Due-set size when the caller does not pass one
pub const DEFAULT_DUE_LIMIT: i64 = 50;

/// Longest duration a single review may report (one day)
pub const MAX_REVIEW_DURATION_MS: i64 = 24 * 60 * 60 * 1000;

impl Storage {
    // ========================================================================
    // REVIEW
    // ========================================================================

    /// Apply a rating to a card.
    ///
    /// Updates the card, appends a log entry carrying the pre-review snapshot
    /// and bumps today's statistics, all in one transaction.
    pub fn process_review(&self, card_id: i64, rating: Rating, duration_ms: i64) -> Result<ReviewOutcome> {
        if duration_ms < 0 {
            return Err(StorageError::InvalidInput(format!(
                "Review duration cannot be negative: {}",
                duration_ms
            )));
        }
        if duration_ms > MAX_REVIEW_DURATION_MS {
            return Err(StorageError::InvalidInput(format!(
                "Review duration exceeds {} ms: {}",
                MAX_REVIEW_DURATION_MS, duration_ms
            )));
        }

        let now = self.now();
        let today = self.day_boundary.date_of(now);

        let mut writer = self.lock_writer()?;
        let tx = writer.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let card = load_card(&tx, card_id)?
            .ok_or_else(|| StorageError::NotFound(format!("Card {}", card_id)))?;
        let previous = card.memory.clone();
        let next = self.scheduler.review(&previous, rating, now);

        write_memory(&tx, card_id, &next)?;

        tx.execute(
            "INSERT INTO review_logs (
                card_id, rating, review_at, elapsed_days, scheduled_days, state, duration_ms,
                prev_stability, prev_difficulty, prev_due, prev_last_review,
                prev_reps, prev_lapses, prev_elapsed_days, prev_scheduled_days, has_snapshot
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, 1)",
            params![
                card_id,
                rating,
                format_timestamp(now),
                next.elapsed_days,
                next.scheduled_days,
                previous.state,
                duration_ms,
                previous.stability,
                previous.difficulty,
                previous.due.map(format_timestamp),
                previous.last_review.map(format_timestamp),
                previous.reps,
                previous.lapses,
                previous.elapsed_days,
                previous.scheduled_days,
            ],
        )?;
        let log_id = tx.last_insert_rowid();

        let was_new = i64::from(previous.state == CardState::New);
        tx.execute(
            "INSERT INTO daily_stats (date, cards_reviewed, cards_new, time_spent_ms, domains_touched)
             VALUES (?1, 1, ?2, ?3, '[]')
             ON CONFLICT(date) DO UPDATE SET
                cards_reviewed = COALESCE(cards_reviewed, 0) + 1,
                cards_new = COALESCE(cards_new, 0) + excluded.cards_new,
                time_spent_ms = COALESCE(time_spent_ms, 0) + excluded.time_spent_ms",
            params![today.to_string(), was_new, duration_ms],
        )?;

        tx.commit()?;

        tracing::debug!(
            card_id,
            rating = rating.as_i32(),
            state = %next.state,
            scheduled_days = next.scheduled_days,
            "Review applied"
        );

        let log = ReviewLogEntry {
            id: log_id,
            card_id,
            rating,
            review_at: now,
            elapsed_days: next.elapsed_days,
            scheduled_days: next.scheduled_days,
            state: previous.state,
            duration_ms,
            previous: Some(previous),
        };

        Ok(ReviewOutcome {
            card: Card { memory: next, ..card },
            log,
        })
    }

    // ========================================================================
    // UNDO
    // ========================================================================

    /// Revert the most recent review of a card.
    ///
    /// Returns `None` when the card has no review history. Repeated calls walk
    /// back one review at a time.
    pub fn undo_review(&self, card_id: i64) -> Result<Option<Card>> {
        let mut writer = self.lock_writer()?;
        let tx = writer.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let latest = latest_logs(&tx, card_id, 2)?;
        let Some(undone) = latest.first() else {
            return Ok(None);
        };
        let preceding = latest.get(1);

        let card = load_card(&tx, card_id)?
            .ok_or_else(|| StorageError::NotFound(format!("Card {}", card_id)))?;
        let restored = restored_memory(&card.memory, undone, preceding);

        write_memory(&tx, card_id, &restored)?;
        tx.execute("DELETE FROM review_logs WHERE id = ?1", params![undone.id])?;

        let was_new = i64::from(undone.state == CardState::New);
        let date = self.day_boundary.date_of(undone.review_at);
        tx.execute(
            "UPDATE daily_stats SET
                cards_reviewed = MAX(COALESCE(cards_reviewed, 0) - 1, 0),
                cards_new = MIN(
                    MAX(COALESCE(cards_new, 0) - ?1, 0),
                    MAX(COALESCE(cards_reviewed, 0) - 1, 0)
                ),
                time_spent_ms = MAX(COALESCE(time_spent_ms, 0) - ?2, 0)
             WHERE date = ?3",
            params![was_new, undone.duration_ms, date.to_string()],
        )?;

        tx.commit()?;

        tracing::debug!(
            card_id,
            log_id = undone.id,
            exact = undone.previous.is_some(),
            state = %restored.state,
            "Review undone"
        );

        Ok(Some(Card {
            memory: restored,
            ..card
        }))
    }

    // ========================================================================
    // DUE SET
    // ========================================================================

    /// Cards eligible for review now: due non-New cards by due date, then New
    /// cards in creation order. A non-positive limit yields an empty list.
    pub fn get_due_cards(&self, limit: i64) -> Result<Vec<Card>> {
        if limit <= 0 {
            return Ok(Vec::new());
        }
        let now = self.now();
        let reader = self.lock_reader()?;
        query_due(&reader, now, DueFilter::All, limit)
    }

    /// Due set further capped by today's remaining review and new-card budget
    pub fn get_review_session(&self, limit: i64) -> Result<Vec<Card>> {
        if limit <= 0 {
            return Ok(Vec::new());
        }
        let now = self.now();
        let today = self.day_boundary.date_of(now);

        let reader = self.lock_reader()?;
        let (reviewed, new_reviewed): (i64, i64) = reader
            .query_row(
                "SELECT COALESCE(cards_reviewed, 0), COALESCE(cards_new, 0)
                 FROM daily_stats WHERE date = ?1",
                params![today.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .unwrap_or((0, 0));

        let review_budget = (self.limits.max_reviews_per_day - reviewed).max(0);
        let new_budget = (self.limits.new_cards_per_day - new_reviewed).max(0);
        let total = limit.min(review_budget);
        if total == 0 {
            return Ok(Vec::new());
        }

        let mut session = query_due(&reader, now, DueFilter::Scheduled, total)?;
        let remaining = (total - session.len() as i64).min(new_budget);
        if remaining > 0 {
            session.extend(query_due(&reader, now, DueFilter::New, remaining)?);
        }
        Ok(session)
    }

    /// All four possible outcomes for a card, without writing anything
    pub fn preview_review(&self, card_id: i64) -> Result<PreviewResults> {
        let now = self.now();
        let card = self
            .get_card(card_id)?
            .ok_or_else(|| StorageError::NotFound(format!("Card {}", card_id)))?;
        Ok(self.scheduler.preview(&card.memory, now))
    }

    /// Review history of a card, oldest first
    pub fn get_review_logs(&self, card_id: i64) -> Result<Vec<ReviewLogEntry>> {
        let reader = self.lock_reader()?;
        let mut stmt = reader.prepare(
            "SELECT * FROM review_logs
             WHERE card_id = ?1
             ORDER BY review_at ASC, id ASC",
        )?;
        let logs = stmt.query_map(params![card_id], row_to_log)?;

        let mut result = Vec::new();
        for log in logs {
            result.push(log?);
        }
        Ok(result)
    }
}

// ============================================================================
// HELPERS
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum DueFilter {
    All,
    Scheduled,
    New,
}

fn query_due(conn: &Connection, now: DateTime<Utc>, filter: DueFilter, limit: i64) -> Result<Vec<Card>> {
    let predicate = match filter {
        DueFilter::All => "state = 0 OR (due IS NOT NULL AND due <= :now)",
        DueFilter::Scheduled => "state != 0 AND due IS NOT NULL AND due <= :now",
        DueFilter::New => "state = 0",
    };
    let sql = format!(
        "SELECT * FROM cards
         WHERE {}
         ORDER BY CASE WHEN state = 0 THEN 1 ELSE 0 END, due ASC, created_at ASC, id ASC
         LIMIT :limit",
        predicate
    );

    let now = format_timestamp(now);
    let mut stmt = conn.prepare_cached(&sql)?;
    let cards = match filter {
        DueFilter::New => stmt.query_map(named_params! { ":limit": limit }, row_to_card)?,
        _ => stmt.query_map(named_params! { ":now": now, ":limit": limit }, row_to_card)?,
    };

    let mut result = Vec::new();
    for card in cards {
        result.push(card?);
    }
    Ok(result)
}

/// Newest log entries of a card, newest first, insertion order breaking ties
fn latest_logs(conn: &Connection, card_id: i64, count: i64) -> Result<Vec<ReviewLogEntry>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM review_logs
         WHERE card_id = ?1
         ORDER BY review_at DESC, id DESC
         LIMIT ?2",
    )?;
    let logs = stmt.query_map(params![card_id, count], row_to_log)?;

    let mut result = Vec::new();
    for log in logs {
        result.push(log?);
    }
    Ok(result)
}

/// Memory state to restore when `undone` is reverted.
///
/// Snapshot rows restore exactly. Older rows only know the pre-review state,
/// so stability and difficulty are zeroed and due/last review fall back to the
/// preceding review instant.
pub(super) fn restored_memory(
    current: &MemoryState,
    undone: &ReviewLogEntry,
    preceding: Option<&ReviewLogEntry>,
) -> MemoryState {
    if let Some(snapshot) = &undone.previous {
        return snapshot.clone();
    }

    match preceding {
        Some(prev) if undone.state != CardState::New => MemoryState {
            state: undone.state,
            stability: 0.0,
            difficulty: 0.0,
            due: Some(prev.review_at),
            last_review: Some(prev.review_at),
            reps: (current.reps - 1).max(0),
            lapses: if undone.caused_lapse() {
                (current.lapses - 1).max(0)
            } else {
                current.lapses
            },
            elapsed_days: 0.0,
            scheduled_days: 0.0,
        },
        _ => MemoryState::new_card(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
