//! Test Database Manager
//!
//! Provides isolated database instances for testing:
//! - Temporary databases that are automatically cleaned up
//! - A settable clock shared with the storage handle
//! - Custom day boundaries and daily review budgets
//! - Reopening the same file to simulate a restart

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use corpus_core::{DayBoundary, FixedClock, ReviewLimits, Storage, StorageOptions};
use tempfile::TempDir;

use crate::mocks::TestDataFactory;

/// Instant every test database starts at: Monday 2025-03-10 09:00 UTC
pub fn start_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0)
        .single()
        .expect("valid start instant")
}

/// Manager for test databases
///
/// Each manager owns a temp directory, a database inside it and the fixed
/// clock the storage reads. Everything is removed when the manager drops.
///
/// # Example
///
/// ```rust,ignore
/// let db = TestDatabaseManager::new_temp();
/// let card = TestDataFactory::create_card(&db.storage, "What is a lapse?");
///
/// db.advance(Duration::days(1));
/// db.storage.process_review(card.id, Rating::Good, 2_000)?;
/// ```
pub struct TestDatabaseManager {
    /// The storage instance
    pub storage: Arc<Storage>,
    /// Clock read by `storage`
    pub clock: Arc<FixedClock>,
    options: StorageOptions,
    db_path: PathBuf,
    /// Temporary directory (kept alive to prevent premature deletion)
    _temp_dir: TempDir,
}

impl TestDatabaseManager {
    /// Empty database with the test taxonomy, UTC day boundary, default budgets
    pub fn new_temp() -> Self {
        Self::with_options(DayBoundary::utc(), ReviewLimits::default())
    }

    /// Database populated by `seed_initial_data` (no test taxonomy)
    pub fn new_seeded() -> Self {
        let db = Self::build(DayBoundary::utc(), ReviewLimits::default());
        db.storage.seed_initial_data().expect("Failed to seed");
        db
    }

    /// Empty database with the test taxonomy and explicit options
    pub fn with_options(day_boundary: DayBoundary, limits: ReviewLimits) -> Self {
        let db = Self::build(day_boundary, limits);
        TestDataFactory::ensure_taxonomy(&db.storage);
        db
    }

    fn build(day_boundary: DayBoundary, limits: ReviewLimits) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test_corpus.db");
        let clock = Arc::new(FixedClock::new(start_instant()));

        let options = StorageOptions {
            day_boundary,
            limits,
            ..StorageOptions::default().with_clock(clock.clone())
        };
        let storage = Storage::open(Some(db_path.clone()), options.clone())
            .expect("Failed to create test storage");

        Self {
            storage: Arc::new(storage),
            clock,
            options,
            db_path,
            _temp_dir: temp_dir,
        }
    }

    /// Get the database path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn card_count(&self) -> i64 {
        self.storage.count_cards().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.card_count() == 0
    }

    // ========================================================================
    // TIME
    // ========================================================================

    pub fn now(&self) -> DateTime<Utc> {
        self.storage.now()
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    pub fn set_now(&self, instant: DateTime<Utc>) {
        self.clock.set(instant);
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Close the storage and open the same file again, keeping the clock.
    ///
    /// Panics if another `Arc<Storage>` clone is still alive.
    pub fn reopen(&mut self) {
        let reopened = Storage::open(Some(self.db_path.clone()), self.options.clone())
            .expect("Failed to reopen storage");
        let previous = std::mem::replace(&mut self.storage, Arc::new(reopened));
        let previous = Arc::try_unwrap(previous).expect("storage still shared");
        previous.close().expect("Failed to close storage");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_database_creation() {
        let db = TestDatabaseManager::new_temp();
        assert!(db.is_empty());
        assert!(db.path().exists());
        assert_eq!(db.now(), start_instant());
    }

    #[test]
    fn test_clock_is_shared_with_storage() {
        let db = TestDatabaseManager::new_temp();
        db.advance(Duration::hours(30));
        assert_eq!(db.storage.now(), start_instant() + Duration::hours(30));
        assert_eq!(db.storage.today().to_string(), "2025-03-11");
    }

    #[test]
    fn test_reopen_keeps_data() {
        let mut db = TestDatabaseManager::new_temp();
        TestDataFactory::create_batch(&db.storage, 3);
        db.reopen();
        assert_eq!(db.card_count(), 3);
    }

    #[test]
    fn test_seeded_database() {
        let db = TestDatabaseManager::new_seeded();
        assert_eq!(db.card_count(), 5);
        assert_eq!(db.storage.get_pillars().unwrap().len(), 6);
    }
}
