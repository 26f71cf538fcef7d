//! Journey: progress over several days
//!
//! Daily statistics keyed through the configured day boundary, the streak
//! walk and the dashboard aggregates.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use corpus_core::{DayBoundary, Rating, ReviewLimits};
use corpus_e2e_tests::{start_instant, TestDataFactory, TestDatabaseManager};

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

#[test]
fn test_streak_counts_today_and_yesterday() {
    let db = TestDatabaseManager::new_temp();
    let cards = TestDataFactory::create_batch(&db.storage, 3);

    // Three days ago, then a gap, then yesterday and today
    db.set_now(start_instant() - Duration::days(3));
    db.storage.process_review(cards[0].id, Rating::Good, 1_000).unwrap();
    db.set_now(start_instant() - Duration::days(1));
    db.storage.process_review(cards[1].id, Rating::Good, 1_000).unwrap();
    db.set_now(start_instant());
    assert_eq!(db.storage.calculate_streak().unwrap(), 0);

    db.storage.process_review(cards[2].id, Rating::Good, 1_000).unwrap();
    assert_eq!(db.storage.calculate_streak().unwrap(), 2);

    // Undoing today's only review breaks the streak again
    db.storage.undo_review(cards[2].id).unwrap();
    assert_eq!(db.storage.calculate_streak().unwrap(), 0);
}

#[test]
fn test_day_boundary_decides_the_stats_row() {
    // UTC+10: 20:00 UTC on the 10th is already the 11th locally
    let boundary = DayBoundary::from_offset_minutes(600).unwrap();
    let db = TestDatabaseManager::with_options(boundary, ReviewLimits::default());
    let card = TestDataFactory::create_card(&db.storage, "Late evening review");

    db.set_now(Utc.with_ymd_and_hms(2025, 3, 10, 20, 0, 0).unwrap());
    assert_eq!(db.storage.today(), date("2025-03-11"));
    db.storage.process_review(card.id, Rating::Hard, 4_000).unwrap();

    assert_eq!(db.storage.get_daily_stats(date("2025-03-11")).unwrap().cards_reviewed, 1);
    assert_eq!(db.storage.get_daily_stats(date("2025-03-10")).unwrap().cards_reviewed, 0);
}

#[test]
fn test_stats_range_and_counters() {
    let db = TestDatabaseManager::new_temp();
    let cards = TestDataFactory::create_batch(&db.storage, 4);

    // Day 1: two new cards
    db.storage.process_review(cards[0].id, Rating::Again, 1_500).unwrap();
    db.storage.process_review(cards[1].id, Rating::Good, 2_500).unwrap();
    // Same day: the learning card again, not new any more
    db.advance(Duration::minutes(2));
    db.storage.process_review(cards[0].id, Rating::Good, 500).unwrap();

    // Day 3: one more new card
    db.advance(Duration::days(2));
    db.storage.process_review(cards[2].id, Rating::Easy, 700).unwrap();

    let rows = db.storage.get_stats_range(date("2025-03-01"), date("2025-03-31")).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, date("2025-03-10"));
    assert_eq!((rows[0].cards_reviewed, rows[0].cards_new, rows[0].time_spent_ms), (3, 2, 4_500));
    assert_eq!(rows[1].date, date("2025-03-12"));
    assert_eq!((rows[1].cards_reviewed, rows[1].cards_new), (1, 1));
    assert!(rows.iter().all(|r| r.domains_touched.is_empty()));

    let single = db.storage.get_stats_range(date("2025-03-12"), date("2025-03-12")).unwrap();
    assert_eq!(single.len(), 1);
}

#[test]
fn test_dashboard_on_seeded_database() {
    let db = TestDatabaseManager::new_seeded();
    let due = db.storage.get_due_cards(5).unwrap();
    assert_eq!(due.len(), 5);

    db.storage.process_review(due[0].id, Rating::Easy, 1_000).unwrap();
    db.storage.process_review(due[1].id, Rating::Again, 1_000).unwrap();

    let dashboard = db.storage.get_dashboard_data().unwrap();
    assert_eq!(dashboard.new_available, 3);
    assert_eq!(dashboard.reviewed_today, 2);
    assert_eq!(dashboard.due_today, 0);
    assert_eq!(dashboard.streak, 1);

    let mastered: i64 = dashboard.pillar_progress.iter().map(|p| p.mastered).sum();
    let total: i64 = dashboard.pillar_progress.iter().map(|p| p.total).sum();
    assert_eq!(mastered, 1);
    assert_eq!(total, 5);

    // The Again card comes due after its step
    db.advance(Duration::minutes(5));
    assert_eq!(db.storage.get_dashboard_data().unwrap().due_today, 1);

    // A week later the activity window has moved on
    db.advance(Duration::days(8));
    let later = db.storage.get_dashboard_data().unwrap();
    assert!(later.recent_activity.is_empty());
    assert_eq!(later.streak, 0);
    assert_eq!(later.reviewed_today, 0);
}
