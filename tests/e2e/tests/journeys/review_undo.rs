//! Journey: review a card, then take reviews back
//!
//! Covers the review transaction (card, log and daily row move together) and
//! exact undo through arbitrarily long histories.

use chrono::Duration;
use corpus_core::{CardState, MemoryState, Rating};
use corpus_e2e_tests::{TestDataFactory, TestDatabaseManager};

#[test]
fn test_good_then_undo_returns_card_to_new() {
    let db = TestDatabaseManager::new_temp();
    let card = TestDataFactory::create_card(&db.storage, "What is the forgetting curve?");
    let today = db.storage.today();

    let outcome = db.storage.process_review(card.id, Rating::Good, 3_000).unwrap();
    assert_ne!(outcome.card.memory.state, CardState::New);
    assert!(outcome.card.memory.due.unwrap() > db.now());
    assert_eq!(db.storage.get_review_logs(card.id).unwrap().len(), 1);

    let stats = db.storage.get_daily_stats(today).unwrap();
    assert_eq!((stats.cards_reviewed, stats.cards_new, stats.time_spent_ms), (1, 1, 3_000));

    let restored = db.storage.undo_review(card.id).unwrap().unwrap();
    assert_eq!(restored.memory, MemoryState::new_card());
    assert_eq!(db.storage.get_card(card.id).unwrap().unwrap().memory, MemoryState::new_card());
    assert!(db.storage.get_review_logs(card.id).unwrap().is_empty());

    let stats = db.storage.get_daily_stats(today).unwrap();
    assert_eq!((stats.cards_reviewed, stats.cards_new, stats.time_spent_ms), (0, 0, 0));
}

#[test]
fn test_undo_walks_back_one_review_at_a_time() {
    let db = TestDatabaseManager::new_temp();
    let card = TestDataFactory::create_card(&db.storage, "Name the four FSRS ratings");

    let ratings = [Rating::Good, Rating::Good, Rating::Hard, Rating::Again, Rating::Good];
    let mut states = vec![db.storage.get_card(card.id).unwrap().unwrap().memory];
    for outcome in TestDataFactory::review_when_due(&db.storage, &db.clock, card.id, &ratings) {
        states.push(outcome.card.memory);
    }

    // Each undo lands exactly on the state before that review
    for expected in states.iter().rev().skip(1) {
        let restored = db.storage.undo_review(card.id).unwrap().unwrap();
        assert_eq!(&restored.memory, expected);
    }

    assert!(db.storage.get_review_logs(card.id).unwrap().is_empty());
    assert!(db.storage.undo_review(card.id).unwrap().is_none());
}

#[test]
fn test_lapse_bookkeeping_and_undo() {
    let db = TestDatabaseManager::new_temp();
    let card = TestDataFactory::create_review_card(&db.storage, &db.clock, "What is a lapse?");
    assert_eq!(card.memory.lapses, 0);

    let lapse = TestDataFactory::review_when_due(&db.storage, &db.clock, card.id, &[Rating::Again]);
    let lapsed = &lapse[0].card.memory;
    assert_eq!(lapsed.state, CardState::Relearning);
    assert_eq!(lapsed.lapses, 1);
    assert_eq!(lapsed.reps, card.memory.reps + 1);
    assert!(lapse[0].log.caused_lapse());

    let restored = db.storage.undo_review(card.id).unwrap().unwrap();
    assert_eq!(restored.memory.state, CardState::Review);
    assert_eq!(restored.memory.lapses, 0);
    assert_eq!(restored.memory, card.memory);
}

#[test]
fn test_repeated_undo_never_drives_stats_negative() {
    let db = TestDatabaseManager::new_temp();
    let cards = TestDataFactory::create_batch(&db.storage, 2);
    let today = db.storage.today();

    db.storage.process_review(cards[0].id, Rating::Good, 2_000).unwrap();
    db.storage.process_review(cards[1].id, Rating::Easy, 500).unwrap();

    for card in &cards {
        for _ in 0..3 {
            let _ = db.storage.undo_review(card.id).unwrap();
        }
    }

    let stats = db.storage.get_daily_stats(today).unwrap();
    assert_eq!(stats.cards_reviewed, 0);
    assert_eq!(stats.cards_new, 0);
    assert_eq!(stats.time_spent_ms, 0);
}

#[test]
fn test_undo_decrements_the_day_the_review_happened() {
    let db = TestDatabaseManager::new_temp();
    let card = TestDataFactory::create_card(&db.storage, "Which day is charged?");
    let review_day = db.storage.today();

    db.storage.process_review(card.id, Rating::Good, 1_000).unwrap();
    db.advance(Duration::days(2));
    let undo_day = db.storage.today();

    db.storage.undo_review(card.id).unwrap().unwrap();

    assert_eq!(db.storage.get_daily_stats(review_day).unwrap().cards_reviewed, 0);
    // No row was created for the day the undo ran
    assert!(db.storage.get_stats_range(undo_day, undo_day).unwrap().is_empty());
}

#[test]
fn test_rejected_review_leaves_everything_unchanged() {
    let db = TestDatabaseManager::new_temp();
    let card = TestDataFactory::create_card(&db.storage, "Negative durations?");

    assert!(db.storage.process_review(card.id, Rating::Good, -1).is_err());
    assert!(db.storage.process_review(card.id + 1_000, Rating::Good, 10).is_err());

    assert_eq!(db.storage.get_card(card.id).unwrap().unwrap().memory, MemoryState::new_card());
    assert!(db.storage.get_review_logs(card.id).unwrap().is_empty());
    assert!(db
        .storage
        .get_stats_range(db.storage.today(), db.storage.today())
        .unwrap()
        .is_empty());
}

#[test]
fn test_history_survives_restart() {
    let mut db = TestDatabaseManager::new_temp();
    let card = TestDataFactory::create_card(&db.storage, "Does undo survive a restart?");
    let outcomes =
        TestDataFactory::review_when_due(&db.storage, &db.clock, card.id, &[Rating::Good, Rating::Good]);

    db.reopen();

    let restored = db.storage.undo_review(card.id).unwrap().unwrap();
    assert_eq!(restored.memory, outcomes[0].card.memory);
}
