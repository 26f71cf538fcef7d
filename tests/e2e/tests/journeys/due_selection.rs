//! Journey: picking what to study
//!
//! Due-set ordering and limits, daily session budgets, and the scheduling
//! guarantees the due set relies on.

use chrono::Duration;
use corpus_core::{CardState, DayBoundary, Rating, ReviewLimits};
use corpus_e2e_tests::{TestDataFactory, TestDatabaseManager};

#[test]
fn test_due_cards_come_before_new_cards() {
    let db = TestDatabaseManager::new_temp();
    let new_cards = TestDataFactory::create_batch(&db.storage, 3);
    let early = TestDataFactory::create_review_card(&db.storage, &db.clock, "Scheduled early");
    let late = TestDataFactory::create_review_card(&db.storage, &db.clock, "Scheduled late");

    // Nothing scheduled is due yet; only new cards show up
    let ids: Vec<i64> = db.storage.get_due_cards(10).unwrap().iter().map(|c| c.id).collect();
    assert_eq!(ids, new_cards.iter().map(|c| c.id).collect::<Vec<_>>());

    db.set_now(late.memory.due.unwrap().max(early.memory.due.unwrap()) + Duration::days(1));
    let due = db.storage.get_due_cards(10).unwrap();
    assert_eq!(due.len(), 5);

    let (scheduled, fresh) = due.split_at(2);
    assert!(scheduled.iter().all(|c| c.memory.state != CardState::New));
    assert!(fresh.iter().all(|c| c.memory.state == CardState::New));
    assert!(scheduled[0].memory.due <= scheduled[1].memory.due);
    for card in scheduled {
        assert!(card.memory.due.unwrap() <= db.now());
    }
}

#[test]
fn test_due_limit_is_respected() {
    let db = TestDatabaseManager::new_temp();
    TestDataFactory::create_batch(&db.storage, 8);

    for limit in [0, 1, 5, 8, 20] {
        let due = db.storage.get_due_cards(limit).unwrap();
        assert_eq!(due.len() as i64, limit.min(8), "limit {}", limit);
    }
    assert!(db.storage.get_due_cards(-3).unwrap().is_empty());
}

#[test]
fn test_learning_card_returns_after_its_step() {
    let db = TestDatabaseManager::new_temp();
    let card = TestDataFactory::create_card(&db.storage, "Short step");

    db.storage.process_review(card.id, Rating::Again, 500).unwrap();
    assert!(db.storage.get_due_cards(10).unwrap().is_empty());

    db.advance(Duration::minutes(1));
    let due = db.storage.get_due_cards(10).unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].memory.state, CardState::Learning);
}

#[test]
fn test_successful_ratings_always_move_due_forward() {
    let db = TestDatabaseManager::new_temp();

    for rating in [Rating::Hard, Rating::Good, Rating::Easy] {
        // One card per starting state: New, Learning, Review, Relearning
        let new = TestDataFactory::create_card(&db.storage, "from new");
        let learning = TestDataFactory::create_card(&db.storage, "from learning");
        TestDataFactory::review_when_due(&db.storage, &db.clock, learning.id, &[Rating::Again]);
        let review = TestDataFactory::create_review_card(&db.storage, &db.clock, "from review");
        let relearning = TestDataFactory::create_review_card(&db.storage, &db.clock, "from relearning");
        TestDataFactory::review_when_due(&db.storage, &db.clock, relearning.id, &[Rating::Again]);

        for id in [new.id, learning.id, review.id, relearning.id] {
            let before = db.storage.get_card(id).unwrap().unwrap();
            let outcome = TestDataFactory::review_when_due(&db.storage, &db.clock, id, &[rating]);
            let after = &outcome[0].card.memory;

            assert!(after.due.unwrap() > db.now(), "{:?} from {:?}", rating, before.memory.state);
            assert!(after.scheduled_days > 0.0);
            assert_eq!(after.reps, before.memory.reps + 1);
        }
    }
}

#[test]
fn test_session_applies_daily_budgets() {
    let limits = ReviewLimits {
        new_cards_per_day: 3,
        max_reviews_per_day: 5,
    };
    let db = TestDatabaseManager::with_options(DayBoundary::utc(), limits);
    let cards = TestDataFactory::create_batch(&db.storage, 10);

    let session = db.storage.get_review_session(50).unwrap();
    assert_eq!(session.len(), 3);

    // Two new cards studied today leave one new slot
    db.storage.process_review(cards[0].id, Rating::Easy, 100).unwrap();
    db.storage.process_review(cards[1].id, Rating::Easy, 100).unwrap();
    let session = db.storage.get_review_session(50).unwrap();
    assert_eq!(session.len(), 1);
    assert_eq!(session[0].memory.state, CardState::New);

    // The plain due set ignores budgets
    assert_eq!(db.storage.get_due_cards(50).unwrap().len(), 8);

    // Budgets reset on the next day
    db.advance(Duration::days(1));
    let session = db.storage.get_review_session(50).unwrap();
    assert_eq!(session.len(), 3);
}

#[test]
fn test_session_total_budget_caps_scheduled_cards() {
    let limits = ReviewLimits {
        new_cards_per_day: 10,
        max_reviews_per_day: 4,
    };
    let db = TestDatabaseManager::with_options(DayBoundary::utc(), limits);
    let cards = TestDataFactory::create_batch(&db.storage, 6);
    for card in &cards[..3] {
        db.storage.process_review(card.id, Rating::Again, 100).unwrap();
    }
    db.advance(Duration::minutes(2));

    // 3 reviews used, 1 left: the due learning card wins over new cards
    let session = db.storage.get_review_session(50).unwrap();
    assert_eq!(session.len(), 1);
    assert_eq!(session[0].memory.state, CardState::Learning);
}
