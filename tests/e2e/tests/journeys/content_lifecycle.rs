//! Journey: authoring content
//!
//! Cards are created, edited, moved and deleted while the full-text index
//! and review history follow along.

use corpus_core::{CardUpdate, NewCard, Rating, StorageError};
use corpus_e2e_tests::mocks::{TEST_TOPIC, TEST_TOPIC_ALT};
use corpus_e2e_tests::{TestDataFactory, TestDatabaseManager};

fn search_ids(db: &TestDatabaseManager, query: &str) -> Vec<String> {
    db.storage
        .search(query, 20)
        .unwrap()
        .into_iter()
        .map(|hit| hit.entity_id)
        .collect()
}

#[test]
fn test_create_edit_delete_keeps_search_in_sync() {
    let db = TestDatabaseManager::new_temp();

    let card = db
        .storage
        .create_card(NewCard::basic(TEST_TOPIC, "What is a mitochondrion?", "The cell's powerhouse"))
        .unwrap();
    assert_eq!(search_ids(&db, "mitochondrion"), vec![card.id.to_string()]);
    assert_eq!(search_ids(&db, "powerhouse"), vec![card.id.to_string()]);

    let changed = db
        .storage
        .update_card(
            card.id,
            CardUpdate {
                back: Some("Site of oxidative phosphorylation".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(changed);
    assert!(search_ids(&db, "powerhouse").is_empty());
    assert_eq!(search_ids(&db, "phosphorylation"), vec![card.id.to_string()]);
    // Front unchanged, still indexed once
    assert_eq!(search_ids(&db, "mitochondrion").len(), 1);

    assert!(db.storage.delete_card(card.id).unwrap());
    assert!(search_ids(&db, "mitochondrion").is_empty());
    assert!(db.storage.get_card(card.id).unwrap().is_none());
    assert!(!db.storage.delete_card(card.id).unwrap());
}

#[test]
fn test_delete_cascades_review_history() {
    let db = TestDatabaseManager::new_temp();
    let card = TestDataFactory::create_card(&db.storage, "Short lived");
    TestDataFactory::review_when_due(&db.storage, &db.clock, card.id, &[Rating::Good, Rating::Good]);
    assert_eq!(db.storage.get_review_logs(card.id).unwrap().len(), 2);

    db.storage.delete_card(card.id).unwrap();
    assert!(db.storage.get_review_logs(card.id).unwrap().is_empty());
    assert!(db.storage.undo_review(card.id).unwrap().is_none());
}

#[test]
fn test_move_card_between_topics() {
    let db = TestDatabaseManager::new_temp();
    let cards = TestDataFactory::create_batch(&db.storage, 3);

    db.storage
        .update_card(
            cards[1].id,
            CardUpdate {
                topic_id: Some(TEST_TOPIC_ALT.to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    let remaining: Vec<i64> = db
        .storage
        .get_cards_by_topic(TEST_TOPIC)
        .unwrap()
        .iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(remaining, vec![cards[0].id, cards[2].id]);
    assert_eq!(db.storage.get_cards_by_topic(TEST_TOPIC_ALT).unwrap().len(), 1);

    let err = db
        .storage
        .update_card(
            cards[0].id,
            CardUpdate {
                topic_id: Some("missing/topic".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[test]
fn test_invalid_edits() {
    let db = TestDatabaseManager::new_temp();
    let card = TestDataFactory::create_card(&db.storage, "Original");

    assert!(!db.storage.update_card(card.id, CardUpdate::default()).unwrap());

    let err = db
        .storage
        .update_card(
            card.id,
            CardUpdate {
                front: Some("   ".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidInput(_)));

    let err = db
        .storage
        .update_card(
            card.id + 99,
            CardUpdate {
                front: Some("x".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));

    assert_eq!(db.storage.get_card(card.id).unwrap().unwrap().front, "Original");
}

#[test]
fn test_editing_content_keeps_schedule() {
    let db = TestDatabaseManager::new_temp();
    let card = TestDataFactory::create_review_card(&db.storage, &db.clock, "Stable schedule");

    db.storage
        .update_card(
            card.id,
            CardUpdate {
                front: Some("Reworded question".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    let edited = db.storage.get_card(card.id).unwrap().unwrap();
    assert_eq!(edited.front, "Reworded question");
    assert_eq!(edited.memory, card.memory);
}

#[test]
fn test_count_and_backup() {
    let db = TestDatabaseManager::new_temp();
    TestDataFactory::create_batch(&db.storage, 4);
    assert_eq!(db.storage.count_cards().unwrap(), 4);

    let backup_path = db.path().with_file_name("backup.db");
    db.storage.backup_to(&backup_path).unwrap();

    let copy = corpus_core::Storage::new(Some(backup_path)).unwrap();
    assert_eq!(copy.count_cards().unwrap(), 4);
    assert_eq!(copy.search("Question", 10).unwrap().len(), 4);
}
