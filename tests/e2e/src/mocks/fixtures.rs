//! Test Data Factory
//!
//! Provides utilities for generating realistic test data:
//! - A small pillar / domain / topic tree
//! - Cards, singly or in batches
//! - Review histories replayed at each card's due time

use corpus_core::{
    Card, CardState, Domain, FixedClock, NewCard, Pillar, Rating, ReviewOutcome, Storage, Topic,
};

pub const TEST_PILLAR: &str = "e2e";
pub const TEST_DOMAIN: &str = "e2e/domain";
pub const TEST_TOPIC: &str = "e2e/domain/topic";
pub const TEST_TOPIC_ALT: &str = "e2e/domain/other";

/// Factory for creating test data
///
/// # Example
///
/// ```rust,ignore
/// let card = TestDataFactory::create_card(&storage, "Define retrievability");
/// let outcomes = TestDataFactory::review_when_due(
///     &storage, &clock, card.id, &[Rating::Good, Rating::Good],
/// );
/// ```
pub struct TestDataFactory;

impl TestDataFactory {
    // ========================================================================
    // TAXONOMY
    // ========================================================================

    /// Insert the test pillar, domain and two topics (idempotent)
    pub fn ensure_taxonomy(storage: &Storage) {
        storage
            .upsert_pillar(&Pillar {
                id: TEST_PILLAR.to_string(),
                name: "End to End".to_string(),
                icon: None,
                color: Some("#000000".to_string()),
                sort_order: 1,
            })
            .expect("pillar");
        storage
            .upsert_domain(&Domain {
                id: TEST_DOMAIN.to_string(),
                pillar_id: TEST_PILLAR.to_string(),
                name: "Test Domain".to_string(),
                tier: 1,
                sort_order: 1,
            })
            .expect("domain");
        for (order, (id, name)) in [(TEST_TOPIC, "Test Topic"), (TEST_TOPIC_ALT, "Other Topic")]
            .into_iter()
            .enumerate()
        {
            storage
                .upsert_topic(&Topic {
                    id: id.to_string(),
                    domain_id: TEST_DOMAIN.to_string(),
                    name: name.to_string(),
                    content_path: None,
                    sort_order: order as i32 + 1,
                })
                .expect("topic");
        }
    }

    // ========================================================================
    // CARDS
    // ========================================================================

    /// Create a basic card in the test topic
    pub fn create_card(storage: &Storage, front: &str) -> Card {
        storage
            .create_card(NewCard::basic(TEST_TOPIC, front, format!("Answer to: {}", front)))
            .expect("Failed to create card")
    }

    /// Create `count` cards with distinct fronts
    pub fn create_batch(storage: &Storage, count: usize) -> Vec<Card> {
        (0..count)
            .map(|i| Self::create_card(storage, &format!("Question number {}", i)))
            .collect()
    }

    // ========================================================================
    // HISTORIES
    // ========================================================================

    /// Apply `ratings` in order, moving the clock to the card's due time
    /// before each review when it lies in the future.
    pub fn review_when_due(
        storage: &Storage,
        clock: &FixedClock,
        card_id: i64,
        ratings: &[Rating],
    ) -> Vec<ReviewOutcome> {
        let mut outcomes = Vec::with_capacity(ratings.len());
        for &rating in ratings {
            let card = storage.get_card(card_id).expect("read").expect("card exists");
            if let Some(due) = card.memory.due {
                if due > storage.now() {
                    clock.set(due);
                }
            }
            outcomes.push(storage.process_review(card_id, rating, 1_000).expect("review"));
        }
        outcomes
    }

    /// A card graduated straight to Review with an Easy first answer
    pub fn create_review_card(storage: &Storage, clock: &FixedClock, front: &str) -> Card {
        let card = Self::create_card(storage, front);
        let outcome = Self::review_when_due(storage, clock, card.id, &[Rating::Easy]);
        let card = outcome.into_iter().last().expect("one outcome").card;
        assert_eq!(card.memory.state, CardState::Review);
        card
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::TestDatabaseManager;

    #[test]
    fn test_taxonomy_is_idempotent() {
        let db = TestDatabaseManager::new_temp();
        TestDataFactory::ensure_taxonomy(&db.storage);
        assert_eq!(db.storage.get_topics(Some(TEST_DOMAIN)).unwrap().len(), 2);
    }

    #[test]
    fn test_batch() {
        let db = TestDatabaseManager::new_temp();
        let cards = TestDataFactory::create_batch(&db.storage, 4);
        assert_eq!(cards.len(), 4);
        assert_eq!(db.card_count(), 4);
    }

    #[test]
    fn test_review_when_due_moves_clock() {
        let db = TestDatabaseManager::new_temp();
        let card = TestDataFactory::create_review_card(&db.storage, &db.clock, "Graduated");
        let due = card.memory.due.unwrap();

        let outcomes = TestDataFactory::review_when_due(&db.storage, &db.clock, card.id, &[Rating::Good]);
        assert_eq!(db.now(), due);
        assert_eq!(outcomes[0].log.state, CardState::Review);
    }
}
