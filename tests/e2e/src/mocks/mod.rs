//! Test data generation

mod fixtures;

pub use fixtures::{TestDataFactory, TEST_DOMAIN, TEST_PILLAR, TEST_TOPIC, TEST_TOPIC_ALT};
