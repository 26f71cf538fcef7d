//! End-to-end test support for Corpus
//!
//! - [`harness::TestDatabaseManager`]: isolated temp database on a fixed clock
//! - [`mocks::TestDataFactory`]: taxonomy, cards and review histories

pub mod harness;
pub mod mocks;

pub use harness::{start_instant, TestDatabaseManager};
pub use mocks::TestDataFactory;
