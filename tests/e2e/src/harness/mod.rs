//! Test harness: isolated databases with controllable time

mod db_manager;

pub use db_manager::{start_instant, TestDatabaseManager};
