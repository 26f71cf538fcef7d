//! # Corpus Core
//!
//! Spaced-repetition study engine. Cards hang off a pillar / domain / topic
//! taxonomy and are scheduled with FSRS-4.5:
//!
//! - **FSRS-4.5**: 17-parameter memory model, pure and exhaustively matched over
//!   card state and rating
//! - **Review transactions**: card update, review log and daily statistics
//!   written in one SQLite transaction
//! - **Exact undo**: every review log row carries the pre-review memory snapshot
//! - **Full-text search**: FTS5 index kept in sync with card content
//! - **Injected time**: a [`Clock`] and a [`DayBoundary`] decide "now" and
//!   "today", never the ambient system clock
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use corpus_core::{NewCard, Rating, Storage};
//!
//! // Create storage (uses default platform-specific location)
//! let storage = Storage::new(None)?;
//! storage.seed_initial_data()?;
//!
//! let card = storage.create_card(NewCard::basic(
//!     "technical-mastery/python/decorators",
//!     "What does functools.wraps preserve?",
//!     "The wrapped function's metadata",
//! ))?;
//!
//! // Review it, then take it back
//! let outcome = storage.process_review(card.id, Rating::Good, 4_000)?;
//! let restored = storage.undo_review(card.id)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `bundled-sqlite` (default): statically linked SQLite with FTS5
//! - `encryption`: SQLCipher instead, keyed by `CORPUS_ENCRYPTION_KEY`

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod clock;
pub mod config;
pub mod fsrs;
pub mod model;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Time
pub use clock::{Clock, DayBoundary, FixedClock, SystemClock};

// Configuration
pub use config::{CorpusConfig, ReviewLimits};

// FSRS-4.5 algorithm
pub use fsrs::{
    initial_difficulty,
    initial_stability,
    next_interval,
    // Core functions for advanced usage
    retrievability,
    CardState,
    FSRSParameters,
    FSRSScheduler,
    MemoryState,
    PreviewResults,
    Rating,
};

// Domain types
pub use model::{
    Card, CardType, CardUpdate, DailyStats, DashboardData, Domain, GraphEdge, GraphNode, Link,
    NewCard, Pillar, PillarProgress, ReviewLogEntry, ReviewOutcome, SearchHit, Topic,
};

// Storage layer
pub use storage::{
    sanitize_fts5_query, streak_from_dates, Result, Storage, StorageError, StorageOptions,
    DEFAULT_DUE_LIMIT, DEFAULT_SEARCH_LIMIT, MAX_REVIEW_DURATION_MS,
};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// FSRS algorithm version (4.5 = 17 parameters)
pub const FSRS_VERSION: &str = "4.5";

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        Card, CardState, CardUpdate, Clock, CorpusConfig, DayBoundary, FSRSScheduler, MemoryState,
        NewCard, Rating, Result, Storage, StorageError, StorageOptions,
    };
}
