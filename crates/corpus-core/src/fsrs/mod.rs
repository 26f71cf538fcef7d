//! FSRS-4.5 (Free Spaced Repetition Scheduler) Module
//!
//! Pure memory model: given a card's memory state, a rating and the current
//! instant, compute the next memory state. No I/O and no clock access.
//!
//! Reference: https://github.com/open-spaced-repetition/fsrs4anki
//!
//! ## Core Formulas:
//! - Retrievability: R = (1 + FACTOR * t / S)^DECAY with DECAY = -0.5, FACTOR = 19/81
//! - Interval: t = S/FACTOR * (R^(1/DECAY) - 1)

mod algorithm;
mod scheduler;

pub use algorithm::{
    initial_difficulty,
    initial_difficulty_with_weights,
    initial_stability,
    initial_stability_with_weights,
    next_difficulty,
    next_difficulty_with_weights,
    next_forget_stability,
    next_forget_stability_with_weights,
    next_interval,
    next_recall_stability,
    next_recall_stability_with_weights,
    // Core functions
    retrievability,
    DECAY,
    DEFAULT_MAXIMUM_INTERVAL,
    DEFAULT_RETENTION,
    FACTOR,
    MAXIMUM_INTERVAL_CEILING,
    // Constants
    FSRS45_WEIGHTS,
    MAX_DIFFICULTY,
    MIN_DIFFICULTY,
    MIN_STABILITY,
};

pub use scheduler::{
    days_between, CardState, FSRSParameters, FSRSScheduler, MemoryState, PreviewResults, Rating,
};
