//! FSRS-4.5 Core Formulas
//!
//! Pure functions over stability, difficulty and retrievability. Nothing in
//! this file knows about cards, states or clocks; the scheduler composes these
//! into state transitions.

use super::scheduler::Rating;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default FSRS-4.5 weights (17 parameters)
pub const FSRS45_WEIGHTS: [f64; 17] = [
    0.4, 0.6, 2.4, 5.8, 4.93, 0.94, 0.86, 0.01, 1.49, 0.14, 0.94, 2.18, 0.05, 0.34, 1.26, 0.29,
    2.61,
];

/// Forgetting curve exponent
pub const DECAY: f64 = -0.5;

/// Forgetting curve scale, chosen so that R(S, S) = 0.9
pub const FACTOR: f64 = 19.0 / 81.0;

/// Default target retention
pub const DEFAULT_RETENTION: f64 = 0.9;

/// Default maximum interval in days
pub const DEFAULT_MAXIMUM_INTERVAL: f64 = 36500.0;

/// Largest maximum interval accepted in configuration
pub const MAXIMUM_INTERVAL_CEILING: f64 = DEFAULT_MAXIMUM_INTERVAL * 10.0;

/// Lower bound for any stability value
pub const MIN_STABILITY: f64 = 0.1;

/// Difficulty bounds
pub const MIN_DIFFICULTY: f64 = 1.0;
pub const MAX_DIFFICULTY: f64 = 10.0;

// ============================================================================
// RETRIEVABILITY
// ============================================================================

/// Probability of recall after `elapsed_days` for a memory of `stability`.
///
/// Returns 0 for a memory with no stability yet.
pub fn retrievability(elapsed_days: f64, stability: f64) -> f64 {
    if stability <= 0.0 {
        return 0.0;
    }
    let t = elapsed_days.max(0.0);
    (1.0 + FACTOR * t / stability).powf(DECAY)
}

// ============================================================================
// INITIAL STATE
// ============================================================================

/// Initial stability for the first rating of a new card
pub fn initial_stability(rating: Rating) -> f64 {
    initial_stability_with_weights(rating, &FSRS45_WEIGHTS)
}

pub fn initial_stability_with_weights(rating: Rating, weights: &[f64; 17]) -> f64 {
    weights[rating.index()].max(MIN_STABILITY)
}

/// Initial difficulty for the first rating of a new card
pub fn initial_difficulty(rating: Rating) -> f64 {
    initial_difficulty_with_weights(rating, &FSRS45_WEIGHTS)
}

pub fn initial_difficulty_with_weights(rating: Rating, weights: &[f64; 17]) -> f64 {
    let g = rating.as_f64();
    (weights[4] - (g - 3.0) * weights[5]).clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

// ============================================================================
// DIFFICULTY
// ============================================================================

/// Difficulty after a review, mean-reverting towards the Easy baseline
pub fn next_difficulty(difficulty: f64, rating: Rating) -> f64 {
    next_difficulty_with_weights(difficulty, rating, &FSRS45_WEIGHTS)
}

pub fn next_difficulty_with_weights(difficulty: f64, rating: Rating, weights: &[f64; 17]) -> f64 {
    let g = rating.as_f64();
    let shifted = difficulty - weights[6] * (g - 3.0);
    let reverted = weights[7] * weights[4] + (1.0 - weights[7]) * shifted;
    reverted.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

// ============================================================================
// STABILITY
// ============================================================================

/// Stability after a successful recall (Hard, Good or Easy)
pub fn next_recall_stability(
    difficulty: f64,
    stability: f64,
    retrievability: f64,
    rating: Rating,
) -> f64 {
    next_recall_stability_with_weights(difficulty, stability, retrievability, rating, &FSRS45_WEIGHTS)
}

pub fn next_recall_stability_with_weights(
    difficulty: f64,
    stability: f64,
    retrievability: f64,
    rating: Rating,
    weights: &[f64; 17],
) -> f64 {
    let hard_penalty = if rating == Rating::Hard { weights[15] } else { 1.0 };
    let easy_bonus = if rating == Rating::Easy { weights[16] } else { 1.0 };

    let growth = weights[8].exp()
        * (11.0 - difficulty)
        * stability.powf(-weights[9])
        * (((1.0 - retrievability) * weights[10]).exp() - 1.0)
        * hard_penalty
        * easy_bonus;

    (stability * (1.0 + growth)).max(MIN_STABILITY)
}

/// Stability after a lapse (Again). Never exceeds the previous stability.
pub fn next_forget_stability(difficulty: f64, stability: f64, retrievability: f64) -> f64 {
    next_forget_stability_with_weights(difficulty, stability, retrievability, &FSRS45_WEIGHTS)
}

pub fn next_forget_stability_with_weights(
    difficulty: f64,
    stability: f64,
    retrievability: f64,
    weights: &[f64; 17],
) -> f64 {
    let forgotten = weights[11]
        * difficulty.powf(-weights[12])
        * ((stability + 1.0).powf(weights[13]) - 1.0)
        * ((1.0 - retrievability) * weights[14]).exp();

    forgotten.min(stability).max(MIN_STABILITY)
}

// ============================================================================
// INTERVAL
// ============================================================================

/// Whole-day interval at which retrievability falls to `request_retention`,
/// clamped to `[1, maximum_interval]`.
pub fn next_interval(stability: f64, request_retention: f64, maximum_interval: f64) -> f64 {
    let raw = stability / FACTOR * (request_retention.powf(1.0 / DECAY) - 1.0);
    let days = if raw.is_finite() { raw.round() } else { maximum_interval };
    days.clamp(1.0, maximum_interval.max(1.0))
}

// ============================================================================
// TESTS
// ============================================================================
