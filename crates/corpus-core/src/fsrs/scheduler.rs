//! FSRS Scheduler
//!
//! Turns the core formulas into card state transitions. Every
//! `(CardState, Rating)` pair is handled by an explicit match arm.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::algorithm::{
    initial_difficulty_with_weights, initial_stability_with_weights, next_difficulty_with_weights,
    next_forget_stability_with_weights, next_interval, next_recall_stability_with_weights,
    retrievability, DEFAULT_MAXIMUM_INTERVAL, DEFAULT_RETENTION, FSRS45_WEIGHTS,
    MAXIMUM_INTERVAL_CEILING,
};

const MS_PER_DAY: f64 = 86_400_000.0;

// ============================================================================
// RATING
// ============================================================================

/// Review rating, ordinal 1-4
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Rating {
    /// Forgot the answer
    Again = 1,
    /// Recalled with serious difficulty
    Hard = 2,
    /// Recalled after some hesitation
    Good = 3,
    /// Instant recall
    Easy = 4,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    /// Parse from the wire ordinal
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Rating::Again),
            2 => Some(Rating::Hard),
            3 => Some(Rating::Good),
            4 => Some(Rating::Easy),
            _ => None,
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub(crate) fn as_f64(self) -> f64 {
        self as i32 as f64
    }

    /// Zero-based index into the initial stability weights
    pub(crate) fn index(self) -> usize {
        self as usize - 1
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Again => "Again",
            Rating::Hard => "Hard",
            Rating::Good => "Good",
            Rating::Easy => "Easy",
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating as u8
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::from_i32(value as i32).ok_or_else(|| format!("Invalid rating: {}", value))
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "again" => Ok(Rating::Again),
            "2" | "hard" => Ok(Rating::Hard),
            "3" | "good" => Ok(Rating::Good),
            "4" | "easy" => Ok(Rating::Easy),
            _ => Err(format!("Unknown rating: {}", s)),
        }
    }
}

// ============================================================================
// CARD STATE
// ============================================================================

/// Discrete lifecycle stage of a card, persisted as 0-3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum CardState {
    #[default]
    New = 0,
    Learning = 1,
    Review = 2,
    Relearning = 3,
}

impl CardState {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(CardState::New),
            1 => Some(CardState::Learning),
            2 => Some(CardState::Review),
            3 => Some(CardState::Relearning),
            _ => None,
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CardState::New => "New",
            CardState::Learning => "Learning",
            CardState::Review => "Review",
            CardState::Relearning => "Relearning",
        }
    }
}

impl From<CardState> for u8 {
    fn from(state: CardState) -> Self {
        state as u8
    }
}

impl TryFrom<u8> for CardState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        CardState::from_i32(value as i32).ok_or_else(|| format!("Invalid card state: {}", value))
    }
}

impl std::fmt::Display for CardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// MEMORY STATE
// ============================================================================

/// Scheduling fields of a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryState {
    pub state: CardState,
    pub stability: f64,
    pub difficulty: f64,
    pub due: Option<DateTime<Utc>>,
    pub last_review: Option<DateTime<Utc>>,
    pub reps: i32,
    pub lapses: i32,
    /// Real days between the previous review and the latest one
    pub elapsed_days: f64,
    /// Real days between the latest review and `due`
    pub scheduled_days: f64,
}

impl MemoryState {
    /// State of a card that has never been scheduled
    pub fn new_card() -> Self {
        Self {
            state: CardState::New,
            stability: 0.0,
            difficulty: 0.0,
            due: None,
            last_review: None,
            reps: 0,
            lapses: 0,
            elapsed_days: 0.0,
            scheduled_days: 0.0,
        }
    }

    /// Whether the card may be presented at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.state {
            CardState::New => true,
            _ => self.due.is_some_and(|due| due <= now),
        }
    }
}

impl Default for MemoryState {
    fn default() -> Self {
        Self::new_card()
    }
}

// ============================================================================
// PARAMETERS
// ============================================================================

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FSRSParameters {
    /// Target probability of recall at the scheduled review
    pub request_retention: f64,
    /// Interval cap in days
    pub maximum_interval: f64,
    pub weights: [f64; 17],
}

impl Default for FSRSParameters {
    fn default() -> Self {
        Self {
            request_retention: DEFAULT_RETENTION,
            maximum_interval: DEFAULT_MAXIMUM_INTERVAL,
            weights: FSRS45_WEIGHTS,
        }
    }
}

/// Outcome of each rating for the same card at the same instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResults {
    pub again: MemoryState,
    pub hard: MemoryState,
    pub good: MemoryState,
    pub easy: MemoryState,
}

impl PreviewResults {
    pub fn get(&self, rating: Rating) -> &MemoryState {
        match rating {
            Rating::Again => &self.again,
            Rating::Hard => &self.hard,
            Rating::Good => &self.good,
            Rating::Easy => &self.easy,
        }
    }
}

// ============================================================================
// SCHEDULER
// ============================================================================

/// Short in-session steps for cards that have not graduated yet
fn learning_step(state: CardState, rating: Rating) -> Duration {
    match (state, rating) {
        (CardState::New, Rating::Again) => Duration::minutes(1),
        (CardState::New, Rating::Hard) => Duration::minutes(5),
        (CardState::New, Rating::Good) => Duration::minutes(10),
        (_, Rating::Hard) => Duration::minutes(10),
        _ => Duration::minutes(5),
    }
}

/// Real days between two instants, clamped at zero
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    ((to - from).num_milliseconds() as f64 / MS_PER_DAY).max(0.0)
}

/// Pure FSRS-4.5 scheduler
#[derive(Debug, Clone, Default)]
pub struct FSRSScheduler {
    params: FSRSParameters,
}

impl FSRSScheduler {
    pub fn new(params: FSRSParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &FSRSParameters {
        &self.params
    }

    /// Configured cap, kept within `[1, MAXIMUM_INTERVAL_CEILING]`
    fn maximum_interval(&self) -> f64 {
        let max = self.params.maximum_interval;
        if max.is_nan() {
            DEFAULT_MAXIMUM_INTERVAL
        } else {
            max.clamp(1.0, MAXIMUM_INTERVAL_CEILING)
        }
    }

    fn interval(&self, stability: f64) -> f64 {
        next_interval(stability, self.params.request_retention, self.maximum_interval())
    }

    fn cap(&self, days: f64) -> f64 {
        days.min(self.maximum_interval())
    }

    /// Compute the next memory state for `rating` applied at `now`.
    ///
    /// Total over all inputs: `now` earlier than the last review counts as
    /// zero elapsed time.
    pub fn review(&self, memory: &MemoryState, rating: Rating, now: DateTime<Utc>) -> MemoryState {
        let w = &self.params.weights;
        let elapsed_days = match (memory.state, memory.last_review) {
            (CardState::New, _) | (_, None) => 0.0,
            (_, Some(last)) => days_between(last, now),
        };

        let mut next = memory.clone();
        next.reps = memory.reps.saturating_add(1);
        next.last_review = Some(now);
        next.elapsed_days = elapsed_days;

        match memory.state {
            CardState::New => {
                next.stability = initial_stability_with_weights(rating, w);
                next.difficulty = initial_difficulty_with_weights(rating, w);
                match rating {
                    Rating::Again | Rating::Hard | Rating::Good => {
                        step(&mut next, CardState::Learning, learning_step(CardState::New, rating), now);
                    }
                    Rating::Easy => {
                        let days = self.interval(next.stability);
                        schedule(&mut next, days, now);
                    }
                }
            }

            CardState::Learning | CardState::Relearning => {
                let (stability, difficulty) = self.seeded(memory, rating);
                let r = retrievability(elapsed_days, stability);
                next.difficulty = next_difficulty_with_weights(difficulty, rating, w);

                match rating {
                    Rating::Again => {
                        next.stability = next_forget_stability_with_weights(difficulty, stability, r, w);
                        step(&mut next, memory.state, learning_step(memory.state, rating), now);
                    }
                    Rating::Hard => {
                        next.stability =
                            next_recall_stability_with_weights(difficulty, stability, r, rating, w);
                        step(&mut next, memory.state, learning_step(memory.state, rating), now);
                    }
                    Rating::Good => {
                        next.stability =
                            next_recall_stability_with_weights(difficulty, stability, r, rating, w);
                        let days = self.interval(next.stability);
                        schedule(&mut next, days, now);
                    }
                    Rating::Easy => {
                        let good_stability =
                            next_recall_stability_with_weights(difficulty, stability, r, Rating::Good, w);
                        next.stability =
                            next_recall_stability_with_weights(difficulty, stability, r, rating, w);
                        let good_days = self.interval(good_stability);
                        let days = self.cap(self.interval(next.stability).max(good_days + 1.0));
                        schedule(&mut next, days, now);
                    }
                }
            }

            CardState::Review => {
                let (stability, difficulty) = self.seeded(memory, rating);
                let r = retrievability(elapsed_days, stability);
                next.difficulty = next_difficulty_with_weights(difficulty, rating, w);

                match rating {
                    Rating::Again => {
                        next.stability = next_forget_stability_with_weights(difficulty, stability, r, w);
                        next.lapses = memory.lapses.saturating_add(1);
                        step(
                            &mut next,
                            CardState::Relearning,
                            learning_step(CardState::Review, rating),
                            now,
                        );
                    }
                    Rating::Hard | Rating::Good | Rating::Easy => {
                        let recall = |g: Rating| {
                            next_recall_stability_with_weights(difficulty, stability, r, g, w)
                        };
                        let hard_stability = recall(Rating::Hard);
                        let good_stability = recall(Rating::Good);
                        let easy_stability = recall(Rating::Easy);

                        let hard_days = self.interval(hard_stability).min(self.interval(good_stability));
                        let good_days = self.cap(self.interval(good_stability).max(hard_days + 1.0));
                        let easy_days = self.cap(self.interval(easy_stability).max(good_days + 1.0));

                        let (stability, days) = match rating {
                            Rating::Hard => (hard_stability, hard_days),
                            Rating::Good => (good_stability, good_days),
                            _ => (easy_stability, easy_days),
                        };
                        next.stability = stability;
                        schedule(&mut next, days, now);
                    }
                }
            }
        }

        next
    }

    /// Outcome of every rating without committing to one
    pub fn preview(&self, memory: &MemoryState, now: DateTime<Utc>) -> PreviewResults {
        PreviewResults {
            again: self.review(memory, Rating::Again, now),
            hard: self.review(memory, Rating::Hard, now),
            good: self.review(memory, Rating::Good, now),
            easy: self.review(memory, Rating::Easy, now),
        }
    }

    /// Current stability and difficulty, re-seeded when an approximate undo
    /// left them at zero on a scheduled card.
    fn seeded(&self, memory: &MemoryState, rating: Rating) -> (f64, f64) {
        let w = &self.params.weights;
        let stability = if memory.stability > 0.0 {
            memory.stability
        } else {
            initial_stability_with_weights(rating, w)
        };
        let difficulty = if memory.difficulty > 0.0 {
            memory.difficulty
        } else {
            initial_difficulty_with_weights(rating, w)
        };
        (stability, difficulty)
    }
}

fn step(next: &mut MemoryState, state: CardState, delay: Duration, now: DateTime<Utc>) {
    let due = now + delay;
    next.state = state;
    next.due = Some(due);
    next.scheduled_days = days_between(now, due);
}

fn schedule(next: &mut MemoryState, days: f64, now: DateTime<Utc>) {
    let due = now + Duration::days(days as i64);
    next.state = CardState::Review;
    next.due = Some(due);
    next.scheduled_days = days_between(now, due);
}

// ============================================================================
// TESTS
// ============================================================================
