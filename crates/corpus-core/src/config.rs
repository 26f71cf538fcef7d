//! Runtime configuration
//!
//! Read from `CORPUS_*` environment variables. Invalid values are logged and
//! replaced by defaults so a typo never prevents startup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::clock::DayBoundary;
use crate::fsrs::{
    FSRSParameters, DEFAULT_MAXIMUM_INTERVAL, DEFAULT_RETENTION, MAXIMUM_INTERVAL_CEILING,
};

/// Database file name inside the data directory
pub const DB_FILE_NAME: &str = "corpus.db";

pub const ENV_DATA_DIR: &str = "CORPUS_DATA_DIR";
pub const ENV_REQUEST_RETENTION: &str = "CORPUS_REQUEST_RETENTION";
pub const ENV_MAXIMUM_INTERVAL: &str = "CORPUS_MAXIMUM_INTERVAL";
pub const ENV_UTC_OFFSET_MINUTES: &str = "CORPUS_UTC_OFFSET_MINUTES";
pub const ENV_NEW_CARDS_PER_DAY: &str = "CORPUS_NEW_CARDS_PER_DAY";
pub const ENV_MAX_REVIEWS_PER_DAY: &str = "CORPUS_MAX_REVIEWS_PER_DAY";

/// Daily caps applied to review sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLimits {
    pub new_cards_per_day: i64,
    pub max_reviews_per_day: i64,
}

impl Default for ReviewLimits {
    fn default() -> Self {
        Self {
            new_cards_per_day: 20,
            max_reviews_per_day: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorpusConfig {
    /// Directory holding the database; platform default when `None`
    pub data_dir: Option<PathBuf>,
    pub parameters: FSRSParameters,
    /// UTC offset of the local study day, in minutes
    pub utc_offset_minutes: i32,
    pub limits: ReviewLimits,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            parameters: FSRSParameters::default(),
            utc_offset_minutes: 0,
            limits: ReviewLimits::default(),
        }
    }
}

impl CorpusConfig {
    /// Load from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|s| !s.trim().is_empty()) {
            config.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(retention) = parse_var::<f64, _>(&lookup, ENV_REQUEST_RETENTION) {
            if retention > 0.0 && retention < 1.0 {
                config.parameters.request_retention = retention;
            } else {
                tracing::warn!(
                    value = retention,
                    "{} must be in (0, 1), using {}",
                    ENV_REQUEST_RETENTION,
                    DEFAULT_RETENTION
                );
            }
        }

        if let Some(max) = parse_var::<f64, _>(&lookup, ENV_MAXIMUM_INTERVAL) {
            if max > MAXIMUM_INTERVAL_CEILING && max.is_finite() {
                tracing::warn!(
                    value = max,
                    "{} capped at {}",
                    ENV_MAXIMUM_INTERVAL,
                    MAXIMUM_INTERVAL_CEILING
                );
                config.parameters.maximum_interval = MAXIMUM_INTERVAL_CEILING;
            } else if max >= 1.0 && max.is_finite() {
                config.parameters.maximum_interval = max.floor();
            } else {
                tracing::warn!(
                    value = max,
                    "{} must be at least 1, using {}",
                    ENV_MAXIMUM_INTERVAL,
                    DEFAULT_MAXIMUM_INTERVAL
                );
            }
        }

        if let Some(minutes) = parse_var::<i32, _>(&lookup, ENV_UTC_OFFSET_MINUTES) {
            if DayBoundary::from_offset_minutes(minutes).is_some() {
                config.utc_offset_minutes = minutes;
            } else {
                tracing::warn!(value = minutes, "{} out of range, using UTC", ENV_UTC_OFFSET_MINUTES);
            }
        }

        if let Some(n) = parse_var::<i64, _>(&lookup, ENV_NEW_CARDS_PER_DAY) {
            config.limits.new_cards_per_day = n.max(0);
        }
        if let Some(n) = parse_var::<i64, _>(&lookup, ENV_MAX_REVIEWS_PER_DAY) {
            config.limits.max_reviews_per_day = n.max(0);
        }

        config
    }

    /// Override the data directory (command-line flag wins over environment)
    pub fn with_data_dir(mut self, dir: Option<PathBuf>) -> Self {
        if dir.is_some() {
            self.data_dir = dir;
        }
        self
    }

    /// Explicit database path, if a data directory was configured
    pub fn db_path(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(DB_FILE_NAME))
    }

    pub fn day_boundary(&self) -> DayBoundary {
        DayBoundary::from_offset_minutes(self.utc_offset_minutes).unwrap_or_default()
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}={:?}", key, raw);
            None
        }
    }
}
