//! Card types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fsrs::MemoryState;

/// Card presentation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    #[default]
    Basic,
    Cloze,
}

impl CardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::Basic => "basic",
            CardType::Cloze => "cloze",
        }
    }
}

impl std::fmt::Display for CardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CardType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(CardType::Basic),
            "cloze" => Ok(CardType::Cloze),
            _ => Err(format!("Unknown card type: {}", s)),
        }
    }
}

/// A flashcard with its memory state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: i64,
    pub topic_id: String,
    pub front: String,
    pub back: String,
    pub card_type: CardType,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Scheduling fields, written only by review and undo
    #[serde(flatten)]
    pub memory: MemoryState,
}

/// Input for creating a card
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCard {
    pub topic_id: String,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub card_type: CardType,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewCard {
    pub fn basic(topic_id: impl Into<String>, front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            topic_id: topic_id.into(),
            front: front.into(),
            back: back.into(),
            card_type: CardType::Basic,
            image_url: None,
        }
    }
}

/// Partial content update. Memory fields are not editable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardUpdate {
    pub front: Option<String>,
    pub back: Option<String>,
    pub topic_id: Option<String>,
}

impl CardUpdate {
    pub fn is_empty(&self) -> bool {
        self.front.is_none() && self.back.is_none() && self.topic_id.is_none()
    }

    /// Whether the searchable text changes
    pub fn touches_text(&self) -> bool {
        self.front.is_some() || self.back.is_some()
    }
}
