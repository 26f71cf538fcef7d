//! Pillar / domain / topic hierarchy and the topic graph

use serde::{Deserialize, Serialize};

/// Top-level area of study
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pillar {
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub sort_order: i32,
}

/// Subject area inside a pillar. Tier 1 is deep mastery, 3 is curated links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: String,
    pub pillar_id: String,
    pub name: String,
    pub tier: i32,
    pub sort_order: i32,
}

/// Leaf of the taxonomy; cards attach here
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    pub domain_id: String,
    pub name: String,
    pub content_path: Option<String>,
    pub sort_order: i32,
}

/// Directed relation between two topics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: i64,
    pub source_id: String,
    pub target_id: String,
    pub relation: String,
    pub weight: f64,
}

/// Topic node with card counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    pub domain_id: String,
    pub pillar_id: String,
    pub tier: i32,
    pub card_count: i64,
    pub mastered_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: i64,
    pub source: String,
    pub target: String,
    pub relation: String,
    pub weight: f64,
}
