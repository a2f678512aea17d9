//! Battle card types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Version assigned to new cards.
pub const DEFAULT_VERSION: &str = "1.0";

/// Lifecycle of a battle card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleCardStatus {
    #[default]
    Draft,
    Active,
    Archived,
}

impl BattleCardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BattleCardStatus::Draft => "draft",
            BattleCardStatus::Active => "active",
            BattleCardStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for BattleCardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BattleCardStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(BattleCardStatus::Draft),
            "active" => Ok(BattleCardStatus::Active),
            "archived" => Ok(BattleCardStatus::Archived),
            _ => Err(format!("unknown battle card status: {s}")),
        }
    }
}

/// A customer objection and how to answer it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objection {
    pub objection: String,
    #[serde(default)]
    pub response: String,
}

/// Sales-facing comparison against one competitor.
#[derive(Debug, Clone, Serialize)]
pub struct BattleCard {
    pub id: i64,
    pub competitor_id: i64,
    pub competitor_name: Option<String>,
    pub name: String,
    pub version: String,
    pub status: BattleCardStatus,
    pub elevator_pitch: Option<String>,
    pub target_segment: Option<String>,
    pub our_strengths: Vec<String>,
    pub our_weaknesses: Vec<String>,
    pub competitor_strengths: Vec<String>,
    pub competitor_weaknesses: Vec<String>,
    pub key_differentiators: Vec<String>,
    pub trap_questions: Vec<String>,
    pub landmine_questions: Vec<String>,
    pub common_objections: Vec<Objection>,
    pub customer_wins: Vec<String>,
    pub pricing_comparison: Map<String, Value>,
    pub feature_comparison: Map<String, Value>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

/// New battle card for creation. Cards always start as drafts.
#[derive(Debug, Clone, Default)]
pub struct NewBattleCard {
    pub competitor_id: i64,
    pub name: String,
    pub elevator_pitch: Option<String>,
    pub target_segment: Option<String>,
    pub our_strengths: Vec<String>,
    pub our_weaknesses: Vec<String>,
    pub competitor_strengths: Vec<String>,
    pub competitor_weaknesses: Vec<String>,
    pub key_differentiators: Vec<String>,
    pub trap_questions: Vec<String>,
    pub landmine_questions: Vec<String>,
    pub common_objections: Vec<Objection>,
    pub customer_wins: Vec<String>,
    pub pricing_comparison: Map<String, Value>,
    pub feature_comparison: Map<String, Value>,
    pub created_by: Option<String>,
}

/// Partial battle card update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct BattleCardUpdate {
    pub name: Option<String>,
    pub status: Option<BattleCardStatus>,
    pub elevator_pitch: Option<Option<String>>,
    pub target_segment: Option<Option<String>>,
    pub our_strengths: Option<Vec<String>>,
    pub our_weaknesses: Option<Vec<String>>,
    pub competitor_strengths: Option<Vec<String>>,
    pub competitor_weaknesses: Option<Vec<String>>,
    pub key_differentiators: Option<Vec<String>>,
    pub trap_questions: Option<Vec<String>>,
    pub landmine_questions: Option<Vec<String>>,
    pub common_objections: Option<Vec<Objection>>,
    pub customer_wins: Option<Vec<String>>,
    pub pricing_comparison: Option<Map<String, Value>>,
    pub feature_comparison: Option<Map<String, Value>>,
    /// Stamp `last_reviewed_at` with the current time.
    pub mark_reviewed: bool,
}

/// Filter for listing battle cards.
#[derive(Debug, Clone, Default)]
pub struct BattleCardFilter {
    pub competitor_id: Option<i64>,
    pub status: Option<BattleCardStatus>,
}
