//! Insight types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default insight title.
pub const DEFAULT_INSIGHT_TITLE: &str = "Competitive Intelligence Update";

/// Default impact, urgency and confidence score.
pub const DEFAULT_SCORE: i64 = 50;

/// Score at or above which an insight counts as high impact or urgent.
pub const HIGH_SCORE: i64 = 70;

/// Team an insight section is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Sales,
    Marketing,
    Product,
    Engineering,
    Executive,
}

impl Team {
    pub fn as_str(&self) -> &'static str {
        match self {
            Team::Sales => "sales",
            Team::Marketing => "marketing",
            Team::Product => "product",
            Team::Engineering => "engineering",
            Team::Executive => "executive",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Team {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sales" => Ok(Team::Sales),
            "marketing" => Ok(Team::Marketing),
            "product" => Ok(Team::Product),
            "engineering" => Ok(Team::Engineering),
            "executive" => Ok(Team::Executive),
            _ => Err(format!("unknown team: {s}")),
        }
    }
}

/// Team-oriented intelligence derived from an alert, news item or ad-hoc content.
#[derive(Debug, Clone, Serialize)]
pub struct Insight {
    pub id: i64,
    pub alert_id: Option<i64>,
    pub news_item_id: Option<i64>,
    pub competitor_id: Option<i64>,
    pub competitor_name: Option<String>,
    pub title: String,
    pub executive_summary: Option<String>,
    pub competitor_product: Option<String>,
    pub our_product: Option<String>,
    pub comparison_summary: Option<String>,
    pub competitor_advantages: Vec<String>,
    pub our_advantages: Vec<String>,
    pub pricing_comparison: Option<String>,
    pub feature_comparison: Map<String, Value>,
    pub sales_insights: Map<String, Value>,
    pub marketing_insights: Map<String, Value>,
    pub product_insights: Map<String, Value>,
    pub engineering_insights: Map<String, Value>,
    pub executive_insights: Map<String, Value>,
    pub immediate_actions: Vec<String>,
    pub short_term_actions: Vec<String>,
    pub long_term_actions: Vec<String>,
    pub impact_score: i64,
    pub urgency_score: i64,
    pub confidence_score: i64,
    pub is_reviewed: bool,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Insight {
    /// The section written for `team`.
    pub fn team_insights(&self, team: Team) -> &Map<String, Value> {
        match team {
            Team::Sales => &self.sales_insights,
            Team::Marketing => &self.marketing_insights,
            Team::Product => &self.product_insights,
            Team::Engineering => &self.engineering_insights,
            Team::Executive => &self.executive_insights,
        }
    }
}

/// New insight for creation.
#[derive(Debug, Clone, Default)]
pub struct NewInsight {
    pub alert_id: Option<i64>,
    pub news_item_id: Option<i64>,
    pub competitor_id: Option<i64>,
    pub title: String,
    pub executive_summary: Option<String>,
    pub competitor_product: Option<String>,
    pub our_product: Option<String>,
    pub comparison_summary: Option<String>,
    pub competitor_advantages: Vec<String>,
    pub our_advantages: Vec<String>,
    pub pricing_comparison: Option<String>,
    pub feature_comparison: Map<String, Value>,
    pub sales_insights: Map<String, Value>,
    pub marketing_insights: Map<String, Value>,
    pub product_insights: Map<String, Value>,
    pub engineering_insights: Map<String, Value>,
    pub executive_insights: Map<String, Value>,
    pub immediate_actions: Vec<String>,
    pub short_term_actions: Vec<String>,
    pub long_term_actions: Vec<String>,
    pub impact_score: i64,
    pub urgency_score: i64,
    pub confidence_score: i64,
}

/// Where generated insight content came from.
#[derive(Debug, Clone, Default)]
pub struct InsightSource {
    pub alert_id: Option<i64>,
    pub news_item_id: Option<i64>,
    pub competitor_id: Option<i64>,
}

/// Dashboard roll-up of insights.
#[derive(Debug, Clone, Serialize)]
pub struct InsightSummary {
    pub period_days: i64,
    pub total: i64,
    pub unreviewed: i64,
    pub urgent: i64,
    pub average_impact: f64,
    pub average_urgency: f64,
    pub average_confidence: f64,
    pub high_impact_recent: Vec<Insight>,
}
