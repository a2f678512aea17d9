//! Win/loss record types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default reporting window in days.
pub const DEFAULT_WINDOW_DAYS: i64 = 90;

/// Outcome of a competitive deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Won,
    Lost,
    NoDecision,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Won => "won",
            Outcome::Lost => "lost",
            Outcome::NoDecision => "no_decision",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "won" => Ok(Outcome::Won),
            "lost" => Ok(Outcome::Lost),
            "no_decision" => Ok(Outcome::NoDecision),
            _ => Err(format!("unknown outcome: {s}")),
        }
    }
}

/// A won, lost or stalled deal against a competitor.
#[derive(Debug, Clone, Serialize)]
pub struct WinLossRecord {
    pub id: i64,
    pub competitor_id: i64,
    pub competitor_name: Option<String>,
    pub deal_name: Option<String>,
    pub deal_value: Option<f64>,
    pub deal_currency: String,
    pub outcome: Outcome,
    pub outcome_date: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub customer_industry: Option<String>,
    pub customer_size: Option<String>,
    pub customer_region: Option<String>,
    pub primary_loss_reason: Option<String>,
    pub loss_reasons: Vec<String>,
    pub win_reasons: Vec<String>,
    pub decision_makers: Vec<String>,
    pub competitor_positioning: Option<String>,
    pub key_learnings: Option<String>,
    pub sales_rep: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// New record for creation.
#[derive(Debug, Clone)]
pub struct NewWinLossRecord {
    pub competitor_id: i64,
    pub outcome: Outcome,
    /// Defaults to now.
    pub outcome_date: Option<DateTime<Utc>>,
    pub deal_name: Option<String>,
    pub deal_value: Option<f64>,
    pub deal_currency: Option<String>,
    pub customer_name: Option<String>,
    pub customer_industry: Option<String>,
    pub customer_size: Option<String>,
    pub customer_region: Option<String>,
    pub primary_loss_reason: Option<String>,
    pub loss_reasons: Vec<String>,
    pub win_reasons: Vec<String>,
    pub decision_makers: Vec<String>,
    pub competitor_positioning: Option<String>,
    pub key_learnings: Option<String>,
    pub sales_rep: Option<String>,
}

impl NewWinLossRecord {
    pub fn new(competitor_id: i64, outcome: Outcome) -> Self {
        Self {
            competitor_id,
            outcome,
            outcome_date: None,
            deal_name: None,
            deal_value: None,
            deal_currency: None,
            customer_name: None,
            customer_industry: None,
            customer_size: None,
            customer_region: None,
            primary_loss_reason: None,
            loss_reasons: Vec::new(),
            win_reasons: Vec::new(),
            decision_makers: Vec::new(),
            competitor_positioning: None,
            key_learnings: None,
            sales_rep: None,
        }
    }
}

/// Filter for listing records.
#[derive(Debug, Clone)]
pub struct WinLossFilter {
    pub competitor_id: Option<i64>,
    pub outcome: Option<Outcome>,
    /// Only records with `outcome_date` within this many days.
    pub days: i64,
}

impl Default for WinLossFilter {
    fn default() -> Self {
        Self {
            competitor_id: None,
            outcome: None,
            days: DEFAULT_WINDOW_DAYS,
        }
    }
}

/// Win/loss aggregates over a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WinLossStats {
    pub total_records: usize,
    pub wins: usize,
    pub losses: usize,
    pub no_decision: usize,
    /// Percentage of decided deals won, rounded to one decimal.
    pub win_rate: f64,
    pub total_won_value: f64,
    pub total_lost_value: f64,
    /// Lost deals per primary loss reason.
    pub loss_reasons: BTreeMap<String, usize>,
}

impl WinLossStats {
    /// Aggregate a set of records.
    pub fn from_records(records: &[WinLossRecord]) -> Self {
        let mut stats = WinLossStats {
            total_records: records.len(),
            ..Default::default()
        };
        for record in records {
            let value = record.deal_value.unwrap_or_default();
            match record.outcome {
                Outcome::Won => {
                    stats.wins += 1;
                    stats.total_won_value += value;
                }
                Outcome::Lost => {
                    stats.losses += 1;
                    stats.total_lost_value += value;
                    if let Some(reason) = record.primary_loss_reason.as_deref().filter(|r| !r.is_empty()) {
                        *stats.loss_reasons.entry(reason.to_string()).or_insert(0) += 1;
                    }
                }
                Outcome::NoDecision => stats.no_decision += 1,
            }
        }

        let decided = stats.wins + stats.losses;
        if decided > 0 {
            let rate = stats.wins as f64 / decided as f64 * 100.0;
            stats.win_rate = (rate * 10.0).round() / 10.0;
        }
        stats
    }
}
