//! Normalised model output.

use serde::Serialize;
use serde_json::{json, Value};

use super::playbook::{find_playbook, playbook_or_default, DEFAULT_PLAYBOOK};
use crate::alert::{RecommendedAction, RiskLevel, SignalType};
use crate::db::json::value_to_string_list;
use crate::llm::{score_field, string_field};

const DEFAULT_RISK_SCORE: i64 = 50;
const DEFAULT_CONFIDENCE_SCORE: i64 = 70;

/// Classification of one piece of content.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub signal_type: SignalType,
    pub risk_level: RiskLevel,
    pub risk_score: i64,
    pub confidence_score: i64,
    pub relevance_explanation: String,
    pub assumptions: Vec<String>,
    pub recommended_actions: Vec<RecommendedAction>,
    pub playbook_used: Option<String>,
    pub raw_analysis: Value,
}

impl AnalysisResult {
    /// Normalise a model response.
    ///
    /// Unknown enum values fall back to `other` and `medium`. The model's
    /// actions are followed by the actions of the playbook it picked.
    pub fn from_json(value: Value) -> Self {
        let signal_type = first_str(value.get("signal_type"))
            .and_then(|s| s.parse().ok())
            .unwrap_or(SignalType::Other);
        let risk_level = first_str(value.get("risk_level"))
            .and_then(|s| s.parse().ok())
            .unwrap_or(RiskLevel::Medium);

        let playbook_key = string_field(&value, "recommended_playbook")
            .unwrap_or_else(|| DEFAULT_PLAYBOOK.to_string());
        let playbook = playbook_or_default(&playbook_key);
        if find_playbook(&playbook_key).is_none() {
            tracing::debug!("Unknown playbook {:?}, using default actions", playbook_key);
        }

        let mut recommended_actions: Vec<RecommendedAction> = value
            .get("immediate_actions")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();
        recommended_actions.extend(playbook.actions());

        Self {
            summary: string_field(&value, "summary")
                .unwrap_or_else(|| "Analysis completed".to_string()),
            signal_type,
            risk_level,
            risk_score: score_field(&value, "risk_score", DEFAULT_RISK_SCORE),
            confidence_score: score_field(&value, "confidence_score", DEFAULT_CONFIDENCE_SCORE),
            relevance_explanation: string_field(&value, "relevance").unwrap_or_default(),
            assumptions: value
                .get("assumptions")
                .map(value_to_string_list)
                .unwrap_or_default(),
            recommended_actions,
            playbook_used: Some(playbook_key),
            raw_analysis: value,
        }
    }

    /// Result used when the model call fails.
    pub fn fallback(error: &str) -> Self {
        Self {
            summary: format!("Error analyzing content: {error}"),
            signal_type: SignalType::Other,
            risk_level: RiskLevel::Medium,
            risk_score: DEFAULT_RISK_SCORE,
            confidence_score: 0,
            relevance_explanation: "Analysis failed".to_string(),
            assumptions: vec!["Analysis could not be completed".to_string()],
            recommended_actions: vec![RecommendedAction::new(
                "Manual review required",
                "Competitive Intelligence",
                "high",
            )],
            playbook_used: None,
            raw_analysis: json!({ "error": error }),
        }
    }

    /// Assumptions as a bullet list.
    pub fn assumptions_text(&self) -> String {
        self.assumptions
            .iter()
            .map(|a| format!("• {a}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A string, or the first string of an array.
fn first_str(value: Option<&Value>) -> Option<&str> {
    match value? {
        Value::String(s) => Some(s.as_str()),
        Value::Array(items) => items.iter().find_map(|v| v.as_str()),
        _ => None,
    }
}
