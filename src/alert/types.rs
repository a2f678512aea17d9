//! Alert types and classification enums.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of competitive signal an alert represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    ProductLaunch,
    PricingChange,
    FeatureUpdate,
    Partnership,
    Acquisition,
    LeadershipChange,
    MarketingCampaign,
    Certification,
    Expansion,
    Regulatory,
    #[default]
    Other,
}

impl SignalType {
    /// Every signal type, in display order.
    pub const ALL: [SignalType; 11] = [
        SignalType::ProductLaunch,
        SignalType::PricingChange,
        SignalType::FeatureUpdate,
        SignalType::Partnership,
        SignalType::Acquisition,
        SignalType::LeadershipChange,
        SignalType::MarketingCampaign,
        SignalType::Certification,
        SignalType::Expansion,
        SignalType::Regulatory,
        SignalType::Other,
    ];

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::ProductLaunch => "product_launch",
            SignalType::PricingChange => "pricing_change",
            SignalType::FeatureUpdate => "feature_update",
            SignalType::Partnership => "partnership",
            SignalType::Acquisition => "acquisition",
            SignalType::LeadershipChange => "leadership_change",
            SignalType::MarketingCampaign => "marketing_campaign",
            SignalType::Certification => "certification",
            SignalType::Expansion => "expansion",
            SignalType::Regulatory => "regulatory",
            SignalType::Other => "other",
        }
    }

    /// Human-readable label, e.g. "Product Launch".
    pub fn title(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SignalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        SignalType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown signal type: {s}"))
    }
}

/// Risk level of an alert, ordered by priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Critical,
    High,
    #[default]
    Medium,
    Low,
    Info,
}

impl RiskLevel {
    /// Every risk level, most severe first.
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::Critical,
        RiskLevel::High,
        RiskLevel::Medium,
        RiskLevel::Low,
        RiskLevel::Info,
    ];

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "critical",
            RiskLevel::High => "high",
            RiskLevel::Medium => "medium",
            RiskLevel::Low => "low",
            RiskLevel::Info => "info",
        }
    }

    /// Numeric priority (critical = 5 ... info = 1).
    pub fn priority(&self) -> u8 {
        match self {
            RiskLevel::Critical => 5,
            RiskLevel::High => 4,
            RiskLevel::Medium => 3,
            RiskLevel::Low => 2,
            RiskLevel::Info => 1,
        }
    }

    /// Levels at or above this one.
    pub fn at_least(&self) -> Vec<RiskLevel> {
        RiskLevel::ALL
            .into_iter()
            .filter(|l| l.priority() >= self.priority())
            .collect()
    }

    /// Whether this level triggers automatic insight generation.
    pub fn is_significant(&self) -> bool {
        self.priority() >= RiskLevel::High.priority()
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(RiskLevel::Critical),
            "high" => Ok(RiskLevel::High),
            "medium" => Ok(RiskLevel::Medium),
            "low" => Ok(RiskLevel::Low),
            "info" => Ok(RiskLevel::Info),
            _ => Err(format!("unknown risk level: {s}")),
        }
    }
}

/// Triage status of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    #[default]
    New,
    Acknowledged,
    InProgress,
    Resolved,
    Dismissed,
}

impl AlertStatus {
    /// Statuses that still need attention.
    pub const UNRESOLVED: [AlertStatus; 3] = [
        AlertStatus::New,
        AlertStatus::Acknowledged,
        AlertStatus::InProgress,
    ];

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::New => "new",
            AlertStatus::Acknowledged => "acknowledged",
            AlertStatus::InProgress => "in_progress",
            AlertStatus::Resolved => "resolved",
            AlertStatus::Dismissed => "dismissed",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AlertStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(AlertStatus::New),
            "acknowledged" => Ok(AlertStatus::Acknowledged),
            "in_progress" => Ok(AlertStatus::InProgress),
            "resolved" => Ok(AlertStatus::Resolved),
            "dismissed" => Ok(AlertStatus::Dismissed),
            _ => Err(format!("unknown alert status: {s}")),
        }
    }
}

/// What produced an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    PageChange,
    News,
    #[default]
    Manual,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::PageChange => "page_change",
            SourceType::News => "news",
            SourceType::Manual => "manual",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "page_change" => Ok(SourceType::PageChange),
            "news" => Ok(SourceType::News),
            "manual" => Ok(SourceType::Manual),
            _ => Err(format!("unknown source type: {s}")),
        }
    }
}

/// A recommended follow-up action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedAction {
    pub action: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl RecommendedAction {
    pub fn new(action: &str, owner: &str, priority: &str) -> Self {
        Self {
            action: action.to_string(),
            owner: owner.to_string(),
            priority: priority.to_string(),
            rationale: None,
        }
    }
}

/// An alert raised for a competitor signal.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub id: i64,
    pub competitor_id: i64,
    pub competitor_name: Option<String>,
    pub source_type: SourceType,
    pub source_id: Option<i64>,
    pub source_url: Option<String>,
    pub title: String,
    pub summary: Option<String>,
    #[serde(skip_serializing)]
    pub raw_content: Option<String>,
    pub diff_content: Option<String>,
    pub signal_type: SignalType,
    pub risk_level: RiskLevel,
    pub risk_score: Option<i64>,
    pub confidence_score: Option<i64>,
    /// Full model output.
    pub analysis: Option<serde_json::Value>,
    pub relevance_explanation: Option<String>,
    pub assumptions: Option<String>,
    pub recommended_actions: Vec<RecommendedAction>,
    pub playbook_used: Option<String>,
    pub status: AlertStatus,
    pub assigned_to: Option<String>,
    pub resolution_notes: Option<String>,
    pub detected_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub notification_sent: bool,
    pub notification_channels: Option<String>,
}

impl Alert {
    /// Channels the alert was already delivered to.
    pub fn sent_channels(&self) -> Vec<&str> {
        self.notification_channels
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect()
    }
}

/// New alert for creation.
#[derive(Debug, Clone, Default)]
pub struct NewAlert {
    pub competitor_id: i64,
    pub source_type: SourceType,
    pub source_id: Option<i64>,
    pub source_url: Option<String>,
    pub title: String,
    pub summary: Option<String>,
    pub raw_content: Option<String>,
    pub diff_content: Option<String>,
    pub signal_type: SignalType,
    pub risk_level: RiskLevel,
    pub risk_score: Option<i64>,
    pub confidence_score: Option<i64>,
    pub analysis: Option<serde_json::Value>,
    pub relevance_explanation: Option<String>,
    pub assumptions: Option<String>,
    pub recommended_actions: Vec<RecommendedAction>,
    pub playbook_used: Option<String>,
}

/// Alert triage update.
#[derive(Debug, Clone, Default)]
pub struct AlertUpdate {
    pub status: Option<AlertStatus>,
    pub assigned_to: Option<Option<String>>,
    pub resolution_notes: Option<Option<String>>,
}

impl AlertUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.assigned_to.is_none() && self.resolution_notes.is_none()
    }
}

/// Alert list filter.
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub status: Option<AlertStatus>,
    pub risk_levels: Vec<RiskLevel>,
    pub competitor_id: Option<i64>,
    pub signal_type: Option<SignalType>,
    /// Only alerts detected in the last N days.
    pub days: Option<i64>,
    /// Case-insensitive substring over title and summary.
    pub search: Option<String>,
}

/// Alert counts for the dashboard.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlertCounts {
    pub new_alerts_24h: i64,
    pub total_alerts: i64,
    pub unresolved_alerts: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_type_parse() {
        for t in SignalType::ALL {
            assert_eq!(t.as_str().parse::<SignalType>().unwrap(), t);
        }
        assert_eq!(" Partnership ".parse::<SignalType>(), Ok(SignalType::Partnership));
        assert!("rumor".parse::<SignalType>().is_err());
    }

    #[test]
    fn test_signal_type_title() {
        assert_eq!(SignalType::ProductLaunch.title(), "Product Launch");
        assert_eq!(SignalType::Other.title(), "Other");
    }

    #[test]
    fn test_risk_level_priority() {
        assert_eq!(RiskLevel::Critical.priority(), 5);
        assert_eq!(RiskLevel::Info.priority(), 1);
        assert_eq!(
            RiskLevel::High.at_least(),
            vec![RiskLevel::Critical, RiskLevel::High]
        );
        assert_eq!(RiskLevel::Info.at_least().len(), 5);
        assert!(RiskLevel::High.is_significant());
        assert!(!RiskLevel::Medium.is_significant());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("in_progress".parse::<AlertStatus>(), Ok(AlertStatus::InProgress));
        assert!("closed".parse::<AlertStatus>().is_err());
    }

    #[test]
    fn test_recommended_action_defaults() {
        let action: RecommendedAction =
            serde_json::from_str(r#"{"action": "Call the customer"}"#).unwrap();
        assert_eq!(action.owner, "");
        assert!(action.rationale.is_none());
        let json = serde_json::to_value(&action).unwrap();
        assert!(json.get("rationale").is_none());
    }
}
