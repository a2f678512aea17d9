//! Request DTOs for the REST API.

use serde::Deserialize;
use validator::Validate;

use super::validation::not_blank;
use crate::alert::{AlertStatus, RiskLevel, SignalType};
use crate::battle_card::{BattleCardStatus, Objection};
use crate::competitor::PageType;
use crate::feature::{Capability, DifferentiationLevel};
use crate::win_loss::Outcome;

/// Default page size.
pub const DEFAULT_PER_PAGE: u32 = 20;
/// Upper bound on page size.
pub const MAX_PER_PAGE: u32 = 100;

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

fn default_true() -> bool {
    true
}

/// Page-based pagination.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationQuery {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }.normalized()
    }

    /// Clamp page to at least 1 and per_page to 1..=MAX_PER_PAGE.
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn to_offset_limit(&self) -> (i64, i64) {
        let p = self.normalized();
        (
            i64::from(p.page - 1) * i64::from(p.per_page),
            i64::from(p.per_page),
        )
    }
}

/// `GET /api/alerts` filters.
#[derive(Debug, Default, Deserialize)]
pub struct AlertListQuery {
    pub status: Option<String>,
    /// Minimum risk level ("high" also returns critical).
    pub risk: Option<String>,
    /// Exact risk level.
    pub risk_level: Option<String>,
    pub competitor_id: Option<i64>,
    pub signal_type: Option<String>,
    pub days: Option<i64>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// `GET /api/news` filters.
#[derive(Debug, Default, Deserialize)]
pub struct NewsListQuery {
    pub competitor_id: Option<i64>,
    pub days: Option<i64>,
    pub relevant_only: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// `GET /api/insights` filters.
#[derive(Debug, Default, Deserialize)]
pub struct InsightListQuery {
    pub team: Option<String>,
    pub competitor_id: Option<i64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// A look-back window in days.
#[derive(Debug, Default, Deserialize)]
pub struct DaysQuery {
    pub days: Option<i64>,
}

/// `GET /api/monitor/changes` window.
#[derive(Debug, Default, Deserialize)]
pub struct ChangesQuery {
    pub hours: Option<i64>,
    pub limit: Option<i64>,
}

/// Filters for the alert PDF summary.
#[derive(Debug, Default, Deserialize)]
pub struct AlertExportQuery {
    pub days: Option<i64>,
    pub risk_level: Option<String>,
    pub competitor_id: Option<i64>,
}

/// `GET /api/battle-cards` filters.
#[derive(Debug, Default, Deserialize)]
pub struct BattleCardQuery {
    pub competitor_id: Option<i64>,
    pub status: Option<String>,
}

/// `GET /api/win-loss` filters.
#[derive(Debug, Default, Deserialize)]
pub struct WinLossQuery {
    pub competitor_id: Option<i64>,
    pub outcome: Option<String>,
    pub days: Option<i64>,
}

/// `GET /api/playbooks` filter.
#[derive(Debug, Default, Deserialize)]
pub struct PlaybookQuery {
    /// Only active playbooks (default true).
    pub active: Option<bool>,
}

/// `GET /api/features` filter.
#[derive(Debug, Default, Deserialize)]
pub struct FeatureQuery {
    pub category: Option<String>,
}

/// Build a [`PaginationQuery`] from optional query parameters.
pub fn pagination(page: Option<u32>, per_page: Option<u32>) -> PaginationQuery {
    PaginationQuery::new(
        page.unwrap_or_else(default_page),
        per_page.unwrap_or_else(default_per_page),
    )
}

// ============================================================================
// Competitors and URLs
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCompetitorRequest {
    #[validate(
        length(min = 1, max = 200, message = "Name must be 1-200 characters"),
        custom(function = "not_blank")
    )]
    pub name: String,
    pub description: Option<String>,
    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,
    #[validate(url(message = "Logo URL must be a valid URL"))]
    pub logo_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCompetitorRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,
    #[validate(url(message = "Logo URL must be a valid URL"))]
    pub logo_url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUrlRequest {
    #[validate(url(message = "Must be a valid URL"))]
    pub url: String,
    pub name: Option<String>,
    pub page_type: Option<PageType>,
    #[validate(range(min = 1, max = 720, message = "Interval must be 1-720 hours"))]
    pub check_interval_hours: Option<i64>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUrlRequest {
    #[validate(url(message = "Must be a valid URL"))]
    pub url: Option<String>,
    pub name: Option<String>,
    pub page_type: Option<PageType>,
    #[validate(range(min = 1, max = 720, message = "Interval must be 1-720 hours"))]
    pub check_interval_hours: Option<i64>,
    pub is_active: Option<bool>,
}

// ============================================================================
// Alerts
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAlertRequest {
    pub status: Option<AlertStatus>,
    pub assigned_to: Option<String>,
    pub resolution_notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResolveAlertRequest {
    pub notes: Option<String>,
}

/// Manually raised alert.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAlertRequest {
    pub competitor_id: i64,
    #[validate(
        length(min = 1, max = 500, message = "Title must be 1-500 characters"),
        custom(function = "not_blank")
    )]
    pub title: String,
    pub summary: Option<String>,
    #[validate(url(message = "Source URL must be a valid URL"))]
    pub source_url: Option<String>,
    pub signal_type: Option<SignalType>,
    pub risk_level: Option<RiskLevel>,
    #[validate(range(min = 0, max = 100, message = "Score must be 0-100"))]
    pub risk_score: Option<i64>,
    #[validate(range(min = 0, max = 100, message = "Score must be 0-100"))]
    pub confidence_score: Option<i64>,
    pub relevance_explanation: Option<String>,
    /// Send notifications for the new alert.
    #[serde(default)]
    pub notify: bool,
}

// ============================================================================
// News and monitoring
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct FetchNewsRequest {
    pub competitor_id: Option<i64>,
    pub days_back: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RunMonitorRequest {
    #[serde(default = "default_true")]
    pub pages: bool,
    #[serde(default = "default_true")]
    pub news: bool,
    #[serde(default = "default_true")]
    pub analyze: bool,
    #[serde(default)]
    pub alert: bool,
    pub days_back: Option<i64>,
}

impl Default for RunMonitorRequest {
    fn default() -> Self {
        Self {
            pages: true,
            news: true,
            analyze: true,
            alert: false,
            days_back: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckUrlRequest {
    pub url_id: Option<i64>,
}

// ============================================================================
// Insights
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct GenerateInsightRequest {
    pub alert_id: Option<i64>,
    pub news_item_id: Option<i64>,
    pub content: Option<String>,
    pub competitor_id: Option<i64>,
    pub competitor_name: Option<String>,
    pub source_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateBatchRequest {
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewInsightRequest {
    pub reviewed_by: Option<String>,
    pub notes: Option<String>,
}

// ============================================================================
// Battle cards and win/loss
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBattleCardRequest {
    pub competitor_id: i64,
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    pub elevator_pitch: Option<String>,
    pub target_segment: Option<String>,
    #[serde(default)]
    pub our_strengths: Vec<String>,
    #[serde(default)]
    pub our_weaknesses: Vec<String>,
    #[serde(default)]
    pub competitor_strengths: Vec<String>,
    #[serde(default)]
    pub competitor_weaknesses: Vec<String>,
    #[serde(default)]
    pub key_differentiators: Vec<String>,
    #[serde(default)]
    pub trap_questions: Vec<String>,
    #[serde(default)]
    pub landmine_questions: Vec<String>,
    #[serde(default)]
    pub common_objections: Vec<Objection>,
    #[serde(default)]
    pub customer_wins: Vec<String>,
    #[serde(default)]
    pub pricing_comparison: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub feature_comparison: serde_json::Map<String, serde_json::Value>,
    pub created_by: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateBattleCardRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    pub status: Option<BattleCardStatus>,
    pub elevator_pitch: Option<String>,
    pub target_segment: Option<String>,
    pub our_strengths: Option<Vec<String>>,
    pub our_weaknesses: Option<Vec<String>>,
    pub competitor_strengths: Option<Vec<String>>,
    pub competitor_weaknesses: Option<Vec<String>>,
    pub key_differentiators: Option<Vec<String>>,
    pub trap_questions: Option<Vec<String>>,
    pub landmine_questions: Option<Vec<String>>,
    pub common_objections: Option<Vec<Objection>>,
    pub customer_wins: Option<Vec<String>>,
    pub pricing_comparison: Option<serde_json::Map<String, serde_json::Value>>,
    pub feature_comparison: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub mark_reviewed: bool,
}

#[derive(Debug, Deserialize)]
pub struct GenerateBattleCardRequest {
    pub competitor_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWinLossRequest {
    pub competitor_id: i64,
    pub outcome: Outcome,
    /// RFC 3339 timestamp or `YYYY-MM-DD`.
    pub outcome_date: Option<String>,
    pub deal_name: Option<String>,
    #[validate(range(min = 0.0, message = "Deal value cannot be negative"))]
    pub deal_value: Option<f64>,
    #[validate(length(equal = 3, message = "Currency must be a 3-letter code"))]
    pub deal_currency: Option<String>,
    pub customer_name: Option<String>,
    pub customer_industry: Option<String>,
    pub customer_size: Option<String>,
    pub customer_region: Option<String>,
    pub primary_loss_reason: Option<String>,
    #[serde(default)]
    pub loss_reasons: Vec<String>,
    #[serde(default)]
    pub win_reasons: Vec<String>,
    #[serde(default)]
    pub decision_makers: Vec<String>,
    pub competitor_positioning: Option<String>,
    pub key_learnings: Option<String>,
    pub sales_rep: Option<String>,
}

// ============================================================================
// Playbooks and feature comparisons
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlaybookRequest {
    #[validate(
        length(min = 1, max = 200, message = "Name must be 1-200 characters"),
        custom(function = "not_blank")
    )]
    pub name: String,
    #[validate(length(max = 100, message = "Slug must be at most 100 characters"))]
    pub slug: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub trigger_signal_types: Vec<String>,
    #[serde(default)]
    pub trigger_keywords: Vec<String>,
    #[serde(default)]
    pub sales_actions: Vec<String>,
    #[serde(default)]
    pub marketing_actions: Vec<String>,
    #[serde(default)]
    pub product_actions: Vec<String>,
    #[serde(default)]
    pub executive_actions: Vec<String>,
    #[serde(default)]
    pub email_templates: Vec<serde_json::Value>,
    #[serde(default)]
    pub talk_tracks: Vec<serde_json::Value>,
    pub escalation_criteria: Option<String>,
    #[serde(default)]
    pub escalation_contacts: Vec<String>,
    #[validate(range(min = 1, max = 10, message = "Priority must be between 1 and 10"))]
    pub priority: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFeatureRequest {
    #[validate(
        length(min = 1, max = 100, message = "Category must be 1-100 characters"),
        custom(function = "not_blank")
    )]
    pub category: String,
    #[validate(
        length(min = 1, max = 200, message = "Feature name must be 1-200 characters"),
        custom(function = "not_blank")
    )]
    pub feature_name: String,
    pub description: Option<String>,
    pub our_capability: Option<Capability>,
    pub our_details: Option<String>,
    #[serde(default)]
    pub competitor_capabilities: serde_json::Map<String, serde_json::Value>,
    #[validate(range(min = 1, max = 10, message = "Importance must be between 1 and 10"))]
    pub customer_importance: Option<i64>,
    pub differentiation_level: Option<DifferentiationLevel>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateFeatureRequest {
    #[validate(length(min = 1, max = 100, message = "Category must be 1-100 characters"))]
    pub category: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Feature name must be 1-200 characters"))]
    pub feature_name: Option<String>,
    pub description: Option<String>,
    pub our_capability: Option<Capability>,
    pub our_details: Option<String>,
    pub competitor_capabilities: Option<serde_json::Map<String, serde_json::Value>>,
    #[validate(range(min = 1, max = 10, message = "Importance must be between 1 and 10"))]
    pub customer_importance: Option<i64>,
    pub differentiation_level: Option<DifferentiationLevel>,
    pub verified_by: Option<String>,
}
