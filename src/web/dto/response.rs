//! Response DTOs for the REST API.
//!
//! Domain types serialize directly; the structs here only add the envelope
//! and the shapes that exist solely for the API.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::alert::{Alert, AlertCounts};
use crate::competitor::{CompetitorSummary, MonitoredUrl};
use crate::insight::{Insight, Team};
use crate::monitor::PageSnapshot;

// ============================================================================
// Generic Response Wrappers
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        let pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(u64::from(per_page))
        };
        Self {
            data,
            meta: PaginationMeta {
                page,
                per_page,
                total,
                pages,
            },
        }
    }
}

/// Pagination metadata.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub pages: u64,
}

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StatsSummary {
    #[serde(flatten)]
    pub alerts: AlertCounts,
    pub competitors_monitored: i64,
    pub urls_monitored: i64,
}

/// Per-competitor dashboard row.
#[derive(Debug, Serialize)]
pub struct CompetitorStat {
    pub id: i64,
    pub name: String,
    pub new_alerts: i64,
    pub urls_monitored: i64,
}

/// `GET /api/stats`.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub summary: StatsSummary,
    /// Every risk level, including zero counts.
    pub risk_distribution: BTreeMap<String, i64>,
    /// Only signal types that occur.
    pub signal_distribution: BTreeMap<String, i64>,
    pub competitor_stats: Vec<CompetitorStat>,
    pub recent_alerts: Vec<Alert>,
}

/// `GET /api/competitors/{id}`.
#[derive(Debug, Serialize)]
pub struct CompetitorDetailResponse {
    #[serde(flatten)]
    pub competitor: CompetitorSummary,
    pub monitored_urls: Vec<MonitoredUrl>,
    pub recent_alerts: Vec<Alert>,
}

/// Reporting period.
#[derive(Debug, Serialize)]
pub struct ReportPeriod {
    pub days: i64,
    pub start: String,
    pub end: String,
}

/// `GET /api/reports/summary`.
#[derive(Debug, Serialize)]
pub struct ReportSummaryResponse {
    pub period: ReportPeriod,
    pub total_alerts: usize,
    pub by_competitor: BTreeMap<String, Vec<Alert>>,
    pub by_risk_level: BTreeMap<String, Vec<Alert>>,
    pub by_signal_type: BTreeMap<String, Vec<Alert>>,
}

// ============================================================================
// Monitoring and news
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CompetitorCollection {
    pub competitor_id: i64,
    pub name: String,
    pub fetched: usize,
    pub duplicates_skipped: usize,
    pub filtered: usize,
    pub new_items: usize,
}

/// A collected headline.
#[derive(Debug, Serialize)]
pub struct CollectedHeadline {
    pub title: String,
    pub source: Option<String>,
    pub competitor: String,
}

/// `POST /api/news/fetch`.
#[derive(Debug, Serialize)]
pub struct NewsFetchResponse {
    pub collected: usize,
    pub duplicates_skipped: usize,
    pub competitors: Vec<CompetitorCollection>,
    /// First few new headlines per competitor.
    pub headlines: Vec<CollectedHeadline>,
    pub message: String,
}

/// `POST /api/monitor/check-url`.
#[derive(Debug, Serialize)]
pub struct CheckUrlResponse {
    /// One of `initial`, `unchanged`, `changed`, `failed`.
    pub outcome: &'static str,
    pub has_changes: bool,
    pub snapshot: Option<PageSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Insights
// ============================================================================

/// An insight, optionally with one team's section pulled out.
#[derive(Debug, Serialize)]
pub struct TeamInsightResponse {
    #[serde(flatten)]
    pub insight: Insight,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focused_team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_insights: Option<Map<String, Value>>,
}

impl TeamInsightResponse {
    /// Focus on `team` when given.
    pub fn new(insight: Insight, team: Option<Team>) -> Self {
        let team_insights = team.map(|t| insight.team_insights(t).clone());
        Self {
            focused_team: team.map(|t| t.as_str().to_string()),
            team_insights,
            insight,
        }
    }
}

/// `POST /api/insights/generate-batch`.
#[derive(Debug, Serialize)]
pub struct BatchInsightResponse {
    pub count: usize,
    pub insights: Vec<Insight>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginated_pages() {
        let resp = PaginatedResponse::new(vec![1, 2], 1, 20, 41);
        assert_eq!(resp.meta.pages, 3);
        let resp: PaginatedResponse<i32> = PaginatedResponse::new(vec![], 1, 20, 0);
        assert_eq!(resp.meta.pages, 0);
    }

    #[test]
    fn test_envelope() {
        let json = serde_json::to_value(ApiResponse::new("ok")).unwrap();
        assert_eq!(json, serde_json::json!({"data": "ok"}));
    }
}
