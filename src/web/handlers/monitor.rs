//! Manual monitoring handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::competitor::MonitoredUrlRepository;
use crate::datetime::MAX_WINDOW_HOURS;
use crate::monitor::{CheckOutcome, PageChange};
use crate::pipeline::{run_cycle, CycleOptions, CycleReport};
use crate::web::dto::{
    bounded_window, ApiResponse, ChangesQuery, CheckUrlRequest, CheckUrlResponse, OptionalJson, RunMonitorRequest,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

const DEFAULT_CHANGE_HOURS: i64 = 24;
const DEFAULT_CHANGE_LIMIT: i64 = 50;
const MAX_CHANGE_LIMIT: i64 = 500;
const MAX_DAYS_BACK: i64 = 30;

impl RunMonitorRequest {
    /// Manual runs check every active page regardless of its interval.
    fn cycle_options(&self, default_days_back: i64) -> CycleOptions {
        CycleOptions {
            check_pages: self.pages,
            force_pages: true,
            collect_news: self.news,
            news_days_back: self
                .days_back
                .unwrap_or(default_days_back)
                .clamp(1, MAX_DAYS_BACK),
            analyze: self.analyze,
            notify: self.alert,
        }
    }
}

/// POST /api/monitor/run - Run a monitoring cycle now.
pub async fn run_monitor(
    State(state): State<Arc<AppState>>,
    OptionalJson(req): OptionalJson<RunMonitorRequest>,
) -> Result<Json<ApiResponse<CycleReport>>, ApiError> {
    let options = req.cycle_options(state.services.config.scheduler.news_days_back);
    let report = run_cycle(&state.services, options).await;
    Ok(Json(ApiResponse::new(report)))
}

impl From<CheckOutcome> for CheckUrlResponse {
    fn from(outcome: CheckOutcome) -> Self {
        let has_changes = outcome.has_changes();
        match outcome {
            CheckOutcome::Initial(snapshot) => CheckUrlResponse {
                outcome: "initial",
                has_changes,
                snapshot: Some(snapshot),
                error: None,
            },
            CheckOutcome::Unchanged => CheckUrlResponse {
                outcome: "unchanged",
                has_changes,
                snapshot: None,
                error: None,
            },
            CheckOutcome::Changed(snapshot) => CheckUrlResponse {
                outcome: "changed",
                has_changes,
                snapshot: Some(snapshot),
                error: None,
            },
            CheckOutcome::Failed(error) => CheckUrlResponse {
                outcome: "failed",
                has_changes,
                snapshot: None,
                error: Some(error),
            },
        }
    }
}

/// POST /api/monitor/check-url - Check one monitored URL now.
pub async fn check_url(
    State(state): State<Arc<AppState>>,
    OptionalJson(req): OptionalJson<CheckUrlRequest>,
) -> Result<Json<ApiResponse<CheckUrlResponse>>, ApiError> {
    let url_id = req
        .url_id
        .ok_or_else(|| ApiError::bad_request("url_id required"))?;

    let url = MonitoredUrlRepository::new(state.pool())
        .get_by_id(url_id)
        .await?
        .ok_or_else(|| ApiError::not_found("URL not found"))?;

    let outcome = state.services.monitor.check_url(&url).await?;
    Ok(Json(ApiResponse::new(outcome.into())))
}

/// GET /api/monitor/changes - Recently detected page changes.
pub async fn recent_changes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChangesQuery>,
) -> Result<Json<ApiResponse<Vec<PageChange>>>, ApiError> {
    let hours = bounded_window(
        query.hours.unwrap_or(DEFAULT_CHANGE_HOURS).max(1),
        "hours",
        MAX_WINDOW_HOURS,
    )?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_CHANGE_LIMIT)
        .clamp(1, MAX_CHANGE_LIMIT);

    let changes = state.services.monitor.recent_changes(hours, limit).await?;
    Ok(Json(ApiResponse::new(changes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_run_forces_pages() {
        let options = RunMonitorRequest::default().cycle_options(3);
        assert!(options.force_pages);
        assert!(options.check_pages && options.collect_news && options.analyze);
        assert!(!options.notify);
        assert_eq!(options.news_days_back, 3);

        let req = RunMonitorRequest {
            alert: true,
            days_back: Some(0),
            ..Default::default()
        };
        let options = req.cycle_options(3);
        assert!(options.notify);
        assert_eq!(options.news_days_back, 1);

        let req = RunMonitorRequest {
            days_back: Some(1_000_000_000),
            ..Default::default()
        };
        assert_eq!(req.cycle_options(3).news_days_back, MAX_DAYS_BACK);
    }

    #[test]
    fn test_failed_outcome() {
        let response = CheckUrlResponse::from(CheckOutcome::Failed("HTTP 503".into()));
        assert_eq!(response.outcome, "failed");
        assert!(!response.has_changes);
        assert_eq!(response.error.as_deref(), Some("HTTP 503"));
    }
}
