//! News handlers for Web API.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::competitor::CompetitorRepository;
use crate::datetime::MAX_WINDOW_DAYS;
use crate::news::{CollectionReport, NewsFilter, NewsItem, NewsRepository};
use crate::web::dto::{
    bounded_window, pagination, ApiResponse, CollectedHeadline, CompetitorCollection, FetchNewsRequest,
    NewsFetchResponse, NewsListQuery, OptionalJson, PaginatedResponse,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

const DEFAULT_NEWS_DAYS: i64 = 7;
const DEFAULT_DAYS_BACK: i64 = 3;
const MAX_DAYS_BACK: i64 = 30;
/// Headlines echoed back per competitor.
const HEADLINES_PER_COMPETITOR: usize = 3;

/// GET /api/news - List collected news.
///
/// Only relevant items are returned unless `relevant_only=false`.
pub async fn list_news(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NewsListQuery>,
) -> Result<Json<PaginatedResponse<NewsItem>>, ApiError> {
    let days = bounded_window(query.days.unwrap_or(DEFAULT_NEWS_DAYS), "days", MAX_WINDOW_DAYS)?;
    let filter = NewsFilter {
        competitor_id: query.competitor_id,
        days: (days > 0).then_some(days),
        relevant_only: query.relevant_only.unwrap_or(true),
    };
    let page = pagination(query.page, query.per_page);
    let (offset, limit) = page.to_offset_limit();

    let repo = NewsRepository::new(state.pool());
    let total = repo.count(&filter).await?;
    let items = repo.list(&filter, offset, limit).await?;

    Ok(Json(PaginatedResponse::new(
        items,
        page.page,
        page.per_page,
        total as u64,
    )))
}

fn fetch_response(reports: Vec<CollectionReport>) -> NewsFetchResponse {
    let collected = reports.iter().map(|r| r.new_items.len()).sum();
    let duplicates_skipped = reports.iter().map(|r| r.duplicates_skipped).sum();

    let headlines = reports
        .iter()
        .flat_map(|r| {
            r.new_items
                .iter()
                .take(HEADLINES_PER_COMPETITOR)
                .map(|item| CollectedHeadline {
                    title: item.title.clone(),
                    source: item.source.clone(),
                    competitor: r.competitor_name.clone(),
                })
        })
        .collect();

    let competitors = reports
        .into_iter()
        .map(|r| CompetitorCollection {
            competitor_id: r.competitor_id,
            name: r.competitor_name,
            fetched: r.fetched,
            duplicates_skipped: r.duplicates_skipped,
            filtered: r.filtered,
            new_items: r.new_items.len(),
        })
        .collect();

    NewsFetchResponse {
        collected,
        duplicates_skipped,
        competitors,
        headlines,
        message: format!("Collected {collected} new articles ({duplicates_skipped} duplicates skipped)"),
    }
}

/// POST /api/news/fetch - Collect news now for one or all competitors.
pub async fn fetch_news(
    State(state): State<Arc<AppState>>,
    OptionalJson(req): OptionalJson<FetchNewsRequest>,
) -> Result<Json<ApiResponse<NewsFetchResponse>>, ApiError> {
    let days_back = req.days_back.unwrap_or(DEFAULT_DAYS_BACK);
    if !(1..=MAX_DAYS_BACK).contains(&days_back) {
        return Err(ApiError::bad_request(format!(
            "days_back must be between 1 and {MAX_DAYS_BACK}"
        )));
    }

    let collector = &state.services.collector;
    let reports = match req.competitor_id {
        Some(id) => {
            let competitor = CompetitorRepository::new(state.pool())
                .get_by_id(id)
                .await?
                .ok_or_else(|| ApiError::not_found("Competitor not found"))?;
            vec![collector.collect_competitor(&competitor, days_back).await?]
        }
        None => collector.collect_all(days_back).await?,
    };

    Ok(Json(ApiResponse::new(fetch_response(reports))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(id: i64, title: &str) -> NewsItem {
        NewsItem {
            id,
            competitor_id: Some(1),
            competitor_name: Some("Fluke".into()),
            title: title.into(),
            description: None,
            content: None,
            url: format!("https://news.example.com/{id}"),
            source: Some("Trade Weekly".into()),
            author: None,
            published_at: None,
            collected_at: Utc::now(),
            is_processed: false,
            is_relevant: false,
        }
    }

    #[test]
    fn test_fetch_response_totals_and_headlines() {
        let reports = vec![
            CollectionReport {
                competitor_id: 1,
                competitor_name: "Fluke".into(),
                fetched: 9,
                duplicates_skipped: 2,
                filtered: 2,
                new_items: (1..=5).map(|i| item(i, &format!("Story {i}"))).collect(),
            },
            CollectionReport {
                competitor_id: 2,
                competitor_name: "Klein Tools".into(),
                fetched: 1,
                duplicates_skipped: 1,
                ..Default::default()
            },
        ];

        let response = fetch_response(reports);
        assert_eq!(response.collected, 5);
        assert_eq!(response.duplicates_skipped, 3);
        assert_eq!(response.headlines.len(), HEADLINES_PER_COMPETITOR);
        assert_eq!(response.headlines[0].competitor, "Fluke");
        assert_eq!(response.competitors[1].new_items, 0);
        assert_eq!(
            response.message,
            "Collected 5 new articles (3 duplicates skipped)"
        );
    }
}
