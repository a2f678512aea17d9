//! Router configuration for Web API.

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::*;
use super::middleware::create_cors_layer;

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let alert_routes = Router::new()
        .route("/", get(list_alerts).post(create_alert))
        .route("/:id", get(get_alert).patch(update_alert))
        .route("/:id/acknowledge", post(acknowledge_alert))
        .route("/:id/resolve", post(resolve_alert));

    let competitor_routes = Router::new()
        .route("/", get(list_competitors).post(create_competitor))
        .route(
            "/:id",
            get(get_competitor)
                .patch(update_competitor)
                .delete(delete_competitor),
        )
        .route(
            "/:id/urls",
            get(list_competitor_urls).post(create_competitor_url),
        );

    let url_routes = Router::new().route("/:id", patch(update_url).delete(delete_url));

    let news_routes = Router::new()
        .route("/", get(list_news))
        .route("/fetch", post(fetch_news));

    let monitor_routes = Router::new()
        .route("/run", post(run_monitor))
        .route("/check-url", post(check_url))
        .route("/changes", get(recent_changes));

    let insight_routes = Router::new()
        .route("/", get(list_insights))
        .route("/summary", get(insights_summary))
        .route("/generate", post(generate_insight))
        .route("/generate-batch", post(generate_batch))
        .route("/team/:team", get(list_team_insights))
        .route("/:id", get(get_insight))
        .route("/:id/team/:team", get(get_insight_for_team))
        .route("/:id/review", post(review_insight));

    let battle_card_routes = Router::new()
        .route("/", get(list_battle_cards).post(create_battle_card))
        .route("/generate", post(generate_battle_card))
        .route("/:id", get(get_battle_card).put(update_battle_card))
        .route("/:id/generate", post(enhance_battle_card));

    let win_loss_routes = Router::new()
        .route("/", get(list_win_loss).post(create_win_loss))
        .route("/stats", get(win_loss_stats));

    let playbook_routes = Router::new()
        .route("/", get(list_playbooks).post(create_playbook))
        .route("/:id", get(get_playbook));

    let feature_routes = Router::new()
        .route("/", get(list_features).post(create_feature))
        .route("/categories", get(list_feature_categories))
        .route("/matrix", get(feature_matrix))
        .route("/:id", put(update_feature));

    let export_routes = Router::new()
        .route("/alerts/pdf", get(export_alerts_pdf))
        .route("/alerts/csv", get(export_alerts_csv))
        .route("/news/csv", get(export_news_csv))
        .route("/features/csv", get(export_features_csv))
        .route("/alert/:id/pdf", get(export_alert_pdf))
        .route("/insight/:id/pdf", get(export_insight_pdf));

    let api_routes = Router::new()
        .route("/stats", get(get_stats))
        .route("/reports/summary", get(report_summary))
        .nest("/alerts", alert_routes)
        .nest("/competitors", competitor_routes)
        .nest("/urls", url_routes)
        .nest("/news", news_routes)
        .nest("/monitor", monitor_routes)
        .nest("/insights", insight_routes)
        .nest("/battle-cards", battle_card_routes)
        .nest("/win-loss", win_loss_routes)
        .nest("/playbooks", playbook_routes)
        .nest("/features", feature_routes)
        .nest("/export", export_routes);

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
