//! Export API tests.

mod common;

use axum::http::{header, StatusCode};
use common::{create_test_server, seed_alert, seed_competitor, INSIGHT_RESPONSE};
use rivalwatch::alert::{RiskLevel, SignalType};
use rivalwatch::news::{NewNewsItem, NewsRepository};
use serde_json::{json, Value};

fn assert_attachment(response: &axum_test::TestResponse, content_type: &str, prefix: &str) {
    assert_eq!(
        response.header(header::CONTENT_TYPE).to_str().unwrap(),
        content_type
    );
    let disposition = response.header(header::CONTENT_DISPOSITION);
    let disposition = disposition.to_str().unwrap();
    assert!(
        disposition.starts_with(&format!("attachment; filename=\"{prefix}")),
        "unexpected disposition: {disposition}"
    );
}

#[tokio::test]
async fn test_alerts_csv() {
    let (server, services) = create_test_server(&[]).await;
    let competitor = seed_competitor(&services, "Fluke").await;
    seed_alert(
        &services,
        competitor.id,
        "Fluke, Inc. cuts prices",
        SignalType::PricingChange,
        RiskLevel::High,
    )
    .await;
    seed_alert(
        &services,
        competitor.id,
        "Fluke blog post",
        SignalType::Other,
        RiskLevel::Info,
    )
    .await;

    let response = server.get("/api/export/alerts/csv").await;
    response.assert_status_ok();
    assert_attachment(&response, "text/csv; charset=utf-8", "alerts_export_");

    let text = response.text();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap().trim_start_matches('\u{feff}'),
        "id,title,competitor,risk_level,signal_type,risk_score,summary,source_url,status,detected_at"
    );
    assert_eq!(lines.count(), 2);
    assert!(text.contains("\"Fluke, Inc. cuts prices\""));

    let response = server
        .get("/api/export/alerts/csv")
        .add_query_param("risk_level", "high")
        .await;
    let text = response.text();
    assert_eq!(text.lines().count(), 2);
    assert!(!text.contains("Fluke blog post"));
}

#[tokio::test]
async fn test_alerts_export_validation() {
    let (server, _) = create_test_server(&[]).await;

    server
        .get("/api/export/alerts/csv")
        .add_query_param("days", 0)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/api/export/alerts/pdf")
        .add_query_param("risk_level", "extreme")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/api/export/news/csv")
        .add_query_param("days", -1)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_alerts_pdf() {
    let (server, services) = create_test_server(&[]).await;
    let competitor = seed_competitor(&services, "Megger").await;
    seed_alert(
        &services,
        competitor.id,
        "Megger launches a tester",
        SignalType::ProductLaunch,
        RiskLevel::Critical,
    )
    .await;

    let response = server.get("/api/export/alerts/pdf").await;
    response.assert_status_ok();
    assert_attachment(&response, "application/pdf", "alerts_summary_");
    assert!(response.as_bytes().starts_with(b"%PDF"));

    // An empty window still renders a document
    let (server, _) = create_test_server(&[]).await;
    let response = server.get("/api/export/alerts/pdf").await;
    response.assert_status_ok();
    assert!(response.as_bytes().starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_single_alert_pdf() {
    let (server, services) = create_test_server(&[]).await;
    let competitor = seed_competitor(&services, "Megger").await;
    let alert = seed_alert(
        &services,
        competitor.id,
        "Megger acquires a rival",
        SignalType::Acquisition,
        RiskLevel::High,
    )
    .await;

    let response = server
        .get(&format!("/api/export/alert/{}/pdf", alert.id))
        .await;
    response.assert_status_ok();
    assert_attachment(
        &response,
        "application/pdf",
        &format!("alert_{}_", alert.id),
    );
    assert!(response.as_bytes().starts_with(b"%PDF"));

    server
        .get("/api/export/alert/999/pdf")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_insight_pdf() {
    let (server, _) = create_test_server(&[INSIGHT_RESPONSE]).await;
    let body: Value = server
        .post("/api/insights/generate")
        .json(&json!({"content": "Fluke price cut", "competitor_name": "Fluke"}))
        .await
        .json();
    let id = body["data"]["id"].as_i64().unwrap();

    let response = server.get(&format!("/api/export/insight/{id}/pdf")).await;
    response.assert_status_ok();
    assert_attachment(&response, "application/pdf", &format!("insight_{id}_"));
    assert!(response.as_bytes().starts_with(b"%PDF"));

    server
        .get("/api/export/insight/999/pdf")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_news_csv() {
    let (server, services) = create_test_server(&[]).await;
    let competitor = seed_competitor(&services, "Extech").await;
    NewsRepository::new(services.db.pool())
        .create(&NewNewsItem {
            competitor_id: Some(competitor.id),
            title: "Extech ships a new hygrometer".into(),
            url: "https://news.example.com/extech-hygrometer".into(),
            source: Some("Trade Press".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    let response = server.get("/api/export/news/csv").await;
    response.assert_status_ok();
    assert_attachment(&response, "text/csv; charset=utf-8", "news_export_");

    let text = response.text();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap().trim_start_matches('\u{feff}'),
        "id,title,source,url,published_at,collected_at,is_processed,is_relevant"
    );
    let row = lines.next().unwrap();
    assert!(row.contains("Extech ships a new hygrometer"));
    assert!(row.contains("https://news.example.com/extech-hygrometer"));
    assert!(lines.next().is_none());
}
