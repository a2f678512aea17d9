//! Insight API tests.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{
    create_test_server, create_test_server_with_config, seed_alert, seed_competitor, test_config,
    ScriptedLlm, INSIGHT_RESPONSE,
};
use rivalwatch::alert::{RiskLevel, SignalType};
use rivalwatch::news::{NewNewsItem, NewsRepository};
use serde_json::{json, Value};

#[tokio::test]
async fn test_generate_from_content() {
    let (server, services) = create_test_server(&[INSIGHT_RESPONSE]).await;
    let competitor = seed_competitor(&services, "Fluke").await;

    let response = server
        .post("/api/insights/generate")
        .json(&json!({
            "content": "Fluke announced a budget clamp meter at half our price.",
            "competitor_id": competitor.id
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let data = &body["data"];
    assert_eq!(data["title"], "Rival launches a budget clamp meter");
    assert_eq!(data["competitor_id"], competitor.id);
    assert_eq!(data["competitor_name"], "Fluke");
    assert_eq!(data["impact_score"], 80);
    assert_eq!(data["sales_insights"]["urgency"], "high");
    assert_eq!(data["is_reviewed"], false);
}

#[tokio::test]
async fn test_generate_requires_input() {
    let (server, _) = create_test_server(&[INSIGHT_RESPONSE]).await;

    let response = server.post("/api/insights/generate").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(
        body["error"]["message"],
        "Provide news_item_id, alert_id, or content"
    );

    let response = server
        .post("/api/insights/generate")
        .json(&json!({"content": "   "}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/insights/generate")
        .json(&json!({"alert_id": 777}))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = server
        .post("/api/insights/generate")
        .json(&json!({"news_item_id": 777}))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_generate_model_failure_is_bad_gateway() {
    let (server, _) = create_test_server(&["I cannot help with that."]).await;

    let response = server
        .post("/api/insights/generate")
        .json(&json!({"content": "Something happened", "competitor_name": "Megger"}))
        .await;
    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");

    let body: Value = server.get("/api/insights").await.json();
    assert_eq!(body["meta"]["total"], 0);
}

#[tokio::test]
async fn test_generate_from_alert_deduplicates() {
    let llm = Arc::new(ScriptedLlm::new(&[INSIGHT_RESPONSE, INSIGHT_RESPONSE]));
    let (server, services) = create_test_server_with_config(test_config(), llm.clone()).await;
    let competitor = seed_competitor(&services, "Fluke").await;
    let alert = seed_alert(
        &services,
        competitor.id,
        "Fluke launches a clamp meter",
        SignalType::ProductLaunch,
        RiskLevel::High,
    )
    .await;

    let first: Value = server
        .post("/api/insights/generate")
        .json(&json!({"alert_id": alert.id}))
        .await
        .json();
    let second: Value = server
        .post("/api/insights/generate")
        .json(&json!({"alert_id": alert.id}))
        .await
        .json();

    assert_eq!(first["data"]["id"], second["data"]["id"]);
    assert_eq!(first["data"]["alert_id"], alert.id);
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn test_generate_from_news_item() {
    let (server, services) = create_test_server(&[INSIGHT_RESPONSE]).await;
    let competitor = seed_competitor(&services, "Megger").await;
    let item = NewsRepository::new(services.db.pool())
        .create(&NewNewsItem {
            competitor_id: Some(competitor.id),
            title: "Megger unveils an insulation tester".into(),
            description: Some("New 10 kV model".into()),
            url: "https://news.example.com/megger-tester".into(),
            source: Some("Trade Press".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    let response = server
        .post("/api/insights/generate")
        .json(&json!({"news_item_id": item.id, "content": "ignored"}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["news_item_id"], item.id);
    assert_eq!(body["data"]["competitor_id"], competitor.id);
}

#[tokio::test]
async fn test_team_views() {
    let (server, _) = create_test_server(&[INSIGHT_RESPONSE]).await;
    let body: Value = server
        .post("/api/insights/generate")
        .json(&json!({"content": "Fluke price cut", "competitor_name": "Fluke"}))
        .await
        .json();
    let id = body["data"]["id"].as_i64().unwrap();

    let response = server.get("/api/insights/team/sales").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["focused_team"], "sales");
    assert_eq!(
        body["data"][0]["team_insights"]["summary"],
        "Lead with total cost of ownership"
    );

    let response = server.get(&format!("/api/insights/{id}/team/marketing")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["focused_team"], "marketing");
    assert_eq!(
        body["data"]["team_insights"]["summary"],
        "Refresh the comparison page"
    );

    let body: Value = server.get("/api/insights").await.json();
    assert!(body["data"][0].get("focused_team").is_none());

    let body: Value = server
        .get("/api/insights")
        .add_query_param("team", "engineering")
        .await
        .json();
    assert_eq!(body["data"][0]["focused_team"], "engineering");
    assert!(body["data"][0]["team_insights"]
        .as_object()
        .unwrap()
        .is_empty());

    server
        .get("/api/insights/team/legal")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get(&format!("/api/insights/{id}/team/legal"))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/api/insights/999/team/sales")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_review_insight() {
    let (server, _) = create_test_server(&[INSIGHT_RESPONSE]).await;
    let body: Value = server
        .post("/api/insights/generate")
        .json(&json!({"content": "Fluke price cut"}))
        .await
        .json();
    let id = body["data"]["id"].as_i64().unwrap();

    let response = server
        .post(&format!("/api/insights/{id}/review"))
        .json(&json!({"reviewed_by": "pm-lead", "notes": "Shared with product"}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["is_reviewed"], true);
    assert_eq!(body["data"]["reviewed_by"], "pm-lead");
    assert_eq!(body["data"]["notes"], "Shared with product");
    assert!(body["data"]["reviewed_at"].is_string());

    server
        .post("/api/insights/999/review")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_review_defaults_reviewer() {
    let (server, _) = create_test_server(&[INSIGHT_RESPONSE]).await;
    let body: Value = server
        .post("/api/insights/generate")
        .json(&json!({"content": "Fluke price cut"}))
        .await
        .json();
    let id = body["data"]["id"].as_i64().unwrap();

    let body: Value = server
        .post(&format!("/api/insights/{id}/review"))
        .await
        .json();
    assert_eq!(body["data"]["reviewed_by"], "Anonymous");
}

#[tokio::test]
async fn test_insights_summary() {
    let (server, _) = create_test_server(&[INSIGHT_RESPONSE]).await;
    server
        .post("/api/insights/generate")
        .json(&json!({"content": "Fluke price cut"}))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server.get("/api/insights/summary").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let data = &body["data"];
    assert_eq!(data["period_days"], 7);
    assert_eq!(data["total"], 1);
    assert_eq!(data["unreviewed"], 1);
    assert_eq!(data["urgent"], 1);
    assert_eq!(data["high_impact_recent"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_generate_batch() {
    let (server, services) = create_test_server(&[INSIGHT_RESPONSE]).await;
    let competitor = seed_competitor(&services, "Fluke").await;
    seed_alert(
        &services,
        competitor.id,
        "Fluke acquires a sensor startup",
        SignalType::Acquisition,
        RiskLevel::Critical,
    )
    .await;
    seed_alert(
        &services,
        competitor.id,
        "Fluke updates its blog",
        SignalType::Other,
        RiskLevel::Low,
    )
    .await;

    let response = server
        .post("/api/insights/generate-batch")
        .json(&json!({"limit": 4}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(
        body["data"]["insights"][0]["title"],
        "Rival launches a budget clamp meter"
    );
}
