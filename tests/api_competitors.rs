//! Competitor and monitored URL API tests.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{create_test_server, create_test_server_with_config, seed_alert, seed_competitor};
use rivalwatch::alert::{RiskLevel, SignalType};
use serde_json::{json, Value};

#[tokio::test]
async fn test_create_and_list_competitors() {
    let (server, _) = create_test_server(&[]).await;

    let response = server
        .post("/api/competitors")
        .json(&json!({
            "name": "Fluke",
            "description": "Test and measurement",
            "website": "https://fluke.example.com"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["name"], "Fluke");
    assert_eq!(body["data"]["url_count"], 0);
    assert_eq!(body["data"]["is_active"], true);

    let response = server.get("/api/competitors").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let list = body["data"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["name"], "Fluke");
}

#[tokio::test]
async fn test_duplicate_competitor_conflicts() {
    let (server, services) = create_test_server(&[]).await;
    seed_competitor(&services, "Megger").await;

    let response = server
        .post("/api/competitors")
        .json(&json!({"name": "Megger"}))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_create_competitor_validation_details() {
    let (server, _) = create_test_server(&[]).await;

    let response = server
        .post("/api/competitors")
        .json(&json!({"name": "", "website": "not a url"}))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["details"]["name"].is_array());
    assert!(body["error"]["details"]["website"].is_array());
}

#[tokio::test]
async fn test_get_competitor_detail() {
    let (server, services) = create_test_server(&[]).await;
    let competitor = seed_competitor(&services, "Klein Tools").await;
    seed_alert(
        &services,
        competitor.id,
        "Klein launches a tester",
        SignalType::ProductLaunch,
        RiskLevel::High,
    )
    .await;

    let response = server
        .get(&format!("/api/competitors/{}", competitor.id))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["name"], "Klein Tools");
    assert_eq!(body["data"]["alert_count"], 1);
    assert_eq!(body["data"]["recent_alerts"].as_array().unwrap().len(), 1);
    assert!(body["data"]["monitored_urls"].as_array().unwrap().is_empty());

    let response = server.get("/api/competitors/9999").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_competitor() {
    let (server, services) = create_test_server(&[]).await;
    let fluke = seed_competitor(&services, "Fluke").await;
    seed_competitor(&services, "Megger").await;

    let response = server
        .patch(&format!("/api/competitors/{}", fluke.id))
        .json(&json!({"description": "Handheld meters"}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["description"], "Handheld meters");

    let response = server
        .patch(&format!("/api/competitors/{}", fluke.id))
        .json(&json!({"name": "Megger"}))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let response = server
        .patch(&format!("/api/competitors/{}", fluke.id))
        .json(&json!({"name": "   "}))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_delete_competitor_deactivates() {
    let (server, services) = create_test_server(&[]).await;
    let competitor = seed_competitor(&services, "Extech").await;

    let response = server
        .delete(&format!("/api/competitors/{}", competitor.id))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let body: Value = server.get("/api/competitors").await.json();
    assert!(body["data"].as_array().unwrap().is_empty());

    // The record itself is kept
    let response = server
        .get(&format!("/api/competitors/{}", competitor.id))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["is_active"], false);
}

#[tokio::test]
async fn test_monitored_url_lifecycle() {
    let (server, services) = create_test_server(&[]).await;
    let competitor = seed_competitor(&services, "Fluke").await;

    let response = server
        .post(&format!("/api/competitors/{}/urls", competitor.id))
        .json(&json!({
            "url": "https://fluke.example.com/pricing",
            "name": "Pricing",
            "page_type": "pricing",
            "check_interval_hours": 12
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let url_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["page_type"], "pricing");
    assert_eq!(body["data"]["check_interval_hours"], 12);

    let body: Value = server
        .get(&format!("/api/competitors/{}/urls", competitor.id))
        .await
        .json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = server
        .patch(&format!("/api/urls/{url_id}"))
        .json(&json!({"is_active": false}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["is_active"], false);

    server
        .delete(&format!("/api/urls/{url_id}"))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .delete(&format!("/api/urls/{url_id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_monitored_url_validation() {
    let (server, services) = create_test_server(&[]).await;
    let competitor = seed_competitor(&services, "Fluke").await;

    let response = server
        .post(&format!("/api/competitors/{}/urls", competitor.id))
        .json(&json!({"url": "https://fluke.example.com", "check_interval_hours": 0}))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let response = server
        .post("/api/competitors/9999/urls")
        .json(&json!({"url": "https://fluke.example.com"}))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_private_url_rejected() {
    let mut config = common::test_config();
    config.monitor.allow_private_hosts = false;
    let (server, services) =
        create_test_server_with_config(config, Arc::new(common::ScriptedLlm::new(&[]))).await;
    let competitor = seed_competitor(&services, "Fluke").await;

    let response = server
        .post(&format!("/api/competitors/{}/urls", competitor.id))
        .json(&json!({"url": "http://127.0.0.1/admin"}))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = server
        .get(&format!("/api/competitors/{}/urls", competitor.id))
        .await
        .json();
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_dashboard_stats() {
    let (server, services) = create_test_server(&[]).await;
    let fluke = seed_competitor(&services, "Fluke").await;
    let megger = seed_competitor(&services, "Megger").await;
    seed_alert(
        &services,
        fluke.id,
        "Fluke cuts prices",
        SignalType::PricingChange,
        RiskLevel::High,
    )
    .await;
    seed_alert(
        &services,
        megger.id,
        "Megger partners with a distributor",
        SignalType::Partnership,
        RiskLevel::Low,
    )
    .await;

    let response = server.get("/api/stats").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let data = &body["data"];
    assert_eq!(data["summary"]["total_alerts"], 2);
    assert_eq!(data["summary"]["competitors_monitored"], 2);
    assert_eq!(data["risk_distribution"]["high"], 1);
    assert_eq!(data["risk_distribution"]["critical"], 0);
    assert_eq!(data["signal_distribution"]["pricing_change"], 1);
    assert!(data["signal_distribution"].get("product_launch").is_none());
    assert_eq!(data["recent_alerts"].as_array().unwrap().len(), 2);
    assert_eq!(data["competitor_stats"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_health() {
    let (server, _) = create_test_server(&[]).await;
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");
}
