//! Alert API tests.

mod common;

use axum::http::StatusCode;
use common::{create_test_server, seed_alert, seed_competitor};
use rivalwatch::alert::{RiskLevel, SignalType};
use serde_json::{json, Value};

#[tokio::test]
async fn test_list_alerts_paginated() {
    let (server, services) = create_test_server(&[]).await;
    let competitor = seed_competitor(&services, "Fluke").await;
    for i in 0..3 {
        seed_alert(
            &services,
            competitor.id,
            &format!("Fluke update {i}"),
            SignalType::FeatureUpdate,
            RiskLevel::Medium,
        )
        .await;
    }

    let response = server
        .get("/api/alerts")
        .add_query_param("per_page", 2)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["meta"]["pages"], 2);
    // Newest first
    assert_eq!(body["data"][0]["title"], "Fluke update 2");
    assert_eq!(body["data"][0]["competitor_name"], "Fluke");

    let body: Value = server
        .get("/api/alerts")
        .add_query_param("per_page", 2)
        .add_query_param("page", 2)
        .await
        .json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_alerts_filters() {
    let (server, services) = create_test_server(&[]).await;
    let fluke = seed_competitor(&services, "Fluke").await;
    let megger = seed_competitor(&services, "Megger").await;
    seed_alert(
        &services,
        fluke.id,
        "Fluke launches a thermal camera",
        SignalType::ProductLaunch,
        RiskLevel::Critical,
    )
    .await;
    seed_alert(
        &services,
        fluke.id,
        "Fluke raises prices",
        SignalType::PricingChange,
        RiskLevel::High,
    )
    .await;
    seed_alert(
        &services,
        megger.id,
        "Megger hires a new CFO",
        SignalType::LeadershipChange,
        RiskLevel::Low,
    )
    .await;

    let total = |body: Value| body["meta"]["total"].as_i64().unwrap();

    let body: Value = server
        .get("/api/alerts")
        .add_query_param("risk", "high")
        .await
        .json();
    assert_eq!(total(body), 2);

    let body: Value = server
        .get("/api/alerts")
        .add_query_param("risk_level", "high")
        .await
        .json();
    assert_eq!(total(body), 1);

    let body: Value = server
        .get("/api/alerts")
        .add_query_param("competitor_id", megger.id)
        .await
        .json();
    assert_eq!(total(body), 1);

    let body: Value = server
        .get("/api/alerts")
        .add_query_param("signal_type", "pricing_change")
        .await
        .json();
    assert_eq!(total(body), 1);

    let body: Value = server
        .get("/api/alerts")
        .add_query_param("search", "THERMAL")
        .await
        .json();
    assert_eq!(total(body), 1);

    let response = server
        .get("/api/alerts")
        .add_query_param("risk", "severe")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_alert_triage() {
    let (server, services) = create_test_server(&[]).await;
    let competitor = seed_competitor(&services, "Fluke").await;
    let alert = seed_alert(
        &services,
        competitor.id,
        "Fluke partners with a distributor",
        SignalType::Partnership,
        RiskLevel::High,
    )
    .await;

    let response = server
        .post(&format!("/api/alerts/{}/acknowledge", alert.id))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["status"], "acknowledged");
    assert!(body["data"]["acknowledged_at"].is_string());

    let response = server
        .patch(&format!("/api/alerts/{}", alert.id))
        .json(&json!({"status": "in_progress", "assigned_to": "sales-ops"}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["status"], "in_progress");
    assert_eq!(body["data"]["assigned_to"], "sales-ops");

    let response = server
        .post(&format!("/api/alerts/{}/resolve", alert.id))
        .json(&json!({"notes": "Briefed the channel team"}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["status"], "resolved");
    assert_eq!(body["data"]["resolution_notes"], "Briefed the channel team");
    assert!(body["data"]["resolved_at"].is_string());

    let body: Value = server
        .get("/api/alerts")
        .add_query_param("status", "resolved")
        .await
        .json();
    assert_eq!(body["meta"]["total"], 1);
}

#[tokio::test]
async fn test_resolve_without_body() {
    let (server, services) = create_test_server(&[]).await;
    let competitor = seed_competitor(&services, "Fluke").await;
    let alert = seed_alert(
        &services,
        competitor.id,
        "Fluke opens a new plant",
        SignalType::Expansion,
        RiskLevel::Medium,
    )
    .await;

    let response = server
        .post(&format!("/api/alerts/{}/resolve", alert.id))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["status"], "resolved");
}

#[tokio::test]
async fn test_alert_not_found() {
    let (server, _) = create_test_server(&[]).await;

    server
        .get("/api/alerts/4242")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .post("/api/alerts/4242/acknowledge")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .patch("/api/alerts/4242")
        .json(&json!({"status": "dismissed"}))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_manual_alert() {
    let (server, services) = create_test_server(&[]).await;
    let competitor = seed_competitor(&services, "Klein Tools").await;

    let response = server
        .post("/api/alerts")
        .json(&json!({
            "competitor_id": competitor.id,
            "title": "  Klein spotted at trade show  ",
            "summary": "New tester prototypes on display",
            "signal_type": "product_launch",
            "risk_level": "high",
            "risk_score": 70
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["title"], "Klein spotted at trade show");
    assert_eq!(body["data"]["source_type"], "manual");
    assert_eq!(body["data"]["risk_level"], "high");
    assert_eq!(body["data"]["status"], "new");
    assert_eq!(body["data"]["notification_sent"], false);

    let response = server
        .post("/api/alerts")
        .json(&json!({"competitor_id": competitor.id, "title": "Untyped"}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["signal_type"], "other");
    assert_eq!(body["data"]["risk_level"], "medium");
}

#[tokio::test]
async fn test_create_manual_alert_rejects_bad_input() {
    let (server, services) = create_test_server(&[]).await;
    let competitor = seed_competitor(&services, "Klein Tools").await;

    let response = server
        .post("/api/alerts")
        .json(&json!({"competitor_id": 9999, "title": "Ghost"}))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = server
        .post("/api/alerts")
        .json(&json!({"competitor_id": competitor.id, "title": "Overscored", "risk_score": 150}))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert!(body["error"]["details"]["risk_score"].is_array());
}

#[tokio::test]
async fn test_report_summary() {
    let (server, services) = create_test_server(&[]).await;
    let fluke = seed_competitor(&services, "Fluke").await;
    let megger = seed_competitor(&services, "Megger").await;
    seed_alert(
        &services,
        fluke.id,
        "Fluke launches a meter",
        SignalType::ProductLaunch,
        RiskLevel::High,
    )
    .await;
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
        "Megger gets certified",
        SignalType::Certification,
        RiskLevel::Info,
    )
    .await;

    let response = server.get("/api/reports/summary").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let data = &body["data"];
    assert_eq!(data["period"]["days"], 7);
    assert_eq!(data["total_alerts"], 3);
    assert_eq!(data["by_competitor"]["Fluke"].as_array().unwrap().len(), 2);
    assert_eq!(data["by_competitor"]["Megger"].as_array().unwrap().len(), 1);
    assert_eq!(data["by_risk_level"]["high"].as_array().unwrap().len(), 2);
    assert!(data["by_risk_level"]["critical"].as_array().unwrap().is_empty());
    assert_eq!(
        data["by_signal_type"]["certification"]
            .as_array()
            .unwrap()
            .len(),
        1
    );

    server
        .get("/api/reports/summary")
        .add_query_param("days", 0)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
