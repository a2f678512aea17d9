//! Monitoring and news collection API tests.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{
    config_with_feed, create_test_server, create_test_server_with_config, seed_competitor,
    ScriptedLlm, ANALYSIS_RESPONSE,
};
use rivalwatch::competitor::{MonitoredUrlRepository, NewMonitoredUrl, PageType};
use serde_json::{json, Value};

fn rss(items: &[(&str, &str)]) -> String {
    let body: String = items
        .iter()
        .map(|(title, link)| format!("<item><title>{title}</title><link>{link}</link></item>"))
        .collect();
    format!(
        r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Trade Press</title>{body}</channel></rss>"#
    )
}

#[tokio::test]
async fn test_check_url_initial_then_changed() {
    let mut page = mockito::Server::new_async().await;
    let (server, services) = create_test_server(&[]).await;
    let competitor = seed_competitor(&services, "Fluke").await;

    let body: Value = server
        .post(&format!("/api/competitors/{}/urls", competitor.id))
        .json(&json!({"url": format!("{}/pricing", page.url()), "page_type": "pricing"}))
        .await
        .json();
    let url_id = body["data"]["id"].as_i64().unwrap();

    let v1 = page
        .mock("GET", "/pricing")
        .with_status(200)
        .with_body("<html><body><main><p>Pro plan: $49</p></main></body></html>")
        .create_async()
        .await;

    let response = server
        .post("/api/monitor/check-url")
        .json(&json!({"url_id": url_id}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["outcome"], "initial");
    assert_eq!(body["data"]["has_changes"], false);
    assert_eq!(body["data"]["snapshot"]["extracted_text"], "Pro plan: $49");

    let body: Value = server
        .post("/api/monitor/check-url")
        .json(&json!({"url_id": url_id}))
        .await
        .json();
    assert_eq!(body["data"]["outcome"], "unchanged");
    assert!(body["data"]["snapshot"].is_null());
    v1.remove_async().await;

    let _v2 = page
        .mock("GET", "/pricing")
        .with_status(200)
        .with_body("<html><body><main><p>Pro plan: $59</p></main></body></html>")
        .create_async()
        .await;

    let body: Value = server
        .post("/api/monitor/check-url")
        .json(&json!({"url_id": url_id}))
        .await
        .json();
    assert_eq!(body["data"]["outcome"], "changed");
    assert_eq!(body["data"]["has_changes"], true);
    let summary = body["data"]["snapshot"]["diff_summary"].as_str().unwrap();
    assert!(summary.contains("Pro plan: $59"));

    let response = server.get("/api/monitor/changes").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let changes = body["data"].as_array().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0]["url_id"], url_id);
    assert_eq!(changes[0]["competitor_name"], "Fluke");
    assert_eq!(changes[0]["page_type"], "pricing");
}

#[tokio::test]
async fn test_check_url_failure_is_reported() {
    let mut page = mockito::Server::new_async().await;
    let (server, services) = create_test_server(&[]).await;
    let competitor = seed_competitor(&services, "Fluke").await;
    let url = MonitoredUrlRepository::new(services.db.pool())
        .create(&NewMonitoredUrl::new(competitor.id, format!("{}/down", page.url())))
        .await
        .unwrap();
    let _down = page
        .mock("GET", "/down")
        .with_status(503)
        .create_async()
        .await;

    let response = server
        .post("/api/monitor/check-url")
        .json(&json!({"url_id": url.id}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["outcome"], "failed");
    assert!(body["data"]["error"].as_str().unwrap().contains("503"));

    let stored = MonitoredUrlRepository::new(services.db.pool())
        .get_by_id(url.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.consecutive_errors, 1);
}

#[tokio::test]
async fn test_check_url_bad_requests() {
    let (server, _) = create_test_server(&[]).await;

    let response = server.post("/api/monitor/check-url").json(&json!({})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "url_id required");

    let response = server
        .post("/api/monitor/check-url")
        .json(&json!({"url_id": 31337}))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_run_analyzes_pending_changes() {
    let mut page = mockito::Server::new_async().await;
    let (server, services) = create_test_server(&[ANALYSIS_RESPONSE]).await;
    let competitor = seed_competitor(&services, "Fluke").await;
    let url = MonitoredUrlRepository::new(services.db.pool())
        .create(
            &NewMonitoredUrl::new(competitor.id, format!("{}/products", page.url()))
                .with_page_type(PageType::Product),
        )
        .await
        .unwrap();

    let v1 = page
        .mock("GET", "/products")
        .with_status(200)
        .with_body("<p>Model 87</p>")
        .create_async()
        .await;
    server
        .post("/api/monitor/check-url")
        .json(&json!({"url_id": url.id}))
        .await
        .assert_status_ok();
    v1.remove_async().await;
    let _v2 = page
        .mock("GET", "/products")
        .with_status(200)
        .with_body("<p>Model 87</p><p>Model 89 now available</p>")
        .create_async()
        .await;
    server
        .post("/api/monitor/check-url")
        .json(&json!({"url_id": url.id}))
        .await
        .assert_status_ok();

    let response = server
        .post("/api/monitor/run")
        .json(&json!({"news": false}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let data = &body["data"];
    // The forced re-check sees the same content
    assert_eq!(data["changes_detected"], 0);
    assert_eq!(data["news_collected"], 0);
    assert_eq!(data["analysis"]["page_changes_processed"], 1);
    assert_eq!(data["analysis"]["alerts_created"], 1);
    assert!(data["errors"].as_array().unwrap().is_empty());
    assert!(data.get("notifications").is_none());

    let body: Value = server.get("/api/alerts").await.json();
    assert_eq!(body["meta"]["total"], 1);
    let alert = &body["data"][0];
    assert_eq!(alert["source_type"], "page_change");
    assert_eq!(alert["signal_type"], "product_launch");
    assert_eq!(alert["risk_level"], "high");
    assert_eq!(alert["title"], "Fluke: Product Launch Detected");
}

#[tokio::test]
async fn test_run_with_nothing_to_do() {
    let (server, _) = create_test_server(&[]).await;

    let response = server.post("/api/monitor/run").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["changes_detected"], 0);
    assert_eq!(body["data"]["analysis"]["alerts_created"], 0);
}

#[tokio::test]
async fn test_fetch_news_from_feed() {
    let mut feed = mockito::Server::new_async().await;
    let _feed = feed
        .mock("GET", "/feed")
        .with_status(200)
        .with_header("content-type", "application/rss+xml")
        .with_body(rss(&[
            (
                "Megger unveils a 10 kV insulation tester",
                "https://news.example.com/megger-tester",
            ),
            (
                "Megger opens a service center in Texas",
                "https://news.example.com/megger-texas",
            ),
            ("Fluke wins a design award", "https://news.example.com/fluke-award"),
            (
                "Megger shareholders approve dividend",
                "https://news.example.com/megger-dividend",
            ),
        ]))
        .create_async()
        .await;

    let config = config_with_feed(&format!("{}/feed", feed.url()));
    let llm = Arc::new(ScriptedLlm::new(&[
        ANALYSIS_RESPONSE,
        ANALYSIS_RESPONSE,
        ANALYSIS_RESPONSE,
    ]));
    let (server, services) = create_test_server_with_config(config, llm).await;
    let competitor = seed_competitor(&services, "Megger").await;

    let response = server.post("/api/news/fetch").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let data = &body["data"];
    // Feed entries need not mention the competitor; only the dividend story is filtered
    assert_eq!(data["collected"], 3);
    assert_eq!(data["duplicates_skipped"], 0);
    assert_eq!(data["competitors"][0]["competitor_id"], competitor.id);
    assert_eq!(data["competitors"][0]["fetched"], 4);
    assert_eq!(data["competitors"][0]["filtered"], 1);
    assert_eq!(data["headlines"].as_array().unwrap().len(), 3);
    assert_eq!(data["headlines"][0]["competitor"], "Megger");
    assert_eq!(
        data["message"],
        "Collected 3 new articles (0 duplicates skipped)"
    );

    // Second pass finds only duplicates
    let body: Value = server
        .post("/api/news/fetch")
        .json(&json!({"competitor_id": competitor.id}))
        .await
        .json();
    assert_eq!(body["data"]["collected"], 0);
    assert_eq!(body["data"]["duplicates_skipped"], 3);

    // Unanalyzed items are not yet relevant
    let body: Value = server.get("/api/news").await.json();
    assert_eq!(body["meta"]["total"], 0);
    let body: Value = server
        .get("/api/news")
        .add_query_param("relevant_only", false)
        .await
        .json();
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["data"][0]["competitor_name"], "Megger");

    let body: Value = server
        .post("/api/monitor/run")
        .json(&json!({"pages": false, "news": false}))
        .await
        .json();
    assert_eq!(body["data"]["analysis"]["news_processed"], 3);
    assert_eq!(body["data"]["analysis"]["alerts_created"], 3);

    let body: Value = server.get("/api/news").await.json();
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["data"][0]["is_processed"], true);
    assert_eq!(body["data"][0]["is_relevant"], true);
}

#[tokio::test]
async fn test_fetch_news_bad_requests() {
    let (server, _) = create_test_server(&[]).await;

    server
        .post("/api/news/fetch")
        .json(&json!({"days_back": 31}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .post("/api/news/fetch")
        .json(&json!({"days_back": 0}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .post("/api/news/fetch")
        .json(&json!({"competitor_id": 404}))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
