//! Playbook and feature matrix API tests.

mod common;

use axum::http::{header, StatusCode};
use common::{create_test_server, seed_competitor};
use serde_json::{json, Value};

#[tokio::test]
async fn test_create_and_list_playbooks() {
    let (server, _) = create_test_server(&[]).await;

    let response = server
        .post("/api/playbooks")
        .json(&json!({
            "name": "Pricing Change Response",
            "trigger_signal_types": ["pricing_change"],
            "sales_actions": ["Review active proposals"],
            "email_templates": [{"subject": "Pricing update", "body": "..."}],
            "priority": 9
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["slug"], "pricing_change_response");
    assert_eq!(body["data"]["is_active"], true);
    assert_eq!(body["data"]["sales_actions"][0], "Review active proposals");
    assert_eq!(body["data"]["email_templates"][0]["subject"], "Pricing update");

    let response = server
        .post("/api/playbooks")
        .json(&json!({"name": "Launch Response", "slug": "launch"}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["priority"], 5);

    let body: Value = server.get("/api/playbooks").await.json();
    let slugs: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["slug"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(slugs, vec!["pricing_change_response", "launch"]);

    let body: Value = server
        .get("/api/playbooks")
        .add_query_param("active", "false")
        .await
        .json();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let body: Value = server.get(&format!("/api/playbooks/{id}")).await.json();
    assert_eq!(body["data"]["name"], "Pricing Change Response");
}

#[tokio::test]
async fn test_playbook_errors() {
    let (server, _) = create_test_server(&[]).await;

    server
        .post("/api/playbooks")
        .json(&json!({"name": "Launch Response"}))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/api/playbooks")
        .json(&json!({"name": "launch response"}))
        .await
        .assert_status(StatusCode::CONFLICT);
    server
        .post("/api/playbooks")
        .json(&json!({"name": "  "}))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    server
        .post("/api/playbooks")
        .json(&json!({"name": "Too urgent", "priority": 11}))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    server
        .post("/api/playbooks")
        .json(&json!({"description": "no name"}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/api/playbooks/42")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_feature_crud_and_categories() {
    let (server, _) = create_test_server(&[]).await;

    let response = server
        .post("/api/features")
        .json(&json!({"category": "Safety", "feature_name": "CAT IV rating"}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["our_capability"], "none");
    assert_eq!(body["data"]["customer_importance"], 5);
    assert_eq!(body["data"]["competitor_capabilities"], json!({}));
    assert!(body["data"]["last_verified"].is_null());

    server
        .post("/api/features")
        .json(&json!({
            "category": "Connectivity",
            "feature_name": "Bluetooth logging",
            "our_capability": "planned",
            "customer_importance": 3
        }))
        .await
        .assert_status(StatusCode::CREATED);

    let body: Value = server.get("/api/features/categories").await.json();
    assert_eq!(body["data"], json!(["Connectivity", "Safety"]));

    let body: Value = server
        .get("/api/features")
        .add_query_param("category", "Safety")
        .await
        .json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = server
        .put(&format!("/api/features/{id}"))
        .json(&json!({
            "our_capability": "full",
            "differentiation_level": "better",
            "verified_by": "pm@acme.example"
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["our_capability"], "full");
    assert_eq!(body["data"]["differentiation_level"], "better");
    assert_eq!(body["data"]["feature_name"], "CAT IV rating");
    assert_eq!(body["data"]["verified_by"], "pm@acme.example");
    assert!(body["data"]["last_verified"].is_string());

    server
        .put("/api/features/999")
        .json(&json!({"our_capability": "full"}))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .post("/api/features")
        .json(&json!({"category": "Safety", "feature_name": "x", "our_capability": "most"}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .put(&format!("/api/features/{id}"))
        .json(&json!({"customer_importance": 0}))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_feature_matrix_and_export() {
    let (server, services) = create_test_server(&[]).await;
    let fluke = seed_competitor(&services, "Fluke").await;
    let megger = seed_competitor(&services, "Megger").await;
    let retired = seed_competitor(&services, "Extech").await;
    server
        .delete(&format!("/api/competitors/{}", retired.id))
        .await
        .assert_status_success();

    for (category, name, importance) in [
        ("Safety", "Arc flash", 6),
        ("Safety", "CAT IV rating", 9),
        ("Connectivity", "Bluetooth", 4),
    ] {
        server
            .post("/api/features")
            .json(&json!({
                "category": category,
                "feature_name": name,
                "our_capability": "full",
                "customer_importance": importance,
                "competitor_capabilities": {
                    fluke.id.to_string(): {"capability": "partial", "details": "Flagship only"}
                }
            }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let body: Value = server.get("/api/features/matrix").await.json();
    let matrix = &body["data"];
    let safety: Vec<_> = matrix["categories"]["Safety"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(safety, vec!["CAT IV rating", "Arc flash"]);
    assert_eq!(matrix["categories"]["Safety"][0]["importance"], 9);
    assert_eq!(
        matrix["categories"]["Connectivity"][0]["competitors"][fluke.id.to_string()]["capability"],
        "partial"
    );
    let columns: Vec<_> = matrix["competitors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    assert_eq!(columns, vec![fluke.id, megger.id]);

    let response = server.get("/api/export/features/csv").await;
    response.assert_status_ok();
    assert_eq!(
        response.header(header::CONTENT_TYPE).to_str().unwrap(),
        "text/csv; charset=utf-8"
    );
    assert!(response
        .header(header::CONTENT_DISPOSITION)
        .to_str()
        .unwrap()
        .starts_with("attachment; filename=\"feature_matrix_"));

    let text = response.text();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(
        lines[0],
        "category,feature,description,importance,our_capability,our_details,\
         Fluke_capability,Fluke_details,Megger_capability,Megger_details"
    );
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[1], "Connectivity,Bluetooth,,4,full,,partial,Flagship only,,");
    assert!(lines[2].starts_with("Safety,Arc flash,"));
    assert!(lines[3].starts_with("Safety,CAT IV rating,"));
}
