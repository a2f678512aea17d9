//! Shared helpers for the API integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum_test::TestServer;
use rivalwatch::alert::{Alert, AlertRepository, NewAlert, RiskLevel, SignalType, SourceType};
use rivalwatch::competitor::{Competitor, CompetitorRepository, NewCompetitor};
use rivalwatch::config::FeedSource;
use rivalwatch::llm::{LlmProvider, LlmRequest, LlmResponse, UsageMetadata};
use rivalwatch::web::{create_health_router, create_router, AppState};
use rivalwatch::{Config, Database, Result, RivalError, Services};

/// Insight model output used across tests.
pub const INSIGHT_RESPONSE: &str = r#"```json
{
    "title": "Rival launches a budget clamp meter",
    "executive_summary": "Entry-level price pressure.",
    "competitor_advantages": ["Lower price"],
    "our_advantages": ["Accuracy"],
    "sales_insights": {"summary": "Lead with total cost of ownership", "urgency": "high"},
    "marketing_insights": {"summary": "Refresh the comparison page"},
    "immediate_actions": ["Brief the field team"],
    "impact_score": 80,
    "urgency_score": 70,
    "confidence_score": 65
}
```"#;

/// Analysis model output rating content as a high-risk launch.
pub const ANALYSIS_RESPONSE: &str = r#"{
    "signal_type": "product_launch",
    "risk_level": "high",
    "risk_score": 78,
    "confidence_score": 70,
    "summary": "New meter announced",
    "relevance": "Competes with our flagship line",
    "recommended_playbook": "product_launch",
    "immediate_actions": ["Alert product management"]
}"#;

/// Provider that replays canned responses in order.
///
/// Fails with an LLM error once the script runs out.
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<usize>,
}

impl ScriptedLlm {
    pub fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, _request: LlmRequest) -> Result<LlmResponse> {
        *self.calls.lock().unwrap() += 1;
        let content = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| RivalError::Llm("no scripted response left".into()))?;
        Ok(LlmResponse {
            content,
            usage: UsageMetadata::default(),
            model: "scripted".into(),
        })
    }
}

/// Configuration that never reaches the public internet.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.monitor.allow_private_hosts = true;
    config.monitor.request_delay_ms = 0;
    config.news.google_news_enabled = false;
    config.news.newsapi_key = String::new();
    config.analysis.auto_insights = false;
    config
}

/// Test configuration reading news from one RSS feed.
pub fn config_with_feed(feed_url: &str) -> Config {
    let mut config = test_config();
    config.news.rss_feeds = vec![FeedSource {
        name: "Trade Press".into(),
        url: feed_url.to_string(),
    }];
    config
}

/// Create a test server with an in-memory database.
pub async fn create_test_server(responses: &[&str]) -> (TestServer, Arc<Services>) {
    create_test_server_with_config(test_config(), Arc::new(ScriptedLlm::new(responses))).await
}

/// Create a test server with a custom configuration and model.
pub async fn create_test_server_with_config(
    config: Config,
    llm: Arc<ScriptedLlm>,
) -> (TestServer, Arc<Services>) {
    let db = Arc::new(
        Database::open_in_memory()
            .await
            .expect("Failed to create test database"),
    );
    let services = Arc::new(Services::with_llm(db, config, llm).expect("Failed to build services"));

    let app_state = Arc::new(AppState::new(services.clone()));
    let router = create_router(app_state, &[]).merge(create_health_router());
    let server = TestServer::new(router).expect("Failed to create test server");

    (server, services)
}

pub async fn seed_competitor(services: &Services, name: &str) -> Competitor {
    CompetitorRepository::new(services.db.pool())
        .create(&NewCompetitor::new(name).with_website(format!(
            "https://{}.example.com",
            name.to_lowercase().replace(' ', "")
        )))
        .await
        .expect("Failed to create competitor")
}

pub async fn seed_alert(
    services: &Services,
    competitor_id: i64,
    title: &str,
    signal_type: SignalType,
    risk_level: RiskLevel,
) -> Alert {
    AlertRepository::new(services.db.pool())
        .create(&NewAlert {
            competitor_id,
            source_type: SourceType::News,
            source_url: Some(format!(
                "https://news.example.com/{}",
                title.to_lowercase().replace(' ', "-")
            )),
            title: title.to_string(),
            summary: Some(format!("Summary of {title}")),
            signal_type,
            risk_level,
            risk_score: Some(match risk_level {
                RiskLevel::Critical => 90,
                RiskLevel::High => 75,
                RiskLevel::Medium => 50,
                RiskLevel::Low => 25,
                RiskLevel::Info => 10,
            }),
            ..Default::default()
        })
        .await
        .expect("Failed to create alert")
}
