//! Service wiring and the full monitoring cycle.
//!
//! [`Services`] builds every long-lived component from a [`Config`] once.
//! The scheduler, the CLI and the `POST /api/monitor/run` endpoint all
//! drive the same [`run_cycle`].

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::analyzer::{Analyzer, ProcessReport};
use crate::battle_card::BattleCardGenerator;
use crate::config::Config;
use crate::fetch::Fetcher;
use crate::insight::InsightGenerator;
use crate::llm::{provider_from_config, LlmProvider};
use crate::monitor::PageMonitor;
use crate::news::NewsCollector;
use crate::notify::{ChannelResult, NotifyReport, Notifier};
use crate::report::alert_report;
use crate::{Database, Result};

/// Long-lived components shared by the CLI, the scheduler and the API.
pub struct Services {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
    pub monitor: PageMonitor,
    pub collector: NewsCollector,
    pub analyzer: Analyzer,
    pub notifier: Arc<Notifier>,
    pub insights: Arc<InsightGenerator>,
    pub battle_cards: BattleCardGenerator,
}

impl Services {
    /// Build services with the LLM provider named by the configuration.
    pub fn new(db: Arc<Database>, config: Config) -> Result<Self> {
        let llm = provider_from_config(&config.llm);
        Self::with_llm(db, config, llm)
    }

    /// Build services around an explicit LLM provider.
    pub fn with_llm(db: Arc<Database>, config: Config, llm: Arc<dyn LlmProvider>) -> Result<Self> {
        let fetcher = Fetcher::new(&config.monitor)?;
        let notifier = Arc::new(Notifier::new(
            db.clone(),
            config.notify.clone(),
            config.web.app_url.clone(),
        )?);
        let insights = Arc::new(InsightGenerator::new(
            db.clone(),
            llm.clone(),
            config.analysis.clone(),
            config.llm.insight_max_tokens,
        ));
        let analyzer = Analyzer::new(
            db.clone(),
            llm.clone(),
            config.analysis.clone(),
            config.llm.analysis_max_tokens,
        )
        .with_notifier(notifier.clone())
        .with_insights(insights.clone());
        let battle_cards = BattleCardGenerator::new(
            db.clone(),
            llm,
            config.analysis.company_name.clone(),
            config.llm.insight_max_tokens,
        );

        Ok(Self {
            monitor: PageMonitor::new(db.clone(), fetcher.clone(), &config.monitor),
            collector: NewsCollector::new(db.clone(), fetcher, config.news.clone()),
            analyzer,
            notifier,
            insights,
            battle_cards,
            config: Arc::new(config),
            db,
        })
    }
}

/// Which stages of the cycle to run.
#[derive(Debug, Clone, Copy)]
pub struct CycleOptions {
    pub check_pages: bool,
    /// Check every active URL, not only those past their interval.
    pub force_pages: bool,
    pub collect_news: bool,
    pub news_days_back: i64,
    pub analyze: bool,
    pub notify: bool,
}

impl Default for CycleOptions {
    fn default() -> Self {
        Self {
            check_pages: true,
            force_pages: false,
            collect_news: true,
            news_days_back: 3,
            analyze: true,
            notify: true,
        }
    }
}

/// What one cycle did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    pub changes_detected: usize,
    pub news_collected: usize,
    pub analysis: ProcessReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<NotifyReport>,
    /// Stages that failed; later stages still run.
    pub errors: Vec<String>,
}

/// Run the selected stages in order: pages, news, analysis, notification.
pub async fn run_cycle(services: &Services, options: CycleOptions) -> CycleReport {
    let mut report = CycleReport::default();

    if options.check_pages {
        match services.monitor.check_all(options.force_pages).await {
            Ok(changed) => report.changes_detected = changed.len(),
            Err(e) => {
                error!("Page check failed: {}", e);
                report.errors.push(format!("pages: {e}"));
            }
        }
    }

    if options.collect_news {
        match services.collector.collect_all(options.news_days_back).await {
            Ok(reports) => {
                report.news_collected = reports.iter().map(|r| r.new_items.len()).sum();
            }
            Err(e) => {
                error!("News collection failed: {}", e);
                report.errors.push(format!("news: {e}"));
            }
        }
    }

    if options.analyze {
        match services.analyzer.process_pending().await {
            Ok(processed) => report.analysis = processed,
            Err(e) => {
                error!("Analysis failed: {}", e);
                report.errors.push(format!("analysis: {e}"));
            }
        }
    }

    if options.notify && services.notifier.is_configured() {
        let min_risk = services.notifier.configured_min_risk();
        match services.notifier.send_pending(min_risk).await {
            Ok(sent) => report.notifications = Some(sent),
            Err(e) => {
                error!("Notification failed: {}", e);
                report.errors.push(format!("notify: {e}"));
            }
        }
    }

    info!(
        changes = report.changes_detected,
        news = report.news_collected,
        alerts = report.analysis.alerts_created,
        "Cycle complete"
    );
    report
}

/// What the daily digest covered and where it went.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DigestReport {
    pub alerts: usize,
    pub deliveries: Vec<ChannelResult>,
}

/// Summarize the last 24 hours of alerts and post the digest.
///
/// Nothing is posted when no channel is configured or no alert was raised.
pub async fn run_digest(services: &Services) -> Result<DigestReport> {
    let report = alert_report(services.db.pool(), 1).await?;
    info!("Daily digest: {} alerts in last 24 hours", report.total);

    let deliveries = if report.total > 0 && services.notifier.is_configured() {
        services.notifier.send_digest(&report).await
    } else {
        Vec::new()
    };
    Ok(DigestReport {
        alerts: report.total,
        deliveries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::competitor::{
        CompetitorRepository, MonitoredUrlRepository, NewCompetitor, NewMonitoredUrl,
    };
    use crate::llm::ScriptedLlm;

    const ANALYSIS: &str = r#"{"summary": "Price cut", "signal_type": "pricing_change",
        "risk_level": "high", "risk_score": 80, "confidence_score": 90}"#;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.monitor.allow_private_hosts = true;
        config.monitor.request_delay_ms = 0;
        config.news.google_news_enabled = false;
        config.analysis.auto_insights = false;
        config
    }

    #[tokio::test]
    async fn test_cycle_detects_change_and_alerts() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/pricing")
            .with_body("<html><body><p>Meter costs $99</p></body></html>")
            .expect(1)
            .create_async()
            .await;

        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let competitor = CompetitorRepository::new(db.pool())
            .create(&NewCompetitor::new("Fluke"))
            .await
            .unwrap();
        MonitoredUrlRepository::new(db.pool())
            .create(&NewMonitoredUrl::new(
                competitor.id,
                format!("{}/pricing", server.url()),
            ))
            .await
            .unwrap();

        let llm = Arc::new(ScriptedLlm::replying(ANALYSIS));
        let services = Services::with_llm(db.clone(), test_config(), llm.clone()).unwrap();
        let options = CycleOptions {
            force_pages: true,
            collect_news: false,
            ..Default::default()
        };

        let report = run_cycle(&services, options).await;
        assert_eq!(report.changes_detected, 0);
        assert_eq!(report.analysis.alerts_created, 0);
        first.assert_async().await;
        first.remove_async().await;

        server
            .mock("GET", "/pricing")
            .with_body("<html><body><p>Meter costs $79</p></body></html>")
            .create_async()
            .await;

        let report = run_cycle(&services, options).await;
        assert_eq!(report.changes_detected, 1);
        assert_eq!(report.analysis.page_changes_processed, 1);
        assert_eq!(report.analysis.alerts_created, 1);
        assert!(report.notifications.is_none());
        assert!(report.errors.is_empty());
        assert_eq!(llm.prompt_count(), 1);
    }

    #[tokio::test]
    async fn test_cycle_with_nothing_to_do() {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let llm = Arc::new(ScriptedLlm::new(vec![]));
        let services = Services::with_llm(db, test_config(), llm).unwrap();

        let report = run_cycle(&services, CycleOptions::default()).await;
        assert_eq!(report.changes_detected, 0);
        assert_eq!(report.news_collected, 0);
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn test_digest_counts_recent_alerts() {
        use crate::alert::{AlertRepository, NewAlert, RiskLevel};

        let mut server = mockito::Server::new_async().await;
        let slack = server
            .mock("POST", "/slack")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let competitor = CompetitorRepository::new(db.pool())
            .create(&NewCompetitor::new("Fluke"))
            .await
            .unwrap();
        let mut config = test_config();
        config.notify.slack_webhook_url = format!("{}/slack", server.url());
        let services =
            Services::with_llm(db.clone(), config, Arc::new(ScriptedLlm::new(vec![]))).unwrap();

        let quiet = run_digest(&services).await.unwrap();
        assert_eq!(quiet.alerts, 0);
        assert!(quiet.deliveries.is_empty());

        AlertRepository::new(db.pool())
            .create(&NewAlert {
                competitor_id: competitor.id,
                title: "Fluke cuts prices".into(),
                risk_level: RiskLevel::High,
                ..Default::default()
            })
            .await
            .unwrap();
        let digest = run_digest(&services).await.unwrap();
        assert_eq!(digest.alerts, 1);
        assert_eq!(digest.deliveries.len(), 1);
        assert!(digest.deliveries[0].success);
        slack.assert_async().await;
    }
}
