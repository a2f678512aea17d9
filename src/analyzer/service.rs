//! Turns page changes and news into alerts.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::prompt::analysis_prompt;
use super::result::AnalysisResult;
use crate::alert::{Alert, AlertRepository, NewAlert, SourceType};
use crate::competitor::{CompetitorRepository, MonitoredUrlRepository};
use crate::config::AnalysisConfig;
use crate::datetime::to_db_string;
use crate::fetch::truncate_chars;
use crate::insight::InsightGenerator;
use crate::llm::{generate_json, LlmProvider, LlmRequest};
use crate::monitor::{PageSnapshot, SnapshotRepository};
use crate::news::{NewsItem, NewsRepository};
use crate::notify::Notifier;
use crate::{Database, Result, RivalError};

/// Page text included in the prompt.
const PROMPT_EXCERPT_CHARS: usize = 3000;
/// Page text stored on the alert.
const RAW_CONTENT_CHARS: usize = 10_000;
/// News items analyzed per pass.
const NEWS_BATCH: i64 = 500;

/// Counts from one analysis pass.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ProcessReport {
    pub page_changes_processed: usize,
    pub news_processed: usize,
    pub alerts_created: usize,
}

/// Classifies content with the LLM and raises alerts.
pub struct Analyzer {
    db: Arc<Database>,
    llm: Arc<dyn LlmProvider>,
    config: AnalysisConfig,
    max_tokens: usize,
    notifier: Option<Arc<Notifier>>,
    insights: Option<Arc<InsightGenerator>>,
}

impl Analyzer {
    /// Create a new analyzer.
    pub fn new(
        db: Arc<Database>,
        llm: Arc<dyn LlmProvider>,
        config: AnalysisConfig,
        max_tokens: usize,
    ) -> Self {
        Self {
            db,
            llm,
            config,
            max_tokens,
            notifier: None,
            insights: None,
        }
    }

    /// Send new alerts through `notifier`.
    pub fn with_notifier(mut self, notifier: Arc<Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Generate insights for significant alerts with `generator`.
    pub fn with_insights(mut self, generator: Arc<InsightGenerator>) -> Self {
        self.insights = Some(generator);
        self
    }

    /// Classify content. Model failures yield [`AnalysisResult::fallback`].
    pub async fn analyze_content(
        &self,
        content: &str,
        competitor_name: &str,
        source_type: &str,
        additional_context: Option<&str>,
    ) -> AnalysisResult {
        let prompt = analysis_prompt(
            &self.config,
            content,
            competitor_name,
            source_type,
            additional_context,
        );
        let request = LlmRequest::new(prompt).with_max_tokens(self.max_tokens);

        match generate_json(self.llm.as_ref(), request).await {
            Ok(value) => AnalysisResult::from_json(value),
            Err(e) => {
                error!("Error during LLM analysis: {}", e);
                AnalysisResult::fallback(&e.to_string())
            }
        }
    }

    /// Analyze a changed page snapshot and raise an alert for it.
    pub async fn analyze_page_change(&self, snapshot: &PageSnapshot) -> Result<Alert> {
        let url = MonitoredUrlRepository::new(self.db.pool())
            .get_by_id(snapshot.monitored_url_id)
            .await?
            .ok_or_else(|| RivalError::NotFound("Monitored URL".into()))?;
        let competitor = CompetitorRepository::new(self.db.pool())
            .get_by_id(url.competitor_id)
            .await?
            .ok_or_else(|| RivalError::NotFound("Competitor".into()))?;

        let text = snapshot.extracted_text.as_deref().unwrap_or_default();
        let excerpt = if text.is_empty() {
            "Content not available".to_string()
        } else {
            truncate_chars(text, PROMPT_EXCERPT_CHARS)
        };
        let content = format!(
            "## Page Changed\nURL: {}\nPage Type: {}\nChange Detected: {}\n\n\
             ## Changes Detected\n{}\n\n\
             ## Current Page Content (excerpt)\n{}\n",
            url.url,
            url.page_type,
            to_db_string(&snapshot.captured_at),
            snapshot
                .diff_summary
                .as_deref()
                .unwrap_or("Full page content changed"),
            excerpt,
        );
        let additional = format!("This is a {} page", url.page_type);

        let result = self
            .analyze_content(&content, &competitor.name, "page change", Some(&additional))
            .await;

        let alert = AlertRepository::new(self.db.pool())
            .create(&NewAlert {
                competitor_id: competitor.id,
                source_type: SourceType::PageChange,
                source_id: Some(snapshot.id),
                source_url: Some(url.url.clone()),
                title: format!("{}: {} Detected", competitor.name, result.signal_type.title()),
                summary: Some(result.summary.clone()),
                raw_content: (!text.is_empty()).then(|| truncate_chars(text, RAW_CONTENT_CHARS)),
                diff_content: snapshot.diff_summary.clone(),
                ..alert_fields(&result)
            })
            .await?;

        info!(
            "Created alert {} for page change on {}",
            alert.id, url.url
        );
        self.after_alert(&alert).await;
        Ok(alert)
    }

    /// Analyze a news item. Returns the alert if the item was relevant.
    pub async fn analyze_news_item(&self, item: &NewsItem) -> Result<Option<Alert>> {
        let news = NewsRepository::new(self.db.pool());
        let alerts = AlertRepository::new(self.db.pool());

        if alerts
            .exists_recent_for_url(&item.url, self.config.duplicate_window_hours)
            .await?
        {
            info!(
                "Skipping news item (recent alert exists): {}",
                truncate_chars(&item.title, 50)
            );
            news.mark_processed(item.id, false).await?;
            return Ok(None);
        }

        let competitor_name = item.competitor_name.as_deref().unwrap_or("Unknown");
        let content = format!(
            "## News Article\nTitle: {}\nSource: {}\nPublished: {}\nURL: {}\n\n\
             ## Article Content\n{}\n\n{}\n",
            item.title,
            item.source.as_deref().unwrap_or_default(),
            item.published_at
                .as_ref()
                .map(to_db_string)
                .unwrap_or_default(),
            item.url,
            item.description.as_deref().unwrap_or_default(),
            item.content.as_deref().unwrap_or_default(),
        );

        let result = self
            .analyze_content(&content, competitor_name, "news article", None)
            .await;

        let is_relevant = result.risk_score >= self.config.min_risk_threshold;
        news.mark_processed(item.id, is_relevant).await?;
        if !is_relevant {
            debug!("News item {} below relevance threshold", item.id);
            return Ok(None);
        }
        let Some(competitor_id) = item.competitor_id else {
            debug!("News item {} has no competitor; no alert raised", item.id);
            return Ok(None);
        };

        let alert = alerts
            .create(&NewAlert {
                competitor_id,
                source_type: SourceType::News,
                source_id: Some(item.id),
                source_url: Some(item.url.clone()),
                title: format!("{}: {}", competitor_name, truncate_chars(&item.title, 100)),
                summary: Some(result.summary.clone()),
                raw_content: Some(format!(
                    "{}\n\n{}",
                    item.description.as_deref().unwrap_or_default(),
                    item.content.as_deref().unwrap_or_default()
                )),
                ..alert_fields(&result)
            })
            .await?;

        info!(
            "Created alert {} for news item: {}",
            alert.id,
            truncate_chars(&item.title, 50)
        );
        self.after_alert(&alert).await;
        Ok(Some(alert))
    }

    async fn after_alert(&self, alert: &Alert) {
        if let Some(notifier) = self.notifier.as_ref().filter(|n| n.is_configured()) {
            if let Err(e) = notifier.send_alert(alert, None).await {
                warn!("Failed to notify for alert {}: {}", alert.id, e);
            }
        }

        if !self.config.auto_insights || !alert.risk_level.is_significant() {
            return;
        }
        if let Some(generator) = &self.insights {
            match generator.generate_from_alert(alert).await {
                Ok(insight) => info!(
                    "Auto-generated insight {} for alert {}",
                    insight.id, alert.id
                ),
                Err(e) => warn!(
                    "Error auto-generating insight for alert {}: {}",
                    alert.id, e
                ),
            }
        }
    }

    /// Analyze every unanalyzed page change and unprocessed news item.
    ///
    /// A failing item is logged and skipped.
    pub async fn process_pending(&self) -> Result<ProcessReport> {
        let mut report = ProcessReport::default();

        let snapshots = SnapshotRepository::new(self.db.pool())
            .list_unanalyzed_changes()
            .await?;
        for snapshot in &snapshots {
            match self.analyze_page_change(snapshot).await {
                Ok(_) => {
                    report.page_changes_processed += 1;
                    report.alerts_created += 1;
                }
                Err(e) => error!("Error processing snapshot {}: {}", snapshot.id, e),
            }
        }

        let items = NewsRepository::new(self.db.pool())
            .list_unprocessed(NEWS_BATCH)
            .await?;
        for item in &items {
            match self.analyze_news_item(item).await {
                Ok(alert) => {
                    report.news_processed += 1;
                    if alert.is_some() {
                        report.alerts_created += 1;
                    }
                }
                Err(e) => error!("Error processing news item {}: {}", item.id, e),
            }
        }

        info!(
            "Analysis complete: {} page changes, {} news items, {} alerts",
            report.page_changes_processed, report.news_processed, report.alerts_created
        );
        Ok(report)
    }
}

/// Alert fields shared by every source.
fn alert_fields(result: &AnalysisResult) -> NewAlert {
    NewAlert {
        signal_type: result.signal_type,
        risk_level: result.risk_level,
        risk_score: Some(result.risk_score),
        confidence_score: Some(result.confidence_score),
        analysis: Some(result.raw_analysis.clone()),
        relevance_explanation: Some(result.relevance_explanation.clone()),
        assumptions: Some(result.assumptions_text()),
        recommended_actions: result.recommended_actions.clone(),
        playbook_used: result.playbook_used.clone(),
        ..Default::default()
    }
}
