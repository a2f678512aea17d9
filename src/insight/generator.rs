//! LLM-backed insight generation.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use super::repository::InsightRepository;
use super::types::{Insight, InsightSource, NewInsight, DEFAULT_INSIGHT_TITLE, DEFAULT_SCORE};
use crate::alert::{Alert, AlertRepository};
use crate::config::AnalysisConfig;
use crate::datetime::to_db_string;
use crate::db::json::{value_to_object, value_to_string_list};
use crate::llm::{generate_json, score_field, string_field, LlmProvider, LlmRequest};
use crate::news::{NewsItem, NewsRepository};
use crate::{Database, Result};

const UNKNOWN_COMPETITOR: &str = "Unknown Competitor";

const INSIGHT_SCHEMA: &str = r#"{
    "title": "Brief, impactful title summarizing the competitive insight",
    "executive_summary": "2-3 sentence summary for executives",

    "competitor_product": "Name of competitor's product mentioned (if any)",
    "our_product": "Our most directly competing product",
    "comparison_summary": "Brief comparison of the two products",

    "competitor_advantages": ["Competitor advantages over us"],
    "our_advantages": ["Our advantages to emphasize"],

    "pricing_comparison": "Analysis of pricing differences and implications",

    "feature_comparison": {
        "feature_name": {
            "competitor": "Competitor's spec/capability",
            "ours": "Our spec/capability",
            "winner": "competitor/ours/tie",
            "importance": "high/medium/low"
        }
    },

    "sales_insights": {
        "summary": "Key message for sales team",
        "talking_points": ["Point 1", "Point 2"],
        "objection_handlers": ["How to handle objection 1"],
        "competitive_positioning": "How to position against this",
        "target_opportunities": ["Type of customer/deal to target"],
        "urgency": "high/medium/low"
    },

    "marketing_insights": {
        "summary": "Key message for marketing team",
        "messaging_recommendations": ["Message 1"],
        "content_ideas": ["Blog post idea", "Case study idea"],
        "campaign_suggestions": ["Campaign idea"],
        "social_media_response": "Suggested social media approach",
        "urgency": "high/medium/low"
    },

    "product_insights": {
        "summary": "Key message for product team",
        "feature_gaps": ["Feature we should consider adding"],
        "roadmap_implications": "Impact on product roadmap",
        "innovation_opportunities": ["Opportunity 1"],
        "customer_feedback_to_gather": ["Question to ask customers"],
        "urgency": "high/medium/low"
    },

    "engineering_insights": {
        "summary": "Key message for engineering team",
        "technical_analysis": "Technical comparison of capabilities",
        "r_and_d_priorities": ["Priority 1"],
        "patent_considerations": "Any IP implications",
        "urgency": "high/medium/low"
    },

    "executive_insights": {
        "summary": "Key message for executives",
        "strategic_implications": "Long-term strategic impact",
        "market_share_risk": "Estimated impact on market share",
        "investment_recommendations": ["Recommendation 1"],
        "competitive_response_options": ["Option 1", "Option 2"],
        "urgency": "high/medium/low"
    },

    "immediate_actions": ["Action items for next 24-48 hours"],
    "short_term_actions": ["Action items for next 1-4 weeks"],
    "long_term_actions": ["Strategic actions for next quarter"],

    "impact_score": 75,
    "urgency_score": 80,
    "confidence_score": 85
}"#;

/// Generates team-oriented insights.
pub struct InsightGenerator {
    db: Arc<Database>,
    llm: Arc<dyn LlmProvider>,
    analysis: AnalysisConfig,
    max_tokens: usize,
}

impl InsightGenerator {
    /// Create a new generator.
    pub fn new(
        db: Arc<Database>,
        llm: Arc<dyn LlmProvider>,
        analysis: AnalysisConfig,
        max_tokens: usize,
    ) -> Self {
        Self {
            db,
            llm,
            analysis,
            max_tokens,
        }
    }

    fn build_prompt(&self, content: &str, competitor_name: &str, source_type: &str) -> String {
        let company = &self.analysis.company_name;
        format!(
            "You are a competitive intelligence analyst for {company}.\n\n\
             Analyze the following competitive intelligence about {competitor_name} and \
             generate comprehensive insights for our teams.\n\n\
             CONTENT TO ANALYZE:\n{content}\n\n\
             SOURCE TYPE: {source_type}\n\n\
             {company} PRODUCT CATALOG (for comparison):\n{catalog}\n\n\
             Generate a detailed analysis in JSON format with the following structure \
             (scores are 0-100: impact on {company}, urgency of response, confidence in \
             the analysis):\n{INSIGHT_SCHEMA}\n\n\
             Be specific and actionable. Reference actual {company} products where relevant.\n\
             If the content doesn't clearly indicate a product launch or competitive threat, \
             still provide useful market intelligence.\n",
            catalog = self.analysis.product_catalog,
        )
    }

    /// Generate an insight for `content`.
    ///
    /// Returns the existing insight when one was already generated for the
    /// same alert or news item.
    pub async fn generate(
        &self,
        content: &str,
        competitor_name: &str,
        source_type: &str,
        source: InsightSource,
    ) -> Result<Insight> {
        let repo = InsightRepository::new(self.db.pool());
        if let Some(alert_id) = source.alert_id {
            if let Some(existing) = repo.get_by_alert(alert_id).await? {
                info!("Insight already exists for alert {}, skipping", alert_id);
                return Ok(existing);
            }
        }
        if let Some(news_item_id) = source.news_item_id {
            if let Some(existing) = repo.get_by_news_item(news_item_id).await? {
                info!(
                    "Insight already exists for news item {}, skipping",
                    news_item_id
                );
                return Ok(existing);
            }
        }

        let prompt = self.build_prompt(content, competitor_name, source_type);
        let request = LlmRequest::new(prompt).with_max_tokens(self.max_tokens);
        let result = generate_json(self.llm.as_ref(), request).await?;

        let insight = repo.create(&insight_from_json(&result, source)).await?;
        info!("Generated insight: {}", insight.title);
        Ok(insight)
    }

    /// Generate an insight from an alert.
    pub async fn generate_from_alert(&self, alert: &Alert) -> Result<Insight> {
        let content = format!(
            "Title: {}\nSummary: {}\nSource: {}\nSignal Type: {}\nRisk Level: {}\n\n\
             Raw Content:\n{}\n",
            alert.title,
            alert.summary.as_deref().unwrap_or_default(),
            alert.source_url.as_deref().unwrap_or_default(),
            alert.signal_type,
            alert.risk_level,
            alert
                .raw_content
                .as_deref()
                .or(alert.summary.as_deref())
                .unwrap_or_default(),
        );
        let competitor_name = alert
            .competitor_name
            .as_deref()
            .unwrap_or(UNKNOWN_COMPETITOR);

        self.generate(
            &content,
            competitor_name,
            alert.source_type.as_str(),
            InsightSource {
                alert_id: Some(alert.id),
                news_item_id: None,
                competitor_id: Some(alert.competitor_id),
            },
        )
        .await
    }

    /// Generate an insight from a news item.
    pub async fn generate_from_news(&self, item: &NewsItem) -> Result<Insight> {
        let description = item.description.as_deref().unwrap_or_default();
        let content = format!(
            "Title: {}\nSource: {}\nPublished: {}\n\nDescription:\n{}\n\nContent:\n{}\n",
            item.title,
            item.source.as_deref().unwrap_or_default(),
            item.published_at.as_ref().map(to_db_string).unwrap_or_default(),
            description,
            item.content.as_deref().unwrap_or(description),
        );
        let competitor_name = item
            .competitor_name
            .as_deref()
            .unwrap_or(UNKNOWN_COMPETITOR);

        self.generate(
            &content,
            competitor_name,
            "news",
            InsightSource {
                alert_id: None,
                news_item_id: Some(item.id),
                competitor_id: item.competitor_id,
            },
        )
        .await
    }

    /// Generate insights for high-risk alerts and relevant news that have none.
    ///
    /// `limit` is split between alerts and news, alerts taking the odd one.
    /// Individual failures are logged and skipped.
    pub async fn generate_batch(&self, limit: i64) -> Result<Vec<Insight>> {
        let limit = limit.max(0);
        let alerts = AlertRepository::new(self.db.pool())
            .list_significant_without_insight((limit + 1) / 2)
            .await?;
        let news = NewsRepository::new(self.db.pool())
            .list_relevant_without_insight(limit / 2)
            .await?;

        let mut insights = Vec::new();
        for alert in &alerts {
            match self.generate_from_alert(alert).await {
                Ok(insight) => {
                    info!("Generated insight for alert: {}", alert.title);
                    insights.push(insight);
                }
                Err(e) => warn!("Insight generation failed for alert {}: {}", alert.id, e),
            }
        }
        for item in &news {
            match self.generate_from_news(item).await {
                Ok(insight) => {
                    info!("Generated insight for news: {}", item.title);
                    insights.push(insight);
                }
                Err(e) => warn!("Insight generation failed for news {}: {}", item.id, e),
            }
        }

        Ok(insights)
    }
}

fn insight_from_json(result: &Value, source: InsightSource) -> NewInsight {
    let list = |key: &str| result.get(key).map(value_to_string_list).unwrap_or_default();
    let object = |key: &str| result.get(key).map(value_to_object).unwrap_or_default();

    NewInsight {
        alert_id: source.alert_id,
        news_item_id: source.news_item_id,
        competitor_id: source.competitor_id,
        title: string_field(result, "title").unwrap_or_else(|| DEFAULT_INSIGHT_TITLE.to_string()),
        executive_summary: string_field(result, "executive_summary"),
        competitor_product: string_field(result, "competitor_product"),
        our_product: string_field(result, "our_product"),
        comparison_summary: string_field(result, "comparison_summary"),
        competitor_advantages: list("competitor_advantages"),
        our_advantages: list("our_advantages"),
        pricing_comparison: string_field(result, "pricing_comparison"),
        feature_comparison: object("feature_comparison"),
        sales_insights: object("sales_insights"),
        marketing_insights: object("marketing_insights"),
        product_insights: object("product_insights"),
        engineering_insights: object("engineering_insights"),
        executive_insights: object("executive_insights"),
        immediate_actions: list("immediate_actions"),
        short_term_actions: list("short_term_actions"),
        long_term_actions: list("long_term_actions"),
        impact_score: score_field(result, "impact_score", DEFAULT_SCORE),
        urgency_score: score_field(result, "urgency_score", DEFAULT_SCORE),
        confidence_score: score_field(result, "confidence_score", DEFAULT_SCORE),
    }
}
