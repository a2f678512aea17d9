//! LLM drafting of battle cards.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use super::repository::BattleCardRepository;
use super::types::{BattleCard, BattleCardUpdate, NewBattleCard, Objection};
use crate::alert::AlertRepository;
use crate::competitor::CompetitorRepository;
use crate::db::json::value_to_string_list;
use crate::insight::InsightRepository;
use crate::llm::{generate_json, string_field, LlmProvider, LlmRequest};
use crate::{Database, Result, RivalError};

const CONTEXT_ALERTS: i64 = 10;
const CONTEXT_INSIGHTS: i64 = 5;

/// Drafts battle cards from recent intelligence.
pub struct BattleCardGenerator {
    db: Arc<Database>,
    llm: Arc<dyn LlmProvider>,
    company_name: String,
    max_tokens: usize,
}

impl BattleCardGenerator {
    pub fn new(
        db: Arc<Database>,
        llm: Arc<dyn LlmProvider>,
        company_name: impl Into<String>,
        max_tokens: usize,
    ) -> Self {
        Self {
            db,
            llm,
            company_name: company_name.into(),
            max_tokens,
        }
    }

    /// Recent alerts and insights for a competitor, as prompt lines.
    async fn intelligence(&self, competitor_id: i64) -> Result<(String, String)> {
        let alerts = AlertRepository::new(self.db.pool())
            .recent_for_competitor(competitor_id, CONTEXT_ALERTS)
            .await?;
        let insights = InsightRepository::new(self.db.pool())
            .list(Some(competitor_id), 0, CONTEXT_INSIGHTS)
            .await?;

        let alert_lines = alerts
            .iter()
            .map(|a| format!("- {}: {}", a.title, a.summary.as_deref().unwrap_or_default()))
            .collect::<Vec<_>>()
            .join("\n");
        let insight_lines = insights
            .iter()
            .map(|i| {
                format!(
                    "- {}: {}",
                    i.title,
                    i.executive_summary.as_deref().unwrap_or_default()
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        Ok((alert_lines, insight_lines))
    }

    /// Ask the model for battle card content and store it as a new draft.
    pub async fn generate(&self, competitor_id: i64) -> Result<BattleCard> {
        let competitor = CompetitorRepository::new(self.db.pool())
            .get_by_id(competitor_id)
            .await?
            .ok_or_else(|| RivalError::NotFound("Competitor".into()))?;
        let (alert_lines, insight_lines) = self.intelligence(competitor_id).await?;

        let prompt = format!(
            "You write battle cards for the {company} sales team.\n\
             Based on this competitive intelligence, generate battle card content.\n\n\
             Competitor: {name}\n\n\
             Recent Alerts:\n{alert_lines}\n\n\
             Recent Insights:\n{insight_lines}\n\n\
             Generate:\n\
             1. A compelling elevator pitch positioning {company} against {name}\n\
             2. 3-5 strengths of {company} and 3-5 of {name}\n\
             3. 3-5 weaknesses of {name}\n\
             4. 3-5 key differentiators (our advantages)\n\
             5. 3-5 trap questions to ask prospects that highlight competitor weaknesses\n\
             6. 3-5 landmine questions prospects might ask (with suggested responses)\n\
             7. 3-5 common objections and responses\n\n\
             Return a JSON object with keys: elevator_pitch, our_strengths, \
             competitor_strengths, competitor_weaknesses, key_differentiators, trap_questions, \
             landmine_questions, objections (a list of {{\"objection\", \"response\"}} objects).",
            company = self.company_name,
            name = competitor.name,
        );

        let request = LlmRequest::new(prompt).with_max_tokens(self.max_tokens);
        let result = generate_json(self.llm.as_ref(), request).await?;
        let list = |key: &str| result.get(key).map(value_to_string_list).unwrap_or_default();

        let card = BattleCardRepository::new(self.db.pool())
            .create(&NewBattleCard {
                competitor_id,
                name: format!("{} Battle Card", competitor.name),
                elevator_pitch: string_field(&result, "elevator_pitch"),
                our_strengths: list("our_strengths"),
                competitor_strengths: list("competitor_strengths"),
                competitor_weaknesses: list("competitor_weaknesses"),
                key_differentiators: list("key_differentiators"),
                trap_questions: list("trap_questions"),
                landmine_questions: list("landmine_questions"),
                common_objections: objections(result.get("objections")),
                created_by: Some("rivalwatch".into()),
                ..Default::default()
            })
            .await?;

        info!(
            "Generated battle card {} for {}",
            card.id, competitor.name
        );
        Ok(card)
    }

    /// Refresh the sales content of an existing card from recent intelligence.
    ///
    /// Only fields the model returns non-empty are overwritten; everything
    /// else on the card is kept.
    pub async fn enhance(&self, card_id: i64) -> Result<BattleCard> {
        let repo = BattleCardRepository::new(self.db.pool());
        let card = repo
            .get_by_id(card_id)
            .await?
            .ok_or_else(|| RivalError::NotFound("Battle card".into()))?;
        let name = match card.competitor_name.clone() {
            Some(name) => name,
            None => CompetitorRepository::new(self.db.pool())
                .get_by_id(card.competitor_id)
                .await?
                .map(|c| c.name)
                .unwrap_or_else(|| "Unknown Competitor".into()),
        };
        let (alert_lines, insight_lines) = self.intelligence(card.competitor_id).await?;

        let prompt = format!(
            "You write battle cards for the {company} sales team.\n\
             Based on this competitive intelligence, generate battle card content.\n\n\
             Competitor: {name}\n\n\
             Recent Alerts:\n{alert_lines}\n\n\
             Recent Insights:\n{insight_lines}\n\n\
             Generate:\n\
             1. A compelling elevator pitch positioning {company} against {name}\n\
             2. 3-5 key differentiators (our advantages)\n\
             3. 3-5 trap questions to ask prospects that highlight competitor weaknesses\n\
             4. 3-5 landmine questions prospects might ask (with suggested responses)\n\
             5. 3-5 common objections and responses\n\n\
             Return a JSON object with keys: elevator_pitch, key_differentiators, \
             trap_questions, landmine_questions, objections (a list of \
             {{\"objection\", \"response\"}} objects).",
            company = self.company_name,
        );

        let request = LlmRequest::new(prompt).with_max_tokens(self.max_tokens);
        let result = generate_json(self.llm.as_ref(), request).await?;
        let list = |key: &str| {
            Some(result.get(key).map(value_to_string_list).unwrap_or_default())
                .filter(|items| !items.is_empty())
        };

        let update = BattleCardUpdate {
            elevator_pitch: string_field(&result, "elevator_pitch").map(Some),
            key_differentiators: list("key_differentiators"),
            trap_questions: list("trap_questions"),
            landmine_questions: list("landmine_questions"),
            common_objections: Some(objections(result.get("objections")))
                .filter(|items| !items.is_empty()),
            ..Default::default()
        };
        repo.update(card_id, &update).await?;
        info!("Enhanced battle card {} for {}", card_id, name);

        repo.get_by_id(card_id)
            .await?
            .ok_or_else(|| RivalError::NotFound("Battle card".into()))
    }
}

/// Objections as objects, or plain strings without a response.
fn objections(value: Option<&Value>) -> Vec<Objection> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Some(Objection {
                objection: s.clone(),
                response: String::new(),
            }),
            Value::Object(_) => serde_json::from_value(item.clone()).ok(),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle_card::BattleCardStatus;
    use crate::competitor::NewCompetitor;
    use crate::llm::ScriptedLlm;
    use serde_json::json;

    #[test]
    fn test_objections_accepts_mixed_items() {
        let value = json!([
            {"objection": "Price", "response": "TCO"},
            "Brand",
            {"response": "no objection key"},
            3
        ]);
        let parsed = objections(Some(&value));
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].objection, "Brand");
        assert!(objections(None).is_empty());
    }

    #[tokio::test]
    async fn test_generate_stores_draft() {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let competitor = CompetitorRepository::new(db.pool())
            .create(&NewCompetitor::new("Hioki"))
            .await
            .unwrap();
        let llm = Arc::new(ScriptedLlm::replying(
            r#"{"elevator_pitch": "Trusted in the field",
                "key_differentiators": ["Safety ratings"],
                "objections": [{"objection": "Price", "response": "Lifetime value"}]}"#,
        ));

        let card = BattleCardGenerator::new(db.clone(), llm.clone(), "Acme", 2000)
            .generate(competitor.id)
            .await
            .unwrap();
        assert_eq!(card.name, "Hioki Battle Card");
        assert_eq!(card.status, BattleCardStatus::Draft);
        assert_eq!(card.elevator_pitch.as_deref(), Some("Trusted in the field"));
        assert_eq!(card.common_objections.len(), 1);
        assert!(llm.prompts.lock().unwrap()[0].contains("Competitor: Hioki"));
    }

    #[tokio::test]
    async fn test_enhance_overwrites_only_returned_fields() {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let competitor = CompetitorRepository::new(db.pool())
            .create(&NewCompetitor::new("Hioki"))
            .await
            .unwrap();
        let repo = BattleCardRepository::new(db.pool());
        let card = repo
            .create(&NewBattleCard {
                competitor_id: competitor.id,
                name: "Field sales card".into(),
                elevator_pitch: Some("Old pitch".into()),
                our_strengths: vec!["Service network".into()],
                trap_questions: vec!["Ask about calibration".into()],
                ..Default::default()
            })
            .await
            .unwrap();
        let llm = Arc::new(ScriptedLlm::replying(
            r#"{"elevator_pitch": "New pitch",
                "key_differentiators": ["Safety ratings"],
                "trap_questions": [],
                "objections": [{"objection": "Price", "response": "Lifetime value"}]}"#,
        ));

        let enhanced = BattleCardGenerator::new(db.clone(), llm.clone(), "Acme", 2000)
            .enhance(card.id)
            .await
            .unwrap();
        assert_eq!(enhanced.id, card.id);
        assert_eq!(enhanced.name, "Field sales card");
        assert_eq!(enhanced.elevator_pitch.as_deref(), Some("New pitch"));
        assert_eq!(enhanced.key_differentiators, vec!["Safety ratings"]);
        assert_eq!(enhanced.trap_questions, vec!["Ask about calibration"]);
        assert_eq!(enhanced.our_strengths, vec!["Service network"]);
        assert_eq!(enhanced.common_objections.len(), 1);
        assert!(llm.prompts.lock().unwrap()[0].contains("Competitor: Hioki"));
        assert_eq!(repo.list(&Default::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_enhance_unknown_card() {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let llm = Arc::new(ScriptedLlm::replying("{}"));
        let err = BattleCardGenerator::new(db, llm.clone(), "Acme", 2000)
            .enhance(7)
            .await
            .unwrap_err();
        assert!(matches!(err, RivalError::NotFound(_)));
        assert_eq!(llm.prompt_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_unknown_competitor() {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let llm = Arc::new(ScriptedLlm::replying("{}"));
        let err = BattleCardGenerator::new(db, llm, "Acme", 2000)
            .generate(42)
            .await
            .unwrap_err();
        assert!(matches!(err, RivalError::NotFound(_)));
    }
}
