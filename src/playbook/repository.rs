//! Playbook repository.

use chrono::Utc;

use super::types::{CompetitivePlaybook, NewPlaybook, DEFAULT_PRIORITY};
use crate::datetime::parse_db_datetime;
use crate::db::json::{string_list, to_json_text, value_list};
use crate::db::{DbPool, SQL_TRUE};
use crate::{Result, RivalError};

const PLAYBOOK_COLUMNS: &str = "id, name, slug, description, trigger_signal_types, \
     trigger_keywords, sales_actions, marketing_actions, product_actions, executive_actions, \
     email_templates, talk_tracks, escalation_criteria, escalation_contacts, is_active, \
     priority, created_at, updated_at";

#[derive(Debug, Clone, sqlx::FromRow)]
struct PlaybookRow {
    id: i64,
    name: String,
    slug: String,
    description: Option<String>,
    trigger_signal_types: String,
    trigger_keywords: String,
    sales_actions: String,
    marketing_actions: String,
    product_actions: String,
    executive_actions: String,
    email_templates: String,
    talk_tracks: String,
    escalation_criteria: Option<String>,
    escalation_contacts: String,
    is_active: bool,
    priority: i64,
    created_at: String,
    updated_at: String,
}

impl From<PlaybookRow> for CompetitivePlaybook {
    fn from(row: PlaybookRow) -> Self {
        CompetitivePlaybook {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            trigger_signal_types: string_list(&row.trigger_signal_types),
            trigger_keywords: string_list(&row.trigger_keywords),
            sales_actions: string_list(&row.sales_actions),
            marketing_actions: string_list(&row.marketing_actions),
            product_actions: string_list(&row.product_actions),
            executive_actions: string_list(&row.executive_actions),
            email_templates: value_list(&row.email_templates),
            talk_tracks: value_list(&row.talk_tracks),
            escalation_criteria: row.escalation_criteria,
            escalation_contacts: string_list(&row.escalation_contacts),
            is_active: row.is_active,
            priority: row.priority,
            created_at: parse_db_datetime(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_db_datetime(&row.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Repository for competitive playbooks.
pub struct PlaybookRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> PlaybookRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Store a playbook. New playbooks are active.
    pub async fn create(&self, playbook: &NewPlaybook) -> Result<CompetitivePlaybook> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO competitive_playbooks (
                name, slug, description, trigger_signal_types, trigger_keywords,
                sales_actions, marketing_actions, product_actions, executive_actions,
                email_templates, talk_tracks, escalation_criteria, escalation_contacts, priority
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id
            "#,
        )
        .bind(playbook.name.trim())
        .bind(playbook.resolved_slug())
        .bind(&playbook.description)
        .bind(to_json_text(&playbook.trigger_signal_types)?)
        .bind(to_json_text(&playbook.trigger_keywords)?)
        .bind(to_json_text(&playbook.sales_actions)?)
        .bind(to_json_text(&playbook.marketing_actions)?)
        .bind(to_json_text(&playbook.product_actions)?)
        .bind(to_json_text(&playbook.executive_actions)?)
        .bind(to_json_text(&playbook.email_templates)?)
        .bind(to_json_text(&playbook.talk_tracks)?)
        .bind(&playbook.escalation_criteria)
        .bind(to_json_text(&playbook.escalation_contacts)?)
        .bind(playbook.priority.unwrap_or(DEFAULT_PRIORITY))
        .fetch_one(self.pool)
        .await
        .map_err(|e| RivalError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| RivalError::NotFound("Playbook".into()))
    }

    /// Get a playbook by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<CompetitivePlaybook>> {
        let query = format!("SELECT {PLAYBOOK_COLUMNS} FROM competitive_playbooks WHERE id = $1");
        let row = sqlx::query_as::<_, PlaybookRow>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(row.map(CompetitivePlaybook::from))
    }

    /// Get a playbook by slug.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<CompetitivePlaybook>> {
        let query =
            format!("SELECT {PLAYBOOK_COLUMNS} FROM competitive_playbooks WHERE slug = $1");
        let row = sqlx::query_as::<_, PlaybookRow>(&query)
            .bind(slug)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(row.map(CompetitivePlaybook::from))
    }

    /// List playbooks, highest priority first.
    pub async fn list(&self, active_only: bool) -> Result<Vec<CompetitivePlaybook>> {
        let filter = if active_only {
            format!("WHERE is_active = {SQL_TRUE} ")
        } else {
            String::new()
        };
        let query = format!(
            "SELECT {PLAYBOOK_COLUMNS} FROM competitive_playbooks {filter}\
             ORDER BY priority DESC, id ASC"
        );
        let rows = sqlx::query_as::<_, PlaybookRow>(&query)
            .fetch_all(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(CompetitivePlaybook::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_defaults() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = PlaybookRepository::new(db.pool());

        let mut new = NewPlaybook::new("Pricing Change Response");
        new.trigger_signal_types = vec!["pricing_change".into()];
        new.email_templates = vec![json!({"subject": "Pricing update", "body": "..."})];
        let playbook = repo.create(&new).await.unwrap();

        assert_eq!(playbook.slug, "pricing_change_response");
        assert_eq!(playbook.priority, DEFAULT_PRIORITY);
        assert!(playbook.is_active);
        assert_eq!(playbook.trigger_signal_types, vec!["pricing_change"]);
        assert_eq!(playbook.email_templates[0]["subject"], "Pricing update");
        assert!(playbook.sales_actions.is_empty());

        let found = repo.get_by_slug("pricing_change_response").await.unwrap();
        assert_eq!(found.map(|p| p.id), Some(playbook.id));
        assert!(repo.get_by_id(playbook.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = PlaybookRepository::new(db.pool());
        repo.create(&NewPlaybook::new("Launch")).await.unwrap();

        let err = repo.create(&NewPlaybook::new("launch")).await.unwrap_err();
        assert!(matches!(err, RivalError::Database(_)));
    }

    #[tokio::test]
    async fn test_list_by_priority() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = PlaybookRepository::new(db.pool());
        for (name, priority) in [("Low", 2), ("High", 9), ("Default", 5)] {
            let mut new = NewPlaybook::new(name);
            new.priority = Some(priority);
            repo.create(&new).await.unwrap();
        }
        sqlx::query("UPDATE competitive_playbooks SET is_active = 0 WHERE slug = 'high'")
            .execute(db.pool())
            .await
            .unwrap();

        let active: Vec<_> = repo.list(true).await.unwrap().into_iter().map(|p| p.slug).collect();
        assert_eq!(active, vec!["default", "low"]);
        let all: Vec<_> = repo.list(false).await.unwrap().into_iter().map(|p| p.slug).collect();
        assert_eq!(all, vec!["high", "default", "low"]);
    }
}
