//! Battle card repository.

use chrono::Utc;
use sqlx::QueryBuilder;

use super::types::{
    BattleCard, BattleCardFilter, BattleCardUpdate, NewBattleCard, Objection, DEFAULT_VERSION,
};
use crate::datetime::parse_db_datetime;
use crate::db::json::{json_object, string_list, to_json_text};
use crate::db::{DbPool, SQL_NOW};
use crate::{Result, RivalError};

const CARD_COLUMNS: &str = "b.id, b.competitor_id, c.name AS competitor_name, b.name, b.version, \
     b.status, b.elevator_pitch, b.target_segment, b.our_strengths, b.our_weaknesses, \
     b.competitor_strengths, b.competitor_weaknesses, b.key_differentiators, b.trap_questions, \
     b.landmine_questions, b.common_objections, b.customer_wins, b.pricing_comparison, \
     b.feature_comparison, b.created_by, b.created_at, b.updated_at, b.last_reviewed_at";

const CARD_FROM: &str = "FROM battle_cards b LEFT JOIN competitors c ON c.id = b.competitor_id";

#[derive(Debug, Clone, sqlx::FromRow)]
struct BattleCardRow {
    id: i64,
    competitor_id: i64,
    competitor_name: Option<String>,
    name: String,
    version: String,
    status: String,
    elevator_pitch: Option<String>,
    target_segment: Option<String>,
    our_strengths: String,
    our_weaknesses: String,
    competitor_strengths: String,
    competitor_weaknesses: String,
    key_differentiators: String,
    trap_questions: String,
    landmine_questions: String,
    common_objections: String,
    customer_wins: String,
    pricing_comparison: String,
    feature_comparison: String,
    created_by: Option<String>,
    created_at: String,
    updated_at: String,
    last_reviewed_at: Option<String>,
}

impl From<BattleCardRow> for BattleCard {
    fn from(row: BattleCardRow) -> Self {
        BattleCard {
            id: row.id,
            competitor_id: row.competitor_id,
            competitor_name: row.competitor_name,
            name: row.name,
            version: row.version,
            status: row.status.parse().unwrap_or_default(),
            elevator_pitch: row.elevator_pitch,
            target_segment: row.target_segment,
            our_strengths: string_list(&row.our_strengths),
            our_weaknesses: string_list(&row.our_weaknesses),
            competitor_strengths: string_list(&row.competitor_strengths),
            competitor_weaknesses: string_list(&row.competitor_weaknesses),
            key_differentiators: string_list(&row.key_differentiators),
            trap_questions: string_list(&row.trap_questions),
            landmine_questions: string_list(&row.landmine_questions),
            common_objections: serde_json::from_str::<Vec<Objection>>(&row.common_objections)
                .unwrap_or_default(),
            customer_wins: string_list(&row.customer_wins),
            pricing_comparison: json_object(&row.pricing_comparison),
            feature_comparison: json_object(&row.feature_comparison),
            created_by: row.created_by,
            created_at: parse_db_datetime(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_db_datetime(&row.updated_at).unwrap_or_else(Utc::now),
            last_reviewed_at: row.last_reviewed_at.and_then(|s| parse_db_datetime(&s)),
        }
    }
}

/// Repository for battle cards.
pub struct BattleCardRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> BattleCardRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a draft battle card.
    pub async fn create(&self, card: &NewBattleCard) -> Result<BattleCard> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO battle_cards (
                competitor_id, name, version, status, elevator_pitch, target_segment,
                our_strengths, our_weaknesses, competitor_strengths, competitor_weaknesses,
                key_differentiators, trap_questions, landmine_questions, common_objections,
                customer_wins, pricing_comparison, feature_comparison, created_by
            )
            VALUES ($1, $2, $3, 'draft', $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING id
            "#,
        )
        .bind(card.competitor_id)
        .bind(&card.name)
        .bind(DEFAULT_VERSION)
        .bind(&card.elevator_pitch)
        .bind(&card.target_segment)
        .bind(to_json_text(&card.our_strengths)?)
        .bind(to_json_text(&card.our_weaknesses)?)
        .bind(to_json_text(&card.competitor_strengths)?)
        .bind(to_json_text(&card.competitor_weaknesses)?)
        .bind(to_json_text(&card.key_differentiators)?)
        .bind(to_json_text(&card.trap_questions)?)
        .bind(to_json_text(&card.landmine_questions)?)
        .bind(to_json_text(&card.common_objections)?)
        .bind(to_json_text(&card.customer_wins)?)
        .bind(to_json_text(&card.pricing_comparison)?)
        .bind(to_json_text(&card.feature_comparison)?)
        .bind(&card.created_by)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RivalError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| RivalError::NotFound("Battle card".into()))
    }

    /// Get a battle card by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<BattleCard>> {
        let query = format!("SELECT {CARD_COLUMNS} {CARD_FROM} WHERE b.id = $1");
        let row = sqlx::query_as::<_, BattleCardRow>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(row.map(BattleCard::from))
    }

    /// List battle cards, most recently updated first.
    pub async fn list(&self, filter: &BattleCardFilter) -> Result<Vec<BattleCard>> {
        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new(format!("SELECT {CARD_COLUMNS} {CARD_FROM} WHERE 1 = 1"));
        if let Some(competitor_id) = filter.competitor_id {
            query.push(" AND b.competitor_id = ");
            query.push_bind(competitor_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND b.status = ");
            query.push_bind(status.as_str());
        }
        query.push(" ORDER BY b.updated_at DESC, b.id DESC");

        let rows = query
            .build_query_as::<BattleCardRow>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(BattleCard::from).collect())
    }

    /// Update a battle card.
    pub async fn update(&self, id: i64, update: &BattleCardUpdate) -> Result<bool> {
        let mut json_columns: Vec<(&'static str, String)> = Vec::new();
        let lists = [
            ("our_strengths", &update.our_strengths),
            ("our_weaknesses", &update.our_weaknesses),
            ("competitor_strengths", &update.competitor_strengths),
            ("competitor_weaknesses", &update.competitor_weaknesses),
            ("key_differentiators", &update.key_differentiators),
            ("trap_questions", &update.trap_questions),
            ("landmine_questions", &update.landmine_questions),
            ("customer_wins", &update.customer_wins),
        ];
        for (column, value) in lists {
            if let Some(value) = value {
                json_columns.push((column, to_json_text(value)?));
            }
        }
        if let Some(ref objections) = update.common_objections {
            json_columns.push(("common_objections", to_json_text(objections)?));
        }
        if let Some(ref pricing) = update.pricing_comparison {
            json_columns.push(("pricing_comparison", to_json_text(pricing)?));
        }
        if let Some(ref features) = update.feature_comparison {
            json_columns.push(("feature_comparison", to_json_text(features)?));
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE battle_cards SET ");
        let mut separated = query.separated(", ");

        if let Some(ref name) = update.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name.clone());
        }
        if let Some(status) = update.status {
            separated.push("status = ");
            separated.push_bind_unseparated(status.as_str());
        }
        if let Some(ref pitch) = update.elevator_pitch {
            separated.push("elevator_pitch = ");
            separated.push_bind_unseparated(pitch.clone());
        }
        if let Some(ref segment) = update.target_segment {
            separated.push("target_segment = ");
            separated.push_bind_unseparated(segment.clone());
        }
        for (column, text) in json_columns {
            separated.push(format!("{column} = "));
            separated.push_bind_unseparated(text);
        }
        if update.mark_reviewed {
            separated.push(format!("last_reviewed_at = {SQL_NOW}"));
        }
        separated.push(format!("updated_at = {SQL_NOW}"));

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
