//! Feature comparison repository.

use chrono::Utc;
use sqlx::QueryBuilder;

use super::types::{
    Capability, FeatureComparison, FeatureUpdate, NewFeature, DEFAULT_IMPORTANCE,
};
use crate::datetime::parse_db_datetime;
use crate::db::json::{json_object, to_json_text};
use crate::db::{DbPool, SQL_NOW};
use crate::{Result, RivalError};

const FEATURE_COLUMNS: &str = "id, category, feature_name, description, our_capability, \
     our_details, competitor_capabilities, customer_importance, differentiation_level, \
     last_verified, verified_by, created_at, updated_at";

#[derive(Debug, Clone, sqlx::FromRow)]
struct FeatureRow {
    id: i64,
    category: String,
    feature_name: String,
    description: Option<String>,
    our_capability: String,
    our_details: Option<String>,
    competitor_capabilities: String,
    customer_importance: i64,
    differentiation_level: Option<String>,
    last_verified: Option<String>,
    verified_by: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<FeatureRow> for FeatureComparison {
    fn from(row: FeatureRow) -> Self {
        FeatureComparison {
            id: row.id,
            category: row.category,
            feature_name: row.feature_name,
            description: row.description,
            our_capability: row.our_capability.parse().unwrap_or(Capability::Missing),
            our_details: row.our_details,
            competitor_capabilities: json_object(&row.competitor_capabilities),
            customer_importance: row.customer_importance,
            differentiation_level: row.differentiation_level.and_then(|s| s.parse().ok()),
            last_verified: row.last_verified.and_then(|s| parse_db_datetime(&s)),
            verified_by: row.verified_by,
            created_at: parse_db_datetime(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: parse_db_datetime(&row.updated_at).unwrap_or_else(Utc::now),
        }
    }
}

/// Repository for feature comparisons.
pub struct FeatureRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FeatureRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Add a feature to the matrix.
    pub async fn create(&self, feature: &NewFeature) -> Result<FeatureComparison> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO feature_comparisons (
                category, feature_name, description, our_capability, our_details,
                competitor_capabilities, customer_importance, differentiation_level
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(feature.category.trim())
        .bind(feature.feature_name.trim())
        .bind(&feature.description)
        .bind(feature.our_capability.as_str())
        .bind(&feature.our_details)
        .bind(to_json_text(&feature.competitor_capabilities)?)
        .bind(feature.customer_importance.unwrap_or(DEFAULT_IMPORTANCE))
        .bind(feature.differentiation_level.map(|d| d.as_str()))
        .fetch_one(self.pool)
        .await
        .map_err(|e| RivalError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| RivalError::NotFound("Feature".into()))
    }

    /// Get a feature by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<FeatureComparison>> {
        let query = format!("SELECT {FEATURE_COLUMNS} FROM feature_comparisons WHERE id = $1");
        let row = sqlx::query_as::<_, FeatureRow>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(row.map(FeatureComparison::from))
    }

    /// List features by category, most important first within each.
    pub async fn list(&self, category: Option<&str>) -> Result<Vec<FeatureComparison>> {
        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new(format!("SELECT {FEATURE_COLUMNS} FROM feature_comparisons"));
        if let Some(category) = category {
            query.push(" WHERE category = ");
            query.push_bind(category);
        }
        query.push(" ORDER BY category ASC, customer_importance DESC, id ASC");

        let rows = query
            .build_query_as::<FeatureRow>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(FeatureComparison::from).collect())
    }

    /// Every feature ordered by category then name, for export.
    pub async fn list_by_name(&self) -> Result<Vec<FeatureComparison>> {
        let query = format!(
            "SELECT {FEATURE_COLUMNS} FROM feature_comparisons \
             ORDER BY category ASC, feature_name ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, FeatureRow>(&query)
            .fetch_all(self.pool)
            .await
            .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(FeatureComparison::from).collect())
    }

    /// Distinct non-empty categories in alphabetical order.
    pub async fn categories(&self) -> Result<Vec<String>> {
        let categories = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM feature_comparisons \
             WHERE TRIM(category) != '' ORDER BY category ASC",
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| RivalError::Database(e.to_string()))?;

        Ok(categories)
    }

    /// Apply an update and stamp the verification.
    pub async fn update(&self, id: i64, update: &FeatureUpdate) -> Result<bool> {
        let capabilities = update
            .competitor_capabilities
            .as_ref()
            .map(to_json_text)
            .transpose()?;

        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("UPDATE feature_comparisons SET ");
        let mut separated = query.separated(", ");

        if let Some(ref category) = update.category {
            separated.push("category = ");
            separated.push_bind_unseparated(category.trim().to_string());
        }
        if let Some(ref name) = update.feature_name {
            separated.push("feature_name = ");
            separated.push_bind_unseparated(name.trim().to_string());
        }
        if let Some(ref description) = update.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description.clone());
        }
        if let Some(capability) = update.our_capability {
            separated.push("our_capability = ");
            separated.push_bind_unseparated(capability.as_str());
        }
        if let Some(ref details) = update.our_details {
            separated.push("our_details = ");
            separated.push_bind_unseparated(details.clone());
        }
        if let Some(text) = capabilities {
            separated.push("competitor_capabilities = ");
            separated.push_bind_unseparated(text);
        }
        if let Some(importance) = update.customer_importance {
            separated.push("customer_importance = ");
            separated.push_bind_unseparated(importance);
        }
        if let Some(level) = update.differentiation_level {
            separated.push("differentiation_level = ");
            separated.push_bind_unseparated(level.as_str());
        }
        separated.push("verified_by = ");
        separated.push_bind_unseparated(update.verified_by.clone());
        separated.push(format!("last_verified = {SQL_NOW}"));
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
