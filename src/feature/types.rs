//! Feature comparison types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::competitor::Competitor;

/// Customer importance given to features created without one.
pub const DEFAULT_IMPORTANCE: i64 = 5;

/// How far a product supports a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Full,
    Partial,
    Planned,
    #[default]
    #[serde(rename = "none")]
    Missing,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Full => "full",
            Capability::Partial => "partial",
            Capability::Planned => "planned",
            Capability::Missing => "none",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(Capability::Full),
            "partial" => Ok(Capability::Partial),
            "planned" => Ok(Capability::Planned),
            "none" => Ok(Capability::Missing),
            _ => Err(format!("unknown capability: {s}")),
        }
    }
}

/// Where we stand on a feature relative to the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifferentiationLevel {
    Unique,
    Better,
    Parity,
    Weaker,
}

impl DifferentiationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifferentiationLevel::Unique => "unique",
            DifferentiationLevel::Better => "better",
            DifferentiationLevel::Parity => "parity",
            DifferentiationLevel::Weaker => "weaker",
        }
    }
}

impl FromStr for DifferentiationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unique" => Ok(DifferentiationLevel::Unique),
            "better" => Ok(DifferentiationLevel::Better),
            "parity" => Ok(DifferentiationLevel::Parity),
            "weaker" => Ok(DifferentiationLevel::Weaker),
            _ => Err(format!("unknown differentiation level: {s}")),
        }
    }
}

/// One competitor's entry in `competitor_capabilities`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompetitorCapability {
    pub capability: String,
    pub details: String,
}

/// A feature row of the comparison matrix.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureComparison {
    pub id: i64,
    pub category: String,
    pub feature_name: String,
    pub description: Option<String>,
    pub our_capability: Capability,
    pub our_details: Option<String>,
    /// Keyed by competitor id: `{"capability": .., "details": ..}`.
    pub competitor_capabilities: Map<String, Value>,
    pub customer_importance: i64,
    pub differentiation_level: Option<DifferentiationLevel>,
    pub last_verified: Option<DateTime<Utc>>,
    pub verified_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeatureComparison {
    /// The entry recorded for a competitor, if any.
    ///
    /// A bare string entry is read as the capability with no details.
    pub fn competitor_capability(&self, competitor_id: i64) -> Option<CompetitorCapability> {
        let text = |value: Option<&Value>| {
            value
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_default()
        };
        match self.competitor_capabilities.get(&competitor_id.to_string())? {
            Value::Object(entry) => Some(CompetitorCapability {
                capability: text(entry.get("capability")),
                details: text(entry.get("details")),
            }),
            Value::String(capability) => Some(CompetitorCapability {
                capability: capability.clone(),
                details: String::new(),
            }),
            _ => None,
        }
    }
}

/// New feature for creation.
#[derive(Debug, Clone, Default)]
pub struct NewFeature {
    pub category: String,
    pub feature_name: String,
    pub description: Option<String>,
    pub our_capability: Capability,
    pub our_details: Option<String>,
    pub competitor_capabilities: Map<String, Value>,
    pub customer_importance: Option<i64>,
    pub differentiation_level: Option<DifferentiationLevel>,
}

impl NewFeature {
    pub fn new(category: impl Into<String>, feature_name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            feature_name: feature_name.into(),
            ..Default::default()
        }
    }
}

/// Partial feature update. `None` leaves a field unchanged.
///
/// Every update re-verifies the row: `last_verified` becomes now and
/// `verified_by` is replaced, even when absent.
#[derive(Debug, Clone, Default)]
pub struct FeatureUpdate {
    pub category: Option<String>,
    pub feature_name: Option<String>,
    pub description: Option<String>,
    pub our_capability: Option<Capability>,
    pub our_details: Option<String>,
    pub competitor_capabilities: Option<Map<String, Value>>,
    pub customer_importance: Option<i64>,
    pub differentiation_level: Option<DifferentiationLevel>,
    pub verified_by: Option<String>,
}

/// A feature as shown in the matrix view.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixFeature {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub importance: i64,
    pub our_capability: Capability,
    pub our_details: Option<String>,
    pub competitors: Map<String, Value>,
}

/// A matrix column.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixCompetitor {
    pub id: i64,
    pub name: String,
}

/// Features grouped by category, with the active competitors as columns.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeatureMatrix {
    pub categories: BTreeMap<String, Vec<MatrixFeature>>,
    pub competitors: Vec<MatrixCompetitor>,
}

impl FeatureMatrix {
    /// Group features by category, keeping their order within each group.
    pub fn build(features: Vec<FeatureComparison>, competitors: &[Competitor]) -> Self {
        let mut categories: BTreeMap<String, Vec<MatrixFeature>> = BTreeMap::new();
        for feature in features {
            categories
                .entry(feature.category)
                .or_default()
                .push(MatrixFeature {
                    id: feature.id,
                    name: feature.feature_name,
                    description: feature.description,
                    importance: feature.customer_importance,
                    our_capability: feature.our_capability,
                    our_details: feature.our_details,
                    competitors: feature.competitor_capabilities,
                });
        }
        FeatureMatrix {
            categories,
            competitors: competitors
                .iter()
                .map(|c| MatrixCompetitor {
                    id: c.id,
                    name: c.name.clone(),
                })
                .collect(),
        }
    }
}
