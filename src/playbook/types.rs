//! Playbook types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Priority given to playbooks created without one.
pub const DEFAULT_PRIORITY: i64 = 5;

/// A stored response plan: which signals trigger it and what each team does.
#[derive(Debug, Clone, Serialize)]
pub struct CompetitivePlaybook {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub trigger_signal_types: Vec<String>,
    pub trigger_keywords: Vec<String>,
    pub sales_actions: Vec<String>,
    pub marketing_actions: Vec<String>,
    pub product_actions: Vec<String>,
    pub executive_actions: Vec<String>,
    /// Free-form template objects, kept as given.
    pub email_templates: Vec<Value>,
    pub talk_tracks: Vec<Value>,
    pub escalation_criteria: Option<String>,
    pub escalation_contacts: Vec<String>,
    pub is_active: bool,
    pub priority: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New playbook for creation.
#[derive(Debug, Clone, Default)]
pub struct NewPlaybook {
    pub name: String,
    /// Derived from the name when absent.
    pub slug: Option<String>,
    pub description: Option<String>,
    pub trigger_signal_types: Vec<String>,
    pub trigger_keywords: Vec<String>,
    pub sales_actions: Vec<String>,
    pub marketing_actions: Vec<String>,
    pub product_actions: Vec<String>,
    pub executive_actions: Vec<String>,
    pub email_templates: Vec<Value>,
    pub talk_tracks: Vec<Value>,
    pub escalation_criteria: Option<String>,
    pub escalation_contacts: Vec<String>,
    pub priority: Option<i64>,
}

impl NewPlaybook {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// The slug to store: the explicit one, or one derived from the name.
    pub fn resolved_slug(&self) -> String {
        self.slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| slug_for(&self.name))
    }
}

/// Lower-cased name with spaces replaced by underscores.
pub fn slug_for(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}
