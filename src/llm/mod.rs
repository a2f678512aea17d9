//! LLM provider abstraction.
//!
//! Analysis, insight and battle card generation talk to the model through
//! [`LlmProvider`], so tests can substitute a scripted provider.

mod remote;

pub use remote::RemoteLlmProvider;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::{Result, RivalError};

/// Core trait for LLM providers.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for a prompt.
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse>;
}

/// Request for LLM generation.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
}

impl LlmRequest {
    /// Create a request using the provider defaults.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: None,
            temperature: None,
            timeout_seconds: None,
        }
    }

    /// Set the token budget.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Response from LLM generation.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub usage: UsageMetadata,
    pub model: String,
}

/// Token usage metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

/// Provider used when no API key is configured. Every call fails.
pub struct DisabledLlmProvider;

#[async_trait::async_trait]
impl LlmProvider for DisabledLlmProvider {
    async fn generate(&self, _request: LlmRequest) -> Result<LlmResponse> {
        Err(RivalError::Llm("LLM API key is not configured".to_string()))
    }
}

/// Build the provider described by the configuration.
pub fn provider_from_config(config: &LlmConfig) -> Arc<dyn LlmProvider> {
    if config.is_configured() {
        Arc::new(
            RemoteLlmProvider::new(&config.base_url, &config.api_key, &config.model).with_defaults(
                config.timeout_secs,
                config.analysis_max_tokens,
                config.temperature,
            ),
        )
    } else {
        tracing::warn!("LLM API key not configured; analysis will use fallback results");
        Arc::new(DisabledLlmProvider)
    }
}

/// Extract a JSON object from model output that may be wrapped in markdown
/// fences or surrounded by prose.
pub fn extract_json(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```json") {
        let rest = &text[start + 7..];
        if let Some(end) = rest.find("```") {
            return Some(rest[..end].trim());
        }
    }

    if let Some(start) = text.find("```") {
        let rest = &text[start + 3..];
        if let Some(end) = rest.find("```") {
            return Some(rest[..end].trim());
        }
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => Some(&text[start..=end]),
        _ => None,
    }
}

/// Generate a completion and parse it as a JSON value.
pub async fn generate_json(
    provider: &dyn LlmProvider,
    request: LlmRequest,
) -> Result<serde_json::Value> {
    let response = provider.generate(request).await?;
    let json = extract_json(&response.content)
        .ok_or_else(|| RivalError::Llm("no JSON object in LLM response".to_string()))?;
    serde_json::from_str(json)
        .map_err(|e| RivalError::Llm(format!("failed to parse LLM response as JSON: {}", e)))
}

/// Read a non-empty string field from an LLM JSON object.
pub fn string_field(value: &serde_json::Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Read a 0..=100 score field, accepting numbers and numeric strings.
pub fn score_field(value: &serde_json::Value, key: &str, default: i64) -> i64 {
    let score = match value.get(key) {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    score
        .map(|s| s.round().clamp(0.0, 100.0) as i64)
        .unwrap_or(default)
}

/// Provider that replays canned responses, for tests.
#[cfg(test)]
pub(crate) struct ScriptedLlm {
    responses: std::sync::Mutex<std::collections::VecDeque<Result<String>>>,
    pub prompts: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl ScriptedLlm {
    pub fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into()),
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn replying(content: &str) -> Self {
        Self::new(vec![Ok(content.to_string())])
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
        self.prompts.lock().unwrap().push(request.prompt);
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RivalError::Llm("no scripted response left".into())));
        next.map(|content| LlmResponse {
            content,
            usage: UsageMetadata::default(),
            model: "scripted".into(),
        })
    }
}
