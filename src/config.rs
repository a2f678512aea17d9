//! Configuration module for rivalwatch.

use serde::Deserialize;
use std::path::Path;

use crate::{Result, RivalError};

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/rivalwatch.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/rivalwatch.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Web API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Host address to bind.
    #[serde(default = "default_web_host")]
    pub host: String,
    /// Port number for the API.
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// CORS allowed origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Public URL of the dashboard, used for links in notifications.
    #[serde(default = "default_app_url")]
    pub app_url: String,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    8080
}

fn default_app_url() -> String {
    "http://localhost:8080".to_string()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            cors_origins: vec![],
            app_url: default_app_url(),
        }
    }
}

/// Page monitoring and outbound HTTP configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Delay between page checks in milliseconds.
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Maximum response body size in bytes.
    #[serde(default = "default_max_body_size")]
    pub max_body_bytes: u64,
    /// Maximum number of characters stored per snapshot field.
    #[serde(default = "default_max_stored_chars")]
    pub max_stored_chars: usize,
    /// Allow fetching private and loopback hosts.
    #[serde(default)]
    pub allow_private_hosts: bool,
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_request_delay() -> u64 {
    2000
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    20
}

fn default_total_timeout() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    5
}

fn default_max_body_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_max_stored_chars() -> usize {
    50_000
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: default_request_delay(),
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            total_timeout_secs: default_total_timeout(),
            max_redirects: default_max_redirects(),
            max_body_bytes: default_max_body_size(),
            max_stored_chars: default_max_stored_chars(),
            allow_private_hosts: false,
            user_agent: default_user_agent(),
        }
    }
}

/// A configured RSS/Atom feed that is scanned for every competitor.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FeedSource {
    /// Display name, used as the item source when the feed has no title.
    pub name: String,
    /// Feed URL.
    pub url: String,
}

/// News collection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsConfig {
    /// Default look-back window in days.
    #[serde(default = "default_days_back")]
    pub default_days_back: i64,
    /// Whether to search Google News RSS.
    #[serde(default = "default_google_news_enabled")]
    pub google_news_enabled: bool,
    /// Google News RSS search endpoint.
    #[serde(default = "default_google_news_url")]
    pub google_news_url: String,
    /// NewsAPI key. Empty or placeholder values disable NewsAPI.
    #[serde(default)]
    pub newsapi_key: String,
    /// NewsAPI `everything` endpoint.
    #[serde(default = "default_newsapi_url")]
    pub newsapi_url: String,
    /// Additional feeds scanned for every competitor.
    #[serde(default)]
    pub rss_feeds: Vec<FeedSource>,
}

fn default_days_back() -> i64 {
    7
}

fn default_google_news_enabled() -> bool {
    true
}

fn default_google_news_url() -> String {
    "https://news.google.com/rss/search".to_string()
}

fn default_newsapi_url() -> String {
    "https://newsapi.org/v2/everything".to_string()
}

impl NewsConfig {
    /// The NewsAPI key, if one is actually configured.
    pub fn newsapi_key(&self) -> Option<&str> {
        let key = self.newsapi_key.trim();
        if key.is_empty() || key.to_lowercase().contains("your-") {
            None
        } else {
            Some(key)
        }
    }
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            default_days_back: default_days_back(),
            google_news_enabled: default_google_news_enabled(),
            google_news_url: default_google_news_url(),
            newsapi_key: String::new(),
            newsapi_url: default_newsapi_url(),
            rss_feeds: vec![],
        }
    }
}

/// LLM provider configuration (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Chat completions endpoint.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// API key. Empty disables LLM calls.
    #[serde(default)]
    pub api_key: String,
    /// Model name.
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Request timeout in seconds.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    /// Sampling temperature.
    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,
    /// Token budget for signal analysis.
    #[serde(default = "default_analysis_max_tokens")]
    pub analysis_max_tokens: usize,
    /// Token budget for insight and battle card generation.
    #[serde(default = "default_insight_max_tokens")]
    pub insight_max_tokens: usize,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_llm_temperature() -> f32 {
    0.3
}

fn default_analysis_max_tokens() -> usize {
    2000
}

fn default_insight_max_tokens() -> usize {
    4000
}

impl LlmConfig {
    /// Whether an API key is available.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key: String::new(),
            model: default_llm_model(),
            timeout_secs: default_llm_timeout(),
            temperature: default_llm_temperature(),
            analysis_max_tokens: default_analysis_max_tokens(),
            insight_max_tokens: default_insight_max_tokens(),
        }
    }
}

/// Analysis configuration: who "we" are and how signals are triaged.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum risk score for a news item to be considered relevant.
    #[serde(default = "default_min_risk_threshold")]
    pub min_risk_threshold: i64,
    /// Window in hours in which a second alert for the same URL is suppressed.
    #[serde(default = "default_duplicate_window")]
    pub duplicate_window_hours: i64,
    /// Generate insights automatically for high and critical alerts.
    #[serde(default = "default_auto_insights")]
    pub auto_insights: bool,
    /// Our company name.
    #[serde(default = "default_company_name")]
    pub company_name: String,
    /// Markdown description of our company, markets and priorities.
    #[serde(default = "default_company_context")]
    pub company_context: String,
    /// Markdown description of our product lines.
    #[serde(default = "default_product_catalog")]
    pub product_catalog: String,
}

fn default_min_risk_threshold() -> i64 {
    40
}

fn default_duplicate_window() -> i64 {
    6
}

fn default_auto_insights() -> bool {
    true
}

fn default_company_name() -> String {
    "Our Company".to_string()
}

fn default_company_context() -> String {
    "# Company Context\n\n\
     We build and sell products that compete directly with the monitored companies.\n\
     Describe markets, competitive advantages and strategic priorities here."
        .to_string()
}

fn default_product_catalog() -> String {
    "# Product Catalog\n\nList product lines, flagship models and price ranges here.".to_string()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_risk_threshold: default_min_risk_threshold(),
            duplicate_window_hours: default_duplicate_window(),
            auto_insights: default_auto_insights(),
            company_name: default_company_name(),
            company_context: default_company_context(),
            product_catalog: default_product_catalog(),
        }
    }
}

/// Notification configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Channels used when none is requested explicitly.
    /// Empty means every channel that has a webhook configured.
    #[serde(default)]
    pub channels: Vec<String>,
    /// Slack incoming webhook URL.
    #[serde(default)]
    pub slack_webhook_url: String,
    /// Slack channel override.
    #[serde(default = "default_slack_channel")]
    pub slack_channel: String,
    /// Microsoft Teams incoming webhook URL.
    #[serde(default)]
    pub teams_webhook_url: String,
    /// Minimum risk level for pending alerts to be sent.
    #[serde(default = "default_min_risk")]
    pub min_risk: String,
    /// Webhook request timeout in seconds.
    #[serde(default = "default_notify_timeout")]
    pub timeout_secs: u64,
}

fn default_slack_channel() -> String {
    "#competitive-intel".to_string()
}

fn default_min_risk() -> String {
    "medium".to_string()
}

fn default_notify_timeout() -> u64 {
    15
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            channels: vec![],
            slack_webhook_url: String::new(),
            slack_channel: default_slack_channel(),
            teams_webhook_url: String::new(),
            min_risk: default_min_risk(),
            timeout_secs: default_notify_timeout(),
        }
    }
}

/// Background scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the scheduler runs alongside the API server.
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,
    /// How often the scheduler wakes up, in seconds.
    #[serde(default = "default_tick")]
    pub tick_secs: u64,
    /// Interval between page check passes, in seconds.
    #[serde(default = "default_page_interval")]
    pub page_check_interval_secs: u64,
    /// Interval between news collection passes, in seconds.
    #[serde(default = "default_news_interval")]
    pub news_interval_secs: u64,
    /// Look-back window for scheduled news collection, in days.
    #[serde(default = "default_scheduled_days_back")]
    pub news_days_back: i64,
    /// Whether a digest of the last 24 hours of alerts goes out once a day.
    #[serde(default = "default_digest_enabled")]
    pub digest_enabled: bool,
    /// UTC hour (0-23) at which the daily digest runs.
    #[serde(default = "default_digest_hour")]
    pub digest_hour: u32,
}

fn default_scheduler_enabled() -> bool {
    true
}

fn default_tick() -> u64 {
    60
}

fn default_page_interval() -> u64 {
    3600 // 1 hour
}

fn default_news_interval() -> u64 {
    6 * 3600 // 6 hours
}

fn default_scheduled_days_back() -> i64 {
    3
}

fn default_digest_enabled() -> bool {
    true
}

fn default_digest_hour() -> u32 {
    8
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
            tick_secs: default_tick(),
            page_check_interval_secs: default_page_interval(),
            news_interval_secs: default_news_interval(),
            news_days_back: default_scheduled_days_back(),
            digest_enabled: default_digest_enabled(),
            digest_hour: default_digest_hour(),
        }
    }
}

/// Export configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Timezone used for dates in reports (e.g., "UTC", "America/New_York").
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Page monitoring configuration.
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// News collection configuration.
    #[serde(default)]
    pub news: NewsConfig,
    /// LLM configuration.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Analysis configuration.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Notification configuration.
    #[serde(default)]
    pub notify: NotifyConfig,
    /// Scheduler configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Export configuration.
    #[serde(default)]
    pub export: ExportConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(RivalError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| RivalError::Validation(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `RIVAL_DATABASE_PATH`
    /// - `RIVAL_LLM_API_KEY`, `RIVAL_LLM_BASE_URL`, `RIVAL_LLM_MODEL`
    /// - `RIVAL_NEWSAPI_KEY`
    /// - `RIVAL_SLACK_WEBHOOK_URL`, `RIVAL_TEAMS_WEBHOOK_URL`
    /// - `RIVAL_APP_URL`
    pub fn apply_env_overrides(&mut self) {
        let overrides: [(&str, &mut String); 8] = [
            ("RIVAL_DATABASE_PATH", &mut self.database.path),
            ("RIVAL_LLM_API_KEY", &mut self.llm.api_key),
            ("RIVAL_LLM_BASE_URL", &mut self.llm.base_url),
            ("RIVAL_LLM_MODEL", &mut self.llm.model),
            ("RIVAL_NEWSAPI_KEY", &mut self.news.newsapi_key),
            ("RIVAL_SLACK_WEBHOOK_URL", &mut self.notify.slack_webhook_url),
            ("RIVAL_TEAMS_WEBHOOK_URL", &mut self.notify.teams_webhook_url),
            ("RIVAL_APP_URL", &mut self.web.app_url),
        ];

        for (name, target) in overrides {
            if let Ok(value) = std::env::var(name) {
                if !value.is_empty() {
                    *target = value;
                }
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.export.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(RivalError::Validation(format!(
                "unknown timezone: {}",
                self.export.timezone
            )));
        }
        if !(0..=100).contains(&self.analysis.min_risk_threshold) {
            return Err(RivalError::Validation(
                "analysis.min_risk_threshold must be between 0 and 100".to_string(),
            ));
        }
        if self.scheduler.enabled
            && (self.scheduler.tick_secs == 0
                || self.scheduler.page_check_interval_secs == 0
                || self.scheduler.news_interval_secs == 0)
        {
            return Err(RivalError::Validation(
                "scheduler intervals must be greater than zero".to_string(),
            ));
        }
        if self.scheduler.digest_hour > 23 {
            return Err(RivalError::Validation(
                "scheduler.digest_hour must be between 0 and 23".to_string(),
            ));
        }
        if self.scheduler.enabled && self.scheduler.digest_enabled && self.scheduler.tick_secs > 3600
        {
            return Err(RivalError::Validation(
                "scheduler.tick_secs must be at most 3600 while the daily digest is enabled"
                    .to_string(),
            ));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(RivalError::Validation("llm.base_url is not set".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.database.path, "data/rivalwatch.db");

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/rivalwatch.log");

        assert_eq!(config.web.host, "0.0.0.0");
        assert_eq!(config.web.port, 8080);
        assert!(config.web.cors_origins.is_empty());
        assert_eq!(config.web.app_url, "http://localhost:8080");

        assert_eq!(config.monitor.request_delay_ms, 2000);
        assert_eq!(config.monitor.total_timeout_secs, 30);
        assert_eq!(config.monitor.max_stored_chars, 50_000);
        assert!(!config.monitor.allow_private_hosts);
        assert!(config.monitor.user_agent.contains("Chrome/120"));

        assert_eq!(config.news.default_days_back, 7);
        assert!(config.news.google_news_enabled);
        assert!(config.news.rss_feeds.is_empty());
        assert!(config.news.newsapi_key().is_none());

        assert!(!config.llm.is_configured());
        assert_eq!(config.llm.analysis_max_tokens, 2000);
        assert_eq!(config.llm.insight_max_tokens, 4000);

        assert_eq!(config.analysis.min_risk_threshold, 40);
        assert_eq!(config.analysis.duplicate_window_hours, 6);
        assert!(config.analysis.auto_insights);

        assert!(config.notify.channels.is_empty());
        assert_eq!(config.notify.min_risk, "medium");

        assert!(config.scheduler.enabled);
        assert_eq!(config.scheduler.page_check_interval_secs, 3600);

        assert_eq!(config.export.timezone, "UTC");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[database]
path = "custom/intel.db"

[logging]
level = "debug"
file = "custom/logs/app.log"

[web]
host = "127.0.0.1"
port = 3000
cors_origins = ["http://localhost:5173"]
app_url = "https://intel.example.com"

[monitor]
request_delay_ms = 0
max_stored_chars = 1000
allow_private_hosts = true

[news]
default_days_back = 3
google_news_enabled = false
newsapi_key = "abc123"
rss_feeds = [{ name = "Trade Journal", url = "https://journal.example.com/rss" }]

[llm]
api_key = "sk-test"
model = "gpt-4o"
temperature = 0.1

[analysis]
min_risk_threshold = 55
company_name = "Acme Instruments"

[notify]
channels = ["slack", "teams"]
slack_webhook_url = "https://hooks.slack.com/services/x"
teams_webhook_url = "https://example.webhook.office.com/x"
min_risk = "high"

[scheduler]
enabled = false
news_days_back = 1
digest_hour = 7

[export]
timezone = "America/New_York"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.database.path, "custom/intel.db");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.web.port, 3000);
        assert_eq!(config.web.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.web.app_url, "https://intel.example.com");
        assert_eq!(config.monitor.request_delay_ms, 0);
        assert_eq!(config.monitor.max_stored_chars, 1000);
        assert!(config.monitor.allow_private_hosts);
        assert_eq!(config.news.default_days_back, 3);
        assert!(!config.news.google_news_enabled);
        assert_eq!(config.news.newsapi_key(), Some("abc123"));
        assert_eq!(
            config.news.rss_feeds,
            vec![FeedSource {
                name: "Trade Journal".to_string(),
                url: "https://journal.example.com/rss".to_string(),
            }]
        );
        assert!(config.llm.is_configured());
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.analysis.min_risk_threshold, 55);
        assert_eq!(config.analysis.company_name, "Acme Instruments");
        assert_eq!(config.notify.channels, vec!["slack", "teams"]);
        assert_eq!(config.notify.min_risk, "high");
        assert!(!config.scheduler.enabled);
        assert_eq!(config.scheduler.news_days_back, 1);
        assert!(config.scheduler.digest_enabled);
        assert_eq!(config.scheduler.digest_hour, 7);
        assert_eq!(config.export.timezone, "America/New_York");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[web]
port = 9000

[llm]
model = "local-model"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.web.port, 9000);
        assert_eq!(config.llm.model, "local-model");

        // Default values
        assert_eq!(config.web.host, "0.0.0.0");
        assert_eq!(config.llm.timeout_secs, 60);
        assert_eq!(config.database.path, "data/rivalwatch.db");
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.web.port, 8080);
        assert_eq!(config.database.path, "data/rivalwatch.db");
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("this is not valid toml [[[");

        assert!(result.is_err());
        if let Err(RivalError::Validation(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Validation error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");
        assert!(matches!(result, Err(RivalError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[web]\nport = 4321\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.web.port, 4321);
    }

    #[test]
    fn test_newsapi_placeholder_key_ignored() {
        let mut news = NewsConfig::default();
        news.newsapi_key = "your-newsapi-key".to_string();
        assert!(news.newsapi_key().is_none());

        news.newsapi_key = "   ".to_string();
        assert!(news.newsapi_key().is_none());
    }

    #[test]
    fn test_apply_env_overrides() {
        let original_key = std::env::var("RIVAL_LLM_API_KEY").ok();
        let original_url = std::env::var("RIVAL_APP_URL").ok();

        std::env::set_var("RIVAL_LLM_API_KEY", "env-key");
        std::env::set_var("RIVAL_APP_URL", "");

        let mut config = Config::default();
        config.web.app_url = "https://kept.example.com".to_string();
        config.apply_env_overrides();

        assert_eq!(config.llm.api_key, "env-key");
        // Empty values do not override
        assert_eq!(config.web.app_url, "https://kept.example.com");

        match original_key {
            Some(val) => std::env::set_var("RIVAL_LLM_API_KEY", val),
            None => std::env::remove_var("RIVAL_LLM_API_KEY"),
        }
        match original_url {
            Some(val) => std::env::set_var("RIVAL_APP_URL", val),
            None => std::env::remove_var("RIVAL_APP_URL"),
        }
    }

    #[test]
    fn test_validate_default() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_bad_timezone() {
        let mut config = Config::default();
        config.export.timezone = "Mars/Olympus".to_string();

        let result = config.validate();
        assert!(matches!(result, Err(RivalError::Validation(msg)) if msg.contains("timezone")));
    }

    #[test]
    fn test_validate_threshold_out_of_range() {
        let mut config = Config::default();
        config.analysis.min_risk_threshold = 150;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_interval() {
        let mut config = Config::default();
        config.scheduler.news_interval_secs = 0;
        assert!(config.validate().is_err());

        config.scheduler.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_digest_schedule() {
        let mut config = Config::default();
        config.scheduler.digest_hour = 24;
        assert!(config.validate().is_err());

        config.scheduler.digest_hour = 23;
        config.scheduler.tick_secs = 7200;
        assert!(config.validate().is_err());

        config.scheduler.digest_enabled = false;
        assert!(config.validate().is_ok());
    }
}
