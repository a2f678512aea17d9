//! Alert delivery to Slack and Microsoft Teams.

mod slack;
mod teams;

pub use slack::{slack_digest_payload, slack_payload};
pub use teams::{teams_digest_payload, teams_payload};

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::alert::{Alert, AlertRepository, RiskLevel};
use crate::config::NotifyConfig;
use crate::report::AlertReport;
use crate::{Database, Result, RivalError};

/// Number of recommended actions included in a message.
const MAX_LISTED_ACTIONS: usize = 5;

const NO_ACTIONS: &str = "No specific actions recommended";

/// Message colour for a risk level.
pub fn risk_color(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Critical => "#FF0000",
        RiskLevel::High => "#FF4444",
        RiskLevel::Medium => "#FFAA00",
        RiskLevel::Low => "#00AA00",
        RiskLevel::Info => "#0088FF",
    }
}

fn dashboard_url(app_url: &str, alert_id: i64) -> String {
    format!("{}/alerts/{}", app_url.trim_end_matches('/'), alert_id)
}

/// Notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Slack,
    Teams,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Slack, Channel::Teams];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Slack => "slack",
            Channel::Teams => "teams",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "slack" => Ok(Channel::Slack),
            "teams" => Ok(Channel::Teams),
            _ => Err(format!("unknown channel: {s}")),
        }
    }
}

/// Delivery outcome for one channel.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelResult {
    pub channel: Channel,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Delivery outcome for one alert.
#[derive(Debug, Clone, Serialize)]
pub struct AlertDelivery {
    pub alert_id: i64,
    pub title: String,
    pub results: Vec<ChannelResult>,
}

/// Outcome of sending every pending alert.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NotifyReport {
    pub total_pending: usize,
    pub sent: usize,
    pub failed: usize,
    pub details: Vec<AlertDelivery>,
}

/// Sends alerts to chat webhooks.
pub struct Notifier {
    db: Arc<Database>,
    client: Client,
    config: NotifyConfig,
    app_url: String,
}

impl Notifier {
    /// Create a new notifier.
    pub fn new(db: Arc<Database>, config: NotifyConfig, app_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RivalError::Notify(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            db,
            client,
            config,
            app_url: app_url.into(),
        })
    }

    fn webhook(&self, channel: Channel) -> Option<&str> {
        let url = match channel {
            Channel::Slack => self.config.slack_webhook_url.trim(),
            Channel::Teams => self.config.teams_webhook_url.trim(),
        };
        (!url.is_empty()).then_some(url)
    }

    /// Channels used when the caller does not name any.
    pub fn default_channels(&self) -> Vec<Channel> {
        if self.config.channels.is_empty() {
            return Channel::ALL
                .into_iter()
                .filter(|c| self.webhook(*c).is_some())
                .collect();
        }

        self.config
            .channels
            .iter()
            .filter_map(|name| match name.parse::<Channel>() {
                Ok(channel) => Some(channel),
                Err(e) => {
                    warn!("Ignoring notification channel: {}", e);
                    None
                }
            })
            .collect()
    }

    /// Whether any channel can deliver.
    pub fn is_configured(&self) -> bool {
        Channel::ALL.into_iter().any(|c| self.webhook(c).is_some())
    }

    /// Minimum risk level for pending alerts, from configuration.
    pub fn configured_min_risk(&self) -> RiskLevel {
        self.config.min_risk.parse().unwrap_or(RiskLevel::Medium)
    }

    async fn post(&self, channel: Channel, alert: &Alert) -> Result<()> {
        let payload = match channel {
            Channel::Slack => slack_payload(alert, &self.config.slack_channel, &self.app_url),
            Channel::Teams => teams_payload(alert, &self.app_url),
        };
        self.post_payload(channel, &payload).await
    }

    async fn post_payload(&self, channel: Channel, payload: &serde_json::Value) -> Result<()> {
        let url = self
            .webhook(channel)
            .ok_or_else(|| RivalError::Notify(format!("{} webhook not configured", channel)))?;

        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| RivalError::Notify(format!("{} request failed: {}", channel, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RivalError::Notify(format!(
                "{} webhook returned {}",
                channel, status
            )));
        }
        Ok(())
    }

    /// Post a digest of recent alerts to the default channels.
    pub async fn send_digest(&self, report: &AlertReport) -> Vec<ChannelResult> {
        let channels = self.default_channels();
        let outcomes = join_all(channels.iter().map(|channel| async move {
            let payload = match channel {
                Channel::Slack => {
                    slack_digest_payload(report, &self.config.slack_channel, &self.app_url)
                }
                Channel::Teams => teams_digest_payload(report, &self.app_url),
            };
            self.post_payload(*channel, &payload).await
        }))
        .await;

        channels
            .iter()
            .zip(outcomes)
            .map(|(channel, outcome)| match outcome {
                Ok(()) => {
                    info!("{} digest sent", channel);
                    ChannelResult {
                        channel: *channel,
                        success: true,
                        error: None,
                    }
                }
                Err(e) => {
                    error!("Error sending {} digest: {}", channel, e);
                    ChannelResult {
                        channel: *channel,
                        success: false,
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect()
    }

    /// Send an alert to `channels`, or to the default channels.
    ///
    /// On any success the alert is marked notified with every channel it has
    /// reached so far.
    pub async fn send_alert(
        &self,
        alert: &Alert,
        channels: Option<&[Channel]>,
    ) -> Result<Vec<ChannelResult>> {
        let channels = match channels {
            Some(channels) => channels.to_vec(),
            None => self.default_channels(),
        };

        let outcomes = join_all(channels.iter().map(|c| self.post(*c, alert))).await;
        let results: Vec<ChannelResult> = channels
            .iter()
            .zip(outcomes)
            .map(|(channel, outcome)| match outcome {
                Ok(()) => {
                    info!("{} alert sent for alert {}", channel, alert.id);
                    ChannelResult {
                        channel: *channel,
                        success: true,
                        error: None,
                    }
                }
                Err(e) => {
                    error!("Error sending {} alert {}: {}", channel, alert.id, e);
                    ChannelResult {
                        channel: *channel,
                        success: false,
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect();

        if results.iter().any(|r| r.success) {
            let mut sent: Vec<String> = alert
                .sent_channels()
                .into_iter()
                .map(str::to_string)
                .collect();
            for result in results.iter().filter(|r| r.success) {
                let name = result.channel.as_str();
                if !sent.iter().any(|s| s == name) {
                    sent.push(name.to_string());
                }
            }
            AlertRepository::new(self.db.pool())
                .mark_notified(alert.id, &sent)
                .await?;
        }

        Ok(results)
    }

    /// Send every un-notified alert at or above `min_risk`.
    pub async fn send_pending(&self, min_risk: RiskLevel) -> Result<NotifyReport> {
        let pending = AlertRepository::new(self.db.pool())
            .list_pending_notifications(min_risk)
            .await?;

        let mut report = NotifyReport {
            total_pending: pending.len(),
            ..Default::default()
        };
        for alert in &pending {
            let results = self.send_alert(alert, None).await?;
            if results.iter().any(|r| r.success) {
                report.sent += 1;
            } else {
                report.failed += 1;
            }
            report.details.push(AlertDelivery {
                alert_id: alert.id,
                title: alert.title.clone(),
                results,
            });
        }

        info!(
            "Notifications: {} pending, {} sent, {} failed",
            report.total_pending, report.sent, report.failed
        );
        Ok(report)
    }
}
