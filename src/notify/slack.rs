//! Slack incoming-webhook payloads.

use serde_json::{json, Value};

use super::{dashboard_url, risk_color, MAX_LISTED_ACTIONS, NO_ACTIONS};
use crate::alert::Alert;
use crate::report::AlertReport;

/// Build the Slack message for an alert.
pub fn slack_payload(alert: &Alert, channel: &str, app_url: &str) -> Value {
    let actions_text = if alert.recommended_actions.is_empty() {
        NO_ACTIONS.to_string()
    } else {
        alert
            .recommended_actions
            .iter()
            .take(MAX_LISTED_ACTIONS)
            .map(|a| format!("• {} ({} - {})", a.action, a.priority, a.owner))
            .collect::<Vec<_>>()
            .join("\n")
    };

    json!({
        "channel": channel,
        "username": "Competitor Monitor",
        "icon_emoji": ":mag:",
        "attachments": [{
            "color": risk_color(alert.risk_level),
            "blocks": [
                {
                    "type": "header",
                    "text": {"type": "plain_text", "text": alert.title}
                },
                {
                    "type": "section",
                    "fields": [
                        {
                            "type": "mrkdwn",
                            "text": format!("*Competitor:*\n{}", alert.competitor_name.as_deref().unwrap_or("Unknown"))
                        },
                        {
                            "type": "mrkdwn",
                            "text": format!("*Signal Type:*\n{}", alert.signal_type.title())
                        },
                        {
                            "type": "mrkdwn",
                            "text": format!(
                                "*Risk Level:*\n{} ({}/100)",
                                alert.risk_level.as_str().to_uppercase(),
                                alert.risk_score.unwrap_or_default()
                            )
                        },
                        {
                            "type": "mrkdwn",
                            "text": format!("*Confidence:*\n{}%", alert.confidence_score.unwrap_or_default())
                        }
                    ]
                },
                {
                    "type": "section",
                    "text": {
                        "type": "mrkdwn",
                        "text": format!("*Summary:*\n{}", alert.summary.as_deref().unwrap_or_default())
                    }
                },
                {
                    "type": "section",
                    "text": {
                        "type": "mrkdwn",
                        "text": format!("*Relevance:*\n{}", alert.relevance_explanation.as_deref().unwrap_or_default())
                    }
                },
                {
                    "type": "section",
                    "text": {"type": "mrkdwn", "text": format!("*Recommended Actions:*\n{actions_text}")}
                },
                {
                    "type": "actions",
                    "elements": [
                        {
                            "type": "button",
                            "text": {"type": "plain_text", "text": "View Source"},
                            "url": alert.source_url
                        },
                        {
                            "type": "button",
                            "text": {"type": "plain_text", "text": "View in Dashboard"},
                            "url": dashboard_url(app_url, alert.id)
                        }
                    ]
                }
            ]
        }]
    })
}

/// Build the Slack message for a digest of recent alerts.
pub fn slack_digest_payload(report: &AlertReport, channel: &str, app_url: &str) -> Value {
    let risk_lines = if report.by_risk.is_empty() {
        "No alerts".to_string()
    } else {
        report
            .by_risk
            .iter()
            .map(|(level, count)| format!("• {}: {}", level.as_str().to_uppercase(), count))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let mut blocks = vec![
        json!({
            "type": "header",
            "text": {"type": "plain_text", "text": digest_title(report)}
        }),
        json!({
            "type": "section",
            "text": {"type": "mrkdwn", "text": format!("*By Risk Level:*\n{risk_lines}")}
        }),
    ];
    if !report.high_priority.is_empty() {
        let lines = report
            .high_priority
            .iter()
            .map(|a| {
                format!(
                    "• <{}|{}> ({})",
                    dashboard_url(app_url, a.id),
                    a.title,
                    a.competitor_name.as_deref().unwrap_or("Unknown")
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        blocks.push(json!({
            "type": "section",
            "text": {"type": "mrkdwn", "text": format!("*High Priority:*\n{lines}")}
        }));
    }

    json!({
        "channel": channel,
        "username": "Competitor Monitor",
        "icon_emoji": ":mag:",
        "text": digest_title(report),
        "blocks": blocks
    })
}

/// "Daily digest: N alerts in last 24 hours", or the window in days.
pub(super) fn digest_title(report: &AlertReport) -> String {
    if report.days == 1 {
        format!("Daily digest: {} alerts in last 24 hours", report.total)
    } else {
        format!("Digest: {} alerts in last {} days", report.total, report.days)
    }
}
