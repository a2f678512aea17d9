//! Microsoft Teams MessageCard payloads.

use serde_json::{json, Value};

use super::slack::digest_title;
use super::{dashboard_url, risk_color, MAX_LISTED_ACTIONS, NO_ACTIONS};
use crate::alert::{Alert, RiskLevel};
use crate::report::AlertReport;

/// Build the Teams MessageCard for an alert.
pub fn teams_payload(alert: &Alert, app_url: &str) -> Value {
    let actions_text = if alert.recommended_actions.is_empty() {
        NO_ACTIONS.to_string()
    } else {
        alert
            .recommended_actions
            .iter()
            .take(MAX_LISTED_ACTIONS)
            .map(|a| format!("- **{}** ({}) - Owner: {}", a.action, a.priority, a.owner))
            .collect::<Vec<_>>()
            .join("\n\n")
    };
    let risk = format!(
        "{} ({}/100)",
        alert.risk_level.as_str().to_uppercase(),
        alert.risk_score.unwrap_or_default()
    );

    json!({
        "@type": "MessageCard",
        "@context": "http://schema.org/extensions",
        "themeColor": risk_color(alert.risk_level).trim_start_matches('#'),
        "summary": alert.title,
        "sections": [
            {
                "activityTitle": alert.title,
                "facts": [
                    {"name": "Competitor", "value": alert.competitor_name.as_deref().unwrap_or("Unknown")},
                    {"name": "Signal Type", "value": alert.signal_type.title()},
                    {"name": "Risk Level", "value": risk},
                    {"name": "Confidence", "value": format!("{}%", alert.confidence_score.unwrap_or_default())},
                    {"name": "Detected", "value": alert.detected_at.format("%Y-%m-%d %H:%M UTC").to_string()}
                ],
                "markdown": true
            },
            {"title": "Summary", "text": alert.summary},
            {"title": "Relevance", "text": alert.relevance_explanation},
            {"title": "Recommended Actions", "text": actions_text}
        ],
        "potentialAction": [
            {
                "@type": "OpenUri",
                "name": "View Source",
                "targets": [{"os": "default", "uri": alert.source_url}]
            },
            {
                "@type": "OpenUri",
                "name": "View in Dashboard",
                "targets": [{"os": "default", "uri": dashboard_url(app_url, alert.id)}]
            }
        ]
    })
}

/// Build the Teams MessageCard for a digest of recent alerts.
pub fn teams_digest_payload(report: &AlertReport, app_url: &str) -> Value {
    let facts: Vec<Value> = report
        .by_risk
        .iter()
        .map(|(level, count)| json!({"name": level.as_str().to_uppercase(), "value": count.to_string()}))
        .collect();
    let high_priority = report
        .high_priority
        .iter()
        .map(|a| format!("- [{}]({})", a.title, dashboard_url(app_url, a.id)))
        .collect::<Vec<_>>()
        .join("\n\n");
    let color = report
        .by_risk
        .first()
        .map(|(level, _)| *level)
        .unwrap_or(RiskLevel::Info);

    json!({
        "@type": "MessageCard",
        "@context": "http://schema.org/extensions",
        "themeColor": risk_color(color).trim_start_matches('#'),
        "summary": digest_title(report),
        "sections": [
            {"activityTitle": digest_title(report), "facts": facts, "markdown": true},
            {"title": "High Priority", "text": high_priority}
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::tests::sample_alert;

    #[test]
    fn test_teams_payload() {
        let payload = teams_payload(&sample_alert(), "https://ci.example.com/");
        assert_eq!(payload["@type"], "MessageCard");
        assert_eq!(payload["themeColor"], "FF4444");

        let facts = payload["sections"][0]["facts"].as_array().unwrap();
        assert_eq!(facts[2]["value"], "HIGH (78/100)");
        assert_eq!(facts[4]["value"], "2026-03-01 09:30 UTC");

        let actions = payload["sections"][3]["text"].as_str().unwrap();
        assert!(actions.starts_with("- **Action 0** (high) - Owner: Product Management"));
        assert_eq!(actions.split("\n\n").count(), 5);

        assert_eq!(
            payload["potentialAction"][1]["targets"][0]["uri"],
            "https://ci.example.com/alerts/7"
        );
    }

    #[test]
    fn test_teams_digest_payload() {
        let report = AlertReport::from_alerts(vec![sample_alert()], 1, chrono::Utc::now());
        let payload = teams_digest_payload(&report, "https://ci.example.com");
        assert_eq!(payload["summary"], "Daily digest: 1 alerts in last 24 hours");
        assert_eq!(payload["themeColor"], "FF4444");
        assert_eq!(payload["sections"][0]["facts"][0]["name"], "HIGH");
        assert_eq!(payload["sections"][0]["facts"][0]["value"], "1");
        assert_eq!(
            payload["sections"][1]["text"],
            "- [Klein Tools: Product Launch Detected](https://ci.example.com/alerts/7)"
        );
    }
}
