//! Plain-text alert reports.
//!
//! The same summary backs `rivalwatch report` and the scheduler's daily
//! digest: totals by risk level and competitor, then the high-priority
//! alerts of the window.

use std::collections::HashMap;
use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::alert::{Alert, AlertFilter, AlertRepository, RiskLevel};
use crate::db::DbPool;
use crate::Result;

/// High-priority alerts listed in a report.
const MAX_HIGH_PRIORITY: usize = 10;

/// Characters of an alert summary shown in a report.
const SUMMARY_CHARS: usize = 100;

const RULE_WIDTH: usize = 60;

/// Alert activity over a window of days.
#[derive(Debug, Clone)]
pub struct AlertReport {
    pub days: i64,
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    /// Non-zero counts, most severe first.
    pub by_risk: Vec<(RiskLevel, usize)>,
    /// Counts per competitor, largest first.
    pub by_competitor: Vec<(String, usize)>,
    /// Critical and high alerts, newest first.
    pub high_priority: Vec<Alert>,
}

impl AlertReport {
    /// Summarize alerts already limited to the window.
    pub fn from_alerts(alerts: Vec<Alert>, days: i64, generated_at: DateTime<Utc>) -> Self {
        let mut risk_counts: HashMap<RiskLevel, usize> = HashMap::new();
        let mut competitor_counts: HashMap<String, usize> = HashMap::new();
        for alert in &alerts {
            *risk_counts.entry(alert.risk_level).or_insert(0) += 1;
            let name = alert
                .competitor_name
                .clone()
                .unwrap_or_else(|| "Unknown".into());
            *competitor_counts.entry(name).or_insert(0) += 1;
        }

        let by_risk = RiskLevel::ALL
            .into_iter()
            .filter_map(|level| risk_counts.get(&level).map(|count| (level, *count)))
            .collect();
        let mut by_competitor: Vec<(String, usize)> = competitor_counts.into_iter().collect();
        by_competitor.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let total = alerts.len();
        let high_priority = alerts
            .into_iter()
            .filter(|a| matches!(a.risk_level, RiskLevel::Critical | RiskLevel::High))
            .take(MAX_HIGH_PRIORITY)
            .collect();

        Self {
            days,
            generated_at,
            total,
            by_risk,
            by_competitor,
            high_priority,
        }
    }

    /// The report as console text.
    pub fn render(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let thin = "-".repeat(40);
        let mut out = String::new();

        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "COMPETITOR INTELLIGENCE REPORT");
        let _ = writeln!(out, "Period: Last {} days", self.days);
        let _ = writeln!(
            out,
            "Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        );
        let _ = writeln!(out, "{rule}\n");

        let _ = writeln!(out, "SUMMARY\n{thin}");
        let _ = writeln!(out, "Total Alerts: {}", self.total);

        let _ = writeln!(out, "\nBy Risk Level:");
        for (level, count) in &self.by_risk {
            let _ = writeln!(out, "  {}: {}", level.as_str().to_uppercase(), count);
        }

        let _ = writeln!(out, "\nBy Competitor:");
        for (name, count) in &self.by_competitor {
            let _ = writeln!(out, "  {name}: {count}");
        }

        if !self.high_priority.is_empty() {
            let _ = writeln!(out, "\nHIGH PRIORITY ALERTS\n{thin}");
            for alert in &self.high_priority {
                let _ = writeln!(out, "\n• {}", alert.title);
                let _ = writeln!(
                    out,
                    "  Risk: {} ({}/100)",
                    alert.risk_level.as_str().to_uppercase(),
                    alert.risk_score.unwrap_or_default()
                );
                if let Some(summary) = alert.summary.as_deref().filter(|s| !s.is_empty()) {
                    let short: String = summary.chars().take(SUMMARY_CHARS).collect();
                    let _ = writeln!(out, "  Summary: {short}");
                }
            }
        }

        let _ = writeln!(out, "\n{rule}");
        out
    }
}

/// Load every alert detected in the last `days` days and summarize it.
pub async fn alert_report(pool: &DbPool, days: i64) -> Result<AlertReport> {
    let filter = AlertFilter {
        days: Some(days),
        ..Default::default()
    };
    let repo = AlertRepository::new(pool);
    let total = repo.count(&filter).await?;
    let alerts = repo.list(&filter, 0, total.max(1)).await?;
    Ok(AlertReport::from_alerts(alerts, days, Utc::now()))
}
