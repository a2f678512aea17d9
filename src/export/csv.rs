//! CSV exports.

use crate::alert::Alert;
use crate::competitor::Competitor;
use crate::datetime::format_in_timezone;
use crate::feature::FeatureComparison;
use crate::news::NewsItem;
use crate::{Result, RivalError};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ALERT_HEADER: [&str; 10] = [
    "id",
    "title",
    "competitor",
    "risk_level",
    "signal_type",
    "risk_score",
    "summary",
    "source_url",
    "status",
    "detected_at",
];

const NEWS_HEADER: [&str; 8] = [
    "id",
    "title",
    "source",
    "url",
    "published_at",
    "collected_at",
    "is_processed",
    "is_relevant",
];

const FEATURE_HEADER: [&str; 6] = [
    "category",
    "feature",
    "description",
    "importance",
    "our_capability",
    "our_details",
];

fn export_error(e: impl std::fmt::Display) -> RivalError {
    RivalError::Export(format!("CSV export failed: {}", e))
}

/// Alerts as CSV, one row per alert.
pub fn alerts_csv(alerts: &[Alert], timezone: &str) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(ALERT_HEADER).map_err(export_error)?;

    for alert in alerts {
        writer
            .write_record([
                alert.id.to_string(),
                alert.title.clone(),
                alert.competitor_name.clone().unwrap_or_default(),
                alert.risk_level.to_string(),
                alert.signal_type.to_string(),
                alert.risk_score.map(|s| s.to_string()).unwrap_or_default(),
                alert.summary.clone().unwrap_or_default(),
                alert.source_url.clone().unwrap_or_default(),
                alert.status.to_string(),
                format_in_timezone(&alert.detected_at, timezone, TIMESTAMP_FORMAT),
            ])
            .map_err(export_error)?;
    }

    writer.into_inner().map_err(export_error)
}

/// News items as CSV, one row per item.
pub fn news_csv(items: &[NewsItem], timezone: &str) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(NEWS_HEADER).map_err(export_error)?;

    for item in items {
        writer
            .write_record([
                item.id.to_string(),
                item.title.clone(),
                item.source.clone().unwrap_or_default(),
                item.url.clone(),
                item.published_at
                    .map(|dt| format_in_timezone(&dt, timezone, TIMESTAMP_FORMAT))
                    .unwrap_or_default(),
                format_in_timezone(&item.collected_at, timezone, TIMESTAMP_FORMAT),
                item.is_processed.to_string(),
                item.is_relevant.to_string(),
            ])
            .map_err(export_error)?;
    }

    writer.into_inner().map_err(export_error)
}

/// The feature matrix as CSV.
///
/// After the fixed columns come a `{Name}_capability` and `{Name}_details`
/// pair per competitor, in the order given.
pub fn features_csv(features: &[FeatureComparison], competitors: &[Competitor]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header: Vec<String> = FEATURE_HEADER.iter().map(|h| h.to_string()).collect();
    for competitor in competitors {
        header.push(format!("{}_capability", competitor.name));
        header.push(format!("{}_details", competitor.name));
    }
    writer.write_record(&header).map_err(export_error)?;

    for feature in features {
        let mut record = vec![
            feature.category.clone(),
            feature.feature_name.clone(),
            feature.description.clone().unwrap_or_default(),
            feature.customer_importance.to_string(),
            feature.our_capability.to_string(),
            feature.our_details.clone().unwrap_or_default(),
        ];
        for competitor in competitors {
            let entry = feature.competitor_capability(competitor.id).unwrap_or_default();
            record.push(entry.capability);
            record.push(entry.details);
        }
        writer.write_record(&record).map_err(export_error)?;
    }

    writer.into_inner().map_err(export_error)
}
