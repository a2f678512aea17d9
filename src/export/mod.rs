//! CSV and PDF exports of alerts, news, insights and the feature matrix.
//!
//! Exporters return the encoded bytes. Callers pick a filename with the
//! helpers below, which stamp the current date. Timestamps inside the
//! exports are rendered in the configured timezone.

pub mod csv;
pub mod pdf;

use chrono::{DateTime, Utc};

pub use self::csv::{alerts_csv, features_csv, news_csv};
pub use self::pdf::{alert_report, alerts_summary, insight_report, score_level};

use crate::datetime::date_stamp;

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

pub fn alerts_csv_filename(now: &DateTime<Utc>) -> String {
    format!("alerts_export_{}.csv", date_stamp(now))
}

pub fn news_csv_filename(now: &DateTime<Utc>) -> String {
    format!("news_export_{}.csv", date_stamp(now))
}

pub fn features_csv_filename(now: &DateTime<Utc>) -> String {
    format!("feature_matrix_{}.csv", date_stamp(now))
}

pub fn alerts_summary_filename(now: &DateTime<Utc>) -> String {
    format!("alerts_summary_{}.pdf", date_stamp(now))
}

pub fn alert_report_filename(id: i64, now: &DateTime<Utc>) -> String {
    format!("alert_{id}_{}.pdf", date_stamp(now))
}

pub fn insight_report_filename(id: i64, now: &DateTime<Utc>) -> String {
    format!("insight_{id}_{}.pdf", date_stamp(now))
}
