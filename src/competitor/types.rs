//! Competitor and monitored URL types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default page check interval in hours.
pub const DEFAULT_CHECK_INTERVAL_HOURS: i64 = 24;

/// A competitor being tracked.
#[derive(Debug, Clone, Serialize)]
pub struct Competitor {
    /// Competitor ID.
    pub id: i64,
    /// Company name (unique).
    pub name: String,
    /// Short description.
    pub description: Option<String>,
    /// Main website.
    pub website: Option<String>,
    /// Logo image URL.
    pub logo_url: Option<String>,
    /// Whether the competitor is monitored. Deleting a competitor clears this flag.
    pub is_active: bool,
    /// When the competitor was created.
    pub created_at: DateTime<Utc>,
    /// When the competitor was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A competitor with dashboard counters.
#[derive(Debug, Clone, Serialize)]
pub struct CompetitorSummary {
    /// Competitor record.
    #[serde(flatten)]
    pub competitor: Competitor,
    /// Number of active monitored URLs.
    pub url_count: i64,
    /// Number of alerts still in `new` status.
    pub alert_count: i64,
}

/// New competitor for creation.
#[derive(Debug, Clone)]
pub struct NewCompetitor {
    /// Company name.
    pub name: String,
    /// Short description.
    pub description: Option<String>,
    /// Main website.
    pub website: Option<String>,
    /// Logo image URL.
    pub logo_url: Option<String>,
}

impl NewCompetitor {
    /// Create a new competitor.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            website: None,
            logo_url: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the website.
    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    /// Set the logo URL.
    pub fn with_logo_url(mut self, logo_url: impl Into<String>) -> Self {
        self.logo_url = Some(logo_url.into());
        self
    }
}

/// Competitor update request.
#[derive(Debug, Clone, Default)]
pub struct CompetitorUpdate {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New website.
    pub website: Option<Option<String>>,
    /// New logo URL.
    pub logo_url: Option<Option<String>>,
    /// Whether the competitor is active.
    pub is_active: Option<bool>,
}

impl CompetitorUpdate {
    /// Create a new update request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    /// Set the website.
    pub fn with_website(mut self, website: Option<String>) -> Self {
        self.website = Some(website);
        self
    }

    /// Set the active flag.
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    /// Check if the update is empty.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.website.is_none()
            && self.logo_url.is_none()
            && self.is_active.is_none()
    }
}

/// Kind of page being monitored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Product,
    Pricing,
    News,
    Blog,
    Press,
    Careers,
    #[default]
    Other,
}

impl PageType {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Product => "product",
            PageType::Pricing => "pricing",
            PageType::News => "news",
            PageType::Blog => "blog",
            PageType::Press => "press",
            PageType::Careers => "careers",
            PageType::Other => "other",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "product" => Ok(PageType::Product),
            "pricing" => Ok(PageType::Pricing),
            "news" => Ok(PageType::News),
            "blog" => Ok(PageType::Blog),
            "press" => Ok(PageType::Press),
            "careers" => Ok(PageType::Careers),
            "other" => Ok(PageType::Other),
            _ => Err(format!("unknown page type: {s}")),
        }
    }
}

/// A competitor page checked for changes.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoredUrl {
    /// URL ID.
    pub id: i64,
    /// Owning competitor.
    pub competitor_id: i64,
    /// Page URL.
    pub url: String,
    /// Display name.
    pub name: Option<String>,
    /// Kind of page.
    pub page_type: PageType,
    /// Minimum hours between checks.
    pub check_interval_hours: i64,
    /// Last time the page was checked.
    pub last_checked_at: Option<DateTime<Utc>>,
    /// Hash of the last extracted text.
    #[serde(skip_serializing)]
    pub last_content_hash: Option<String>,
    /// Last extracted text, used as the diff baseline.
    #[serde(skip_serializing)]
    pub last_content: Option<String>,
    /// Whether the URL is checked.
    pub is_active: bool,
    /// Last fetch error.
    pub last_error: Option<String>,
    /// Number of consecutive failed checks.
    pub consecutive_errors: i64,
    /// When the URL was added.
    pub created_at: DateTime<Utc>,
    /// When the URL was last updated.
    pub updated_at: DateTime<Utc>,
}

impl MonitoredUrl {
    /// Check whether the URL is due for a check at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        match self.last_checked_at {
            None => true,
            Some(last) => now >= last + Duration::hours(self.check_interval_hours),
        }
    }
}

/// New monitored URL for creation.
#[derive(Debug, Clone)]
pub struct NewMonitoredUrl {
    /// Owning competitor.
    pub competitor_id: i64,
    /// Page URL.
    pub url: String,
    /// Display name.
    pub name: Option<String>,
    /// Kind of page.
    pub page_type: PageType,
    /// Minimum hours between checks.
    pub check_interval_hours: i64,
}

impl NewMonitoredUrl {
    /// Create a new monitored URL.
    pub fn new(competitor_id: i64, url: impl Into<String>) -> Self {
        Self {
            competitor_id,
            url: url.into(),
            name: None,
            page_type: PageType::Other,
            check_interval_hours: DEFAULT_CHECK_INTERVAL_HOURS,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the page type.
    pub fn with_page_type(mut self, page_type: PageType) -> Self {
        self.page_type = page_type;
        self
    }

    /// Set the check interval.
    pub fn with_check_interval_hours(mut self, hours: i64) -> Self {
        self.check_interval_hours = hours;
        self
    }
}

/// Monitored URL update request.
#[derive(Debug, Clone, Default)]
pub struct MonitoredUrlUpdate {
    /// New URL.
    pub url: Option<String>,
    /// New display name.
    pub name: Option<Option<String>>,
    /// New page type.
    pub page_type: Option<PageType>,
    /// New check interval.
    pub check_interval_hours: Option<i64>,
    /// Whether the URL is active.
    pub is_active: Option<bool>,
}

impl MonitoredUrlUpdate {
    /// Create a new update request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the URL.
    pub fn enable(mut self) -> Self {
        self.is_active = Some(true);
        self
    }

    /// Disable the URL.
    pub fn disable(mut self) -> Self {
        self.is_active = Some(false);
        self
    }

    /// Check if the update is empty.
    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.name.is_none()
            && self.page_type.is_none()
            && self.check_interval_hours.is_none()
            && self.is_active.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_url(last_checked_at: Option<DateTime<Utc>>) -> MonitoredUrl {
        MonitoredUrl {
            id: 1,
            competitor_id: 1,
            url: "https://example.com/pricing".to_string(),
            name: None,
            page_type: PageType::Pricing,
            check_interval_hours: 24,
            last_checked_at,
            last_content_hash: None,
            last_content: None,
            is_active: true,
            last_error: None,
            consecutive_errors: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_page_type_round_trip() {
        for pt in [
            PageType::Product,
            PageType::Pricing,
            PageType::News,
            PageType::Blog,
            PageType::Press,
            PageType::Careers,
            PageType::Other,
        ] {
            assert_eq!(pt.as_str().parse::<PageType>().unwrap(), pt);
        }
        assert!("landing".parse::<PageType>().is_err());
    }

    #[test]
    fn test_never_checked_is_due() {
        assert!(sample_url(None).is_due(Utc::now()));
    }

    #[test]
    fn test_recently_checked_is_not_due() {
        let now = Utc::now();
        let url = sample_url(Some(now - Duration::hours(2)));
        assert!(!url.is_due(now));
        assert!(url.is_due(now + Duration::hours(22)));
    }

    #[test]
    fn test_inactive_is_never_due() {
        let mut url = sample_url(None);
        url.is_active = false;
        assert!(!url.is_due(Utc::now()));
    }

    #[test]
    fn test_update_is_empty() {
        assert!(CompetitorUpdate::new().is_empty());
        assert!(!CompetitorUpdate::new().with_active(false).is_empty());
        assert!(MonitoredUrlUpdate::new().is_empty());
        assert!(!MonitoredUrlUpdate::new().disable().is_empty());
    }
}
