//! Competitors and the pages monitored for them.

mod repository;
mod types;

pub use repository::{CompetitorRepository, MonitoredUrlRepository};
pub use types::{
    Competitor, CompetitorSummary, CompetitorUpdate, MonitoredUrl, MonitoredUrlUpdate,
    NewCompetitor, NewMonitoredUrl, PageType, DEFAULT_CHECK_INTERVAL_HOURS,
};
