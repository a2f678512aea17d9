//! Team-oriented competitive insights.

mod generator;
mod repository;
mod types;

pub use generator::InsightGenerator;
pub use repository::{InsightRepository, InsightStats};
pub use types::{
    Insight, InsightSource, InsightSummary, NewInsight, Team, DEFAULT_INSIGHT_TITLE,
    DEFAULT_SCORE, HIGH_SCORE,
};
