//! Alerts raised for competitor signals.

mod repository;
mod types;

pub use repository::{AlertGrouping, AlertRepository};
pub use types::{
    Alert, AlertCounts, AlertFilter, AlertStatus, AlertUpdate, NewAlert, RecommendedAction,
    RiskLevel, SignalType, SourceType,
};
