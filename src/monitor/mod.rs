//! Competitor page monitoring.
//!
//! Pages are fetched, reduced to their readable text and hashed. A changed
//! hash produces a snapshot carrying a unified diff and a short summary that
//! the analyzer turns into alerts.

mod extract;
mod service;
mod snapshot;

pub use extract::{content_hash, extract_text, summarize_changes, unified_diff};
pub use service::{CheckOutcome, PageMonitor};
pub use snapshot::{NewSnapshot, PageChange, PageSnapshot, SnapshotRepository};
