//! Competitor news collection.
//!
//! Articles are gathered from configured RSS/Atom feeds, Google News search
//! and NewsAPI, filtered (duplicates, finance coverage) and stored for the
//! analyzer.

mod collector;
pub mod filter;
mod repository;
pub mod sources;
mod types;

pub use collector::NewsCollector;
pub use repository::NewsRepository;
pub use types::{Article, CollectionReport, NewNewsItem, NewsFilter, NewsItem};
