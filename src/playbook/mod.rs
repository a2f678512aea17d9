//! Competitive response playbooks maintained by the team.

mod repository;
mod types;

pub use repository::PlaybookRepository;
pub use types::{slug_for, CompetitivePlaybook, NewPlaybook, DEFAULT_PRIORITY};
