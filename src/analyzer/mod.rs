//! LLM classification of competitor signals.
//!
//! Page changes and news articles are sent to the model with the company
//! context and the response playbooks. The normalised result becomes an
//! alert, which is then delivered to chat channels and, for high and
//! critical signals, expanded into a team insight.

mod playbook;
mod prompt;
mod result;
mod service;

pub use playbook::{find_playbook, playbook_or_default, Playbook, DEFAULT_PLAYBOOK, PLAYBOOKS};
pub use prompt::analysis_prompt;
pub use result::AnalysisResult;
pub use service::{Analyzer, ProcessReport};
