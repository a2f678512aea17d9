//! rivalwatch - competitive intelligence monitor.
//!
//! Watches competitor web pages and news, classifies what changed with an
//! LLM, raises risk-scored alerts with recommended actions, and serves the
//! results over a REST API. Chat notifications, team insights, battle
//! cards, win/loss tracking, response playbooks, a feature comparison
//! matrix and CSV/PDF exports build on the same store.

pub mod alert;
pub mod analyzer;
pub mod battle_card;
pub mod competitor;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod export;
pub mod feature;
pub mod fetch;
pub mod insight;
pub mod llm;
pub mod logging;
pub mod monitor;
pub mod news;
pub mod notify;
pub mod pipeline;
pub mod playbook;
pub mod report;
pub mod scheduler;
pub mod web;
pub mod win_loss;

pub use config::Config;
pub use db::{Database, DbPool};
pub use error::{Result, RivalError};
pub use pipeline::{run_cycle, run_digest, CycleOptions, CycleReport, DigestReport, Services};
pub use scheduler::{start_scheduler, Scheduler};
pub use web::WebServer;
