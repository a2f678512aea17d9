//! Win/loss tracking against competitors.

mod repository;
mod types;

pub use repository::WinLossRepository;
pub use types::{
    NewWinLossRecord, Outcome, WinLossFilter, WinLossRecord, WinLossStats, DEFAULT_WINDOW_DAYS,
};
