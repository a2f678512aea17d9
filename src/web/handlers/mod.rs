//! API handlers.

pub mod alerts;
pub mod battle_cards;
pub mod competitors;
pub mod export;
pub mod features;
pub mod insights;
pub mod monitor;
pub mod news;
pub mod playbooks;
pub mod stats;
pub mod win_loss;

pub use alerts::*;
pub use battle_cards::*;
pub use competitors::*;
pub use export::*;
pub use features::*;
pub use insights::*;
pub use monitor::*;
pub use news::*;
pub use playbooks::*;
pub use stats::*;
pub use win_loss::*;

use std::sync::Arc;

use crate::db::DbPool;
use crate::pipeline::Services;

/// State shared by every handler.
pub struct AppState {
    pub services: Arc<Services>,
}

impl AppState {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }

    pub fn pool(&self) -> &DbPool {
        self.services.db.pool()
    }

    /// Timezone for dates in exports.
    pub fn timezone(&self) -> &str {
        &self.services.config.export.timezone
    }
}
