//! REST API for the dashboard.
//!
//! Every route lives under `/api` and answers with a `{"data": ...}`
//! envelope. Exports are served as attachments.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::{create_health_router, create_router};
pub use server::WebServer;
