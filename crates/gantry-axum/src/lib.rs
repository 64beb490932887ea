//! Axum admin API adapter for gantry.
//!
//! Serves the supervisor's own HTTP surface: a plain liveness endpoint,
//! JSON status for the supervised application, a stop operation, and an
//! SSE stream of lifecycle events. The admin API listens on its own port,
//! separate from the supervised application's.

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

// Re-export primary types
pub use bootstrap::{AdminConfig, AdminContext, CorsConfig, bootstrap, start_server};
pub use error::HttpError;
pub use routes::create_router;
pub use state::AppState;
