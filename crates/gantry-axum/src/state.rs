//! Shared application state type.
//!
//! Defines the `AppState` type used across all handlers and routers.

use std::sync::Arc;

use crate::bootstrap::AdminContext;

/// Application state shared across all handlers.
///
/// This is an Arc-wrapped [`AdminContext`] containing the runner port,
/// launch spec, and event receiver.
pub type AppState = Arc<AdminContext>;
