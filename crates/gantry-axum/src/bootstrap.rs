//! Admin server bootstrap - the composition root.
//!
//! This module is the ONLY place where the supervisor is wired to the web
//! adapter. All concrete implementations are instantiated here.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::info;

use gantry_core::domain::AppSpec;
use gantry_core::events::AppEvent;
use gantry_core::ports::ProcessRunner;
use gantry_core::settings::Settings;
use gantry_runtime::{Supervisor, TracingSupervisorEvents};

/// CORS configuration for the admin server.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins (production mode).
    AllowOrigins(Vec<String>),
}

/// Server configuration for the admin adapter.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Port for the admin HTTP server.
    pub port: u16,
    /// CORS configuration.
    pub cors: CorsConfig,
}

impl AdminConfig {
    /// Build the admin config from settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            port: settings.effective_admin_port(),
            cors: CorsConfig::default(),
        }
    }
}

/// Application context for the admin adapter.
///
/// Holds everything handlers need: the runner port, the effective launch
/// spec, and an event receiver to fan out over SSE.
pub struct AdminContext {
    /// Process runner for lifecycle operations.
    pub runner: Arc<dyn ProcessRunner>,
    /// Effective launch spec of the supervised application.
    pub spec: AppSpec,
    /// Lifecycle event receiver; handlers call `resubscribe()` per client.
    pub events: broadcast::Receiver<AppEvent>,
}

/// Bootstrap the supervisor and the admin context from settings.
///
/// Returns the concrete supervisor (so the caller can start/stop the
/// application) alongside the context the admin router needs.
pub fn bootstrap(settings: &Settings) -> Result<(Arc<Supervisor>, AdminContext)> {
    let spec = settings.app_spec()?;

    let supervisor = Arc::new(
        Supervisor::new(settings.health_policy(), settings.effective_health_path())
            .with_allow_root(settings.allow_root())
            .with_observer(Arc::new(TracingSupervisorEvents)),
    );

    let events = supervisor.subscribe();
    let ctx = AdminContext {
        runner: supervisor.clone(),
        spec,
        events,
    };

    Ok((supervisor, ctx))
}

/// Start the admin server on the configured port.
pub async fn start_server(config: AdminConfig, ctx: AdminContext) -> Result<()> {
    use tokio::net::TcpListener;

    let app = crate::routes::create_router(ctx, &config.cors);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("gantry admin API listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
