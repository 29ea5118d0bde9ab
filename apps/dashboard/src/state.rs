use std::sync::Arc;

use crate::api::ScreeningApi;
use crate::config::Config;
use crate::health::HealthMonitor;
use crate::render::Templates;
use crate::shell::activity::ActivityTracker;
use crate::shell::session::Sessions;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Screening backend client. `HttpScreeningApi` in production.
    pub api: Arc<dyn ScreeningApi>,
    pub config: Config,
    pub templates: Arc<Templates>,
    /// Per-browser notifications, uploads and matching state.
    pub sessions: Sessions,
    /// Global loading flag shown in the shell.
    pub activity: ActivityTracker,
    pub health: HealthMonitor,
}

impl AppState {
    pub fn new(api: Arc<dyn ScreeningApi>, config: Config) -> Result<Self, tera::Error> {
        Ok(Self {
            api,
            templates: Arc::new(Templates::load()?),
            sessions: Sessions::new(config.notification_ttl, config.session_idle_timeout),
            activity: ActivityTracker::new(),
            health: HealthMonitor::new(),
            config,
        })
    }
}
