//! Axum application setup
//!
//! Creates and configures the Axum application with routes and middleware.

use crate::auth::AccessTokens;
use crate::config::Settings;
use crate::relay::WebhookRelay;
use crate::scheduler::{AutomationScheduler, AutomationService, JobRunner};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Automation scheduler driving the posting pipeline
    pub scheduler: Arc<AutomationScheduler>,
    /// Token service for the automation API
    pub tokens: Arc<AccessTokens>,
    /// Messenger webhook relay
    pub relay: Arc<WebhookRelay>,
    /// Application settings
    pub settings: Arc<Settings>,
    /// Server start time for uptime calculation
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Build state with the production automation service as runner
    pub fn new(settings: Settings) -> Self {
        let settings = Arc::new(settings);
        let runner = Arc::new(AutomationService::new(Arc::clone(&settings)));
        Self::with_runner(settings, runner)
    }

    /// Build state over an explicit runner (tests use a mock here)
    pub fn with_runner(settings: Arc<Settings>, runner: Arc<dyn JobRunner>) -> Self {
        let scheduler = Arc::new(AutomationScheduler::new(
            runner,
            settings.scheduler.clone(),
        ));
        let tokens = Arc::new(AccessTokens::from_settings(&settings.auth));
        let relay = Arc::new(WebhookRelay::new(settings.relay.clone()));

        Self {
            scheduler,
            tokens,
            relay,
            settings,
            start_time: std::time::Instant::now(),
        }
    }
}

/// Create the main Axum application with routes and middleware
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(super::handlers::ping))
        .route("/automation/status", get(super::handlers::automation_status))
        .route("/automation/enable", post(super::handlers::automation_enable))
        .route(
            "/automation/disable",
            post(super::handlers::automation_disable),
        )
        .route("/automation/run", post(super::handlers::automation_run))
        .route("/auth/token", post(super::handlers::issue_token))
        .route(
            "/webhook/messenger",
            get(super::handlers::webhook_verify).post(super::handlers::webhook_receive),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_app() {
        let state = AppState::new(Settings::default());
        let _app = create_app(state);
    }
}
