//! Application state and initialization
//!
//! This module wires the services together. Screens are built from the
//! shared `AppState` instead of reaching for process-wide globals.

use crate::config::AppConfig;
use crate::services::{IdentityProvider, NotificationBackend, NotificationScheduler, TokenCache};
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub scheduler: NotificationScheduler,
    pub identity: Arc<dyn IdentityProvider>,
    pub token_cache: TokenCache,
}

/// Application setup - called once on startup
pub fn setup(
    config: AppConfig,
    backend: Arc<dyn NotificationBackend>,
    identity: Arc<dyn IdentityProvider>,
    token_cache: TokenCache,
) -> AppState {
    tracing::info!("Initializing application");

    let state = AppState {
        config,
        scheduler: NotificationScheduler::new(backend),
        identity,
        token_cache,
    };

    tracing::info!("Application initialized successfully");
    state
}
