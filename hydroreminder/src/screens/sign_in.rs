//! Sign-in screen state
//!
//! Runs the Google OAuth flow through the identity provider and activates
//! the session it creates.

use crate::app::AppState;
use crate::config::OAUTH_STRATEGY_GOOGLE;
use crate::error::{AppError, Result};
use crate::services::auth::{IdentityProvider, OAuthConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct SignInScreen {
    identity: Arc<dyn IdentityProvider>,
    redirect_url: String,
    is_loading: AtomicBool,
}

/// Clears the loading flag however the flow ends
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SignInScreen {
    pub fn new(state: &AppState) -> Self {
        Self {
            identity: Arc::clone(&state.identity),
            redirect_url: state.config.redirect_url.clone(),
            is_loading: AtomicBool::new(false),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading.load(Ordering::SeqCst)
    }

    pub async fn sign_in_with_google(&self) -> Result<()> {
        let _loading = LoadingGuard::start(&self.is_loading);

        let result = self.run_google_flow().await;
        if let Err(e) = &result {
            tracing::error!("Google sign-in failed: {}", e);
        }
        result
    }

    async fn run_google_flow(&self) -> Result<()> {
        let config = OAuthConfig {
            strategy: OAUTH_STRATEGY_GOOGLE.to_string(),
            redirect_url: self.redirect_url.clone(),
        };

        let outcome = self.identity.start_oauth_flow(&config).await?;
        match outcome.created_session_id {
            Some(session_id) => self.identity.activate_session(&session_id).await,
            None => Err(AppError::AuthFlowCancelled),
        }
    }
}
