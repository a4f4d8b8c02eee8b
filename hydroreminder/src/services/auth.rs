//! Identity provider service
//!
//! Narrow interface over the third-party sign-in SDK, plus a scripted
//! provider used by tests and the demo binary.

use crate::error::{AppError, Result};
use crate::services::credentials::TokenCache;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Key under which the active session token is cached
pub const SESSION_TOKEN_KEY: &str = "__session_token";

/// Session state as observed from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthState {
    pub is_signed_in: bool,
    pub is_loaded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub strategy: String,
    pub redirect_url: String,
}

/// Result of an OAuth round trip. No session id means the user backed out.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OAuthFlowOutcome {
    pub created_session_id: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn start_oauth_flow(&self, config: &OAuthConfig) -> Result<OAuthFlowOutcome>;

    async fn activate_session(&self, session_id: &str) -> Result<()>;

    async fn sign_out(&self) -> Result<()>;

    /// Observer of `AuthState` changes
    fn state(&self) -> watch::Receiver<AuthState>;
}

/// Provider whose OAuth outcomes are queued up front
pub struct ScriptedIdentityProvider {
    publishable_key: Option<String>,
    state: watch::Sender<AuthState>,
    token_cache: TokenCache,
    next_session: Mutex<Option<String>>,
    next_error: Mutex<Option<String>>,
}

impl ScriptedIdentityProvider {
    pub fn new(token_cache: TokenCache) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self {
            publishable_key: None,
            state,
            token_cache,
            next_session: Mutex::new(None),
            next_error: Mutex::new(None),
        }
    }

    /// Key identifying the application to the provider
    pub fn with_publishable_key(mut self, key: Option<String>) -> Self {
        self.publishable_key = key;
        self
    }

    pub fn publishable_key(&self) -> Option<&str> {
        self.publishable_key.as_deref()
    }

    /// Restore the session from the token cache and mark the provider loaded
    pub fn load(&self) {
        let signed_in = self.token_cache.get_token(SESSION_TOKEN_KEY).is_some();
        tracing::debug!("Identity provider loaded, cached session: {}", signed_in);
        self.state.send_replace(AuthState {
            is_signed_in: signed_in,
            is_loaded: true,
        });
    }

    /// The next OAuth flow creates this session
    pub fn will_create_session(&self, session_id: impl Into<String>) {
        *self.next_session.lock() = Some(session_id.into());
    }

    /// The next OAuth flow fails with this message
    pub fn will_fail(&self, message: impl Into<String>) {
        *self.next_error.lock() = Some(message.into());
    }
}

#[async_trait]
impl IdentityProvider for ScriptedIdentityProvider {
    async fn start_oauth_flow(&self, config: &OAuthConfig) -> Result<OAuthFlowOutcome> {
        tracing::info!(
            "Starting OAuth flow ({}) redirecting to {}, publishable key set: {}",
            config.strategy,
            config.redirect_url,
            self.publishable_key.is_some()
        );
        if let Some(message) = self.next_error.lock().take() {
            return Err(AppError::Identity(message));
        }
        Ok(OAuthFlowOutcome {
            created_session_id: self.next_session.lock().take(),
        })
    }

    async fn activate_session(&self, session_id: &str) -> Result<()> {
        self.token_cache.save_token(SESSION_TOKEN_KEY, session_id);
        self.state.send_replace(AuthState {
            is_signed_in: true,
            is_loaded: true,
        });
        tracing::info!("Session {} activated", session_id);
        Ok(())
    }

    async fn sign_out(&self) -> Result<()> {
        self.token_cache.clear_token(SESSION_TOKEN_KEY);
        self.state.send_replace(AuthState {
            is_signed_in: false,
            is_loaded: true,
        });
        tracing::info!("Signed out");
        Ok(())
    }

    fn state(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }
}
