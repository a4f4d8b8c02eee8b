//! Application configuration constants
//!
//! Central location for the fixed reminder cadences, picker steps and
//! default notification content, plus the runtime `AppConfig`.

use crate::error::Result;
use serde::{Deserialize, Serialize};

// ===== Reminder Cadences =====

/// Delay before a test notification is delivered, in seconds
pub const IMMEDIATE_DELAY_SECS: u64 = 2;

/// Interval of the hourly reminder, in seconds
pub const HOURLY_INTERVAL_SECS: u64 = 3_600;

/// Interval between reminders inside the daily window, in seconds
pub const WINDOW_INTERVAL_SECS: u64 = 7_200;

/// First hour of the daily reminder window (inclusive)
pub const WINDOW_START_HOUR: u32 = 8;

/// Last hour of the daily reminder window (inclusive)
pub const WINDOW_END_HOUR: u32 = 22;

// ===== Time Picker =====

/// Hour preselected by the time picker
pub const DEFAULT_PICKER_HOUR: u32 = 9;

/// Minute preselected by the time picker
pub const DEFAULT_PICKER_MINUTE: u32 = 0;

/// Step of the minute picker. 60 must be a multiple of it.
pub const MINUTE_STEP: u32 = 15;

// ===== Notification Content =====

/// Title used for history entries whose notification had none
pub const FALLBACK_HISTORY_TITLE: &str = "Notification";

pub const REMINDER_TITLE: &str = "💧 Time to hydrate!";
pub const REMINDER_BODY: &str = "Drink a glass of water to stay hydrated.";
pub const TEST_TITLE: &str = "🔔 Test notification";
pub const TEST_BODY: &str = "Notifications are working. Stay hydrated!";

// ===== Identity =====

/// OAuth strategy used by the sign-in screen
pub const OAUTH_STRATEGY_GOOGLE: &str = "oauth_google";

/// Service name under which session tokens are stored in the OS credential store
pub const CREDENTIAL_SERVICE_NAME: &str = "HydroReminder";

/// Capacity of the notification event channel.
/// Slow subscribers lose the oldest events beyond this limit.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Publishable key handed to the identity provider
    #[serde(default)]
    pub publishable_key: Option<String>,
    #[serde(default = "default_redirect_url")]
    pub redirect_url: String,
}

fn default_redirect_url() -> String {
    "hydroreminder://".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            publishable_key: None,
            redirect_url: default_redirect_url(),
        }
    }
}

impl AppConfig {
    /// Build the configuration from `HYDRO_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(key) = std::env::var("HYDRO_PUBLISHABLE_KEY") {
            if !key.trim().is_empty() {
                config.publishable_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var("HYDRO_REDIRECT_URL") {
            if !url.trim().is_empty() {
                config.redirect_url = url;
            }
        }

        if config.publishable_key.is_none() {
            tracing::warn!("HYDRO_PUBLISHABLE_KEY is not set");
        }

        config
    }

    /// Parse a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
