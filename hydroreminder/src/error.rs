//! Error types for HydroReminder
//!
//! All errors use thiserror for structured error handling.
//! These errors can be serialized to the frontend as a one-shot message.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Notification permission not granted")]
    PermissionDenied,

    #[error("Sign-in was cancelled or returned no session")]
    AuthFlowCancelled,

    #[error("Notification service unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Invalid time of day: {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },

    #[error("Invalid repeat interval: {0} seconds")]
    InvalidInterval(u64),

    #[error("Invalid reminder window: {start_hour}h to {end_hour}h")]
    InvalidWindow { start_hour: u32, end_hour: u32 },

    #[error("Identity provider error: {0}")]
    Identity(String),

    #[error("Credential store error: {0}")]
    Credential(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
