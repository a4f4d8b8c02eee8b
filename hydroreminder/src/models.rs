//! Domain models
//!
//! Rust structs representing reminder requests, backend triggers and
//! notification events. All models use serde for serialization to frontend.

use crate::error::{AppError, Result};
use chrono::{DateTime, Local, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A validated wall-clock time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(AppError::InvalidTime { hour, minute });
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn to_naive(self) -> NaiveTime {
        // Range is checked in `new`
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Content of a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub title: String,
    pub body: String,
    /// Opaque key/values handed through to the backend
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    #[serde(default = "default_sound")]
    pub sound: bool,
}

fn default_sound() -> bool {
    true
}

impl Payload {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            data: BTreeMap::new(),
            sound: default_sound(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Timing policy of a reminder request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleKind {
    Immediate {
        delay_seconds: u64,
    },
    DailyAt {
        hour: u32,
        minute: u32,
    },
    RecurringInterval {
        interval_seconds: u64,
    },
    WindowedRecurring {
        interval_seconds: u64,
        start_hour: u32,
        end_hour: u32,
    },
}

/// A reminder request as issued by the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    #[serde(flatten)]
    pub kind: ScheduleKind,
    pub payload: Payload,
}

/// Backend-level trigger produced by policy translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// Fires `seconds` after scheduling, and every `seconds` after that if `repeats`
    TimeInterval { seconds: u64, repeats: bool },
    /// Fires every day at the given local wall-clock time
    Daily { hour: u32, minute: u32 },
}

impl Trigger {
    pub fn repeats(&self) -> bool {
        match self {
            Trigger::TimeInterval { repeats, .. } => *repeats,
            Trigger::Daily { .. } => true,
        }
    }
}

/// Opaque identifier of a request accepted by the backend
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduledHandle(String);

impl ScheduledHandle {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ScheduledHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for ScheduledHandle {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ScheduledHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A request waiting in the backend queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub handle: ScheduledHandle,
    pub content: Payload,
    pub trigger: Trigger,
}

/// Notification permission as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

/// A notification the backend delivered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveredNotification {
    pub handle: ScheduledHandle,
    pub content: Payload,
    pub delivered_at: DateTime<Local>,
}

/// Action identifier reported when the user taps a notification body
pub const DEFAULT_ACTION: &str = "default";

/// The user acted on a delivered notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInteraction {
    pub handle: ScheduledHandle,
    pub action: String,
}

/// Event emitted by a notification backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotificationEvent {
    Delivered(DeliveredNotification),
    Interacted(UserInteraction),
}

/// Client-side record of a delivered notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationHistoryItem {
    pub id: String,
    pub title: String,
    pub body: String,
    pub timestamp: DateTime<Local>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_of_day_bounds() {
        assert!(TimeOfDay::new(0, 0).is_ok());
        assert!(TimeOfDay::new(23, 59).is_ok());
        assert!(matches!(
            TimeOfDay::new(24, 0),
            Err(AppError::InvalidTime { hour: 24, minute: 0 })
        ));
        assert!(TimeOfDay::new(12, 60).is_err());
    }

    #[test]
    fn test_time_of_day_display() {
        assert_eq!(TimeOfDay::new(9, 5).unwrap().to_string(), "09:05");
    }

    #[test]
    fn test_schedule_request_json_shape() {
        let request = ScheduleRequest {
            kind: ScheduleKind::DailyAt { hour: 9, minute: 0 },
            payload: Payload::new("t", "b"),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["kind"], "daily_at");
        assert_eq!(json["hour"], 9);
        assert_eq!(json["payload"]["sound"], true);
    }

    #[test]
    fn test_handles_are_unique() {
        assert_ne!(ScheduledHandle::new(), ScheduledHandle::new());
    }
}
