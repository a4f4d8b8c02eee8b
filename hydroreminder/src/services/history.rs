//! Delivered notification history
//!
//! In-memory, newest first, cleared only on request. Never persisted.

use crate::config::FALLBACK_HISTORY_TITLE;
use crate::models::{DeliveredNotification, NotificationHistoryItem};
use chrono::{DateTime, Local};
use std::collections::VecDeque;

#[derive(Debug, Default, Clone)]
pub struct NotificationHistory {
    items: VecDeque<NotificationHistoryItem>,
}

impl NotificationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a delivery observed at `observed_at`
    pub fn record(&mut self, delivered: &DeliveredNotification, observed_at: DateTime<Local>) {
        let title = if delivered.content.title.is_empty() {
            FALLBACK_HISTORY_TITLE.to_string()
        } else {
            delivered.content.title.clone()
        };

        self.items.push_front(NotificationHistoryItem {
            id: delivered.handle.to_string(),
            title,
            body: delivered.content.body.clone(),
            timestamp: observed_at,
        });
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Entries, newest first
    pub fn items(&self) -> &VecDeque<NotificationHistoryItem> {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Render a history timestamp as `HH:MM`
pub fn format_timestamp(timestamp: &DateTime<Local>) -> String {
    timestamp.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Payload, ScheduledHandle};
    use chrono::{Duration, TimeZone};

    fn delivered(title: &str) -> DeliveredNotification {
        DeliveredNotification {
            handle: ScheduledHandle::new(),
            content: Payload::new(title, "body"),
            delivered_at: Local::now(),
        }
    }

    #[test]
    fn test_record_keeps_newest_first() {
        let mut history = NotificationHistory::new();
        let t0 = Local.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).earliest().unwrap();

        history.record(&delivered("first"), t0);
        history.record(&delivered("second"), t0 + Duration::minutes(5));
        history.record(&delivered("third"), t0 + Duration::minutes(10));

        let titles: Vec<&str> = history.items().iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["third", "second", "first"]);
        assert_eq!(history.items()[2].timestamp, t0);
    }

    #[test]
    fn test_record_uses_fallback_title() {
        let mut history = NotificationHistory::new();
        history.record(&delivered(""), Local::now());
        assert_eq!(history.items()[0].title, "Notification");
        assert_eq!(history.items()[0].body, "body");
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut history = NotificationHistory::new();
        history.clear();
        assert!(history.is_empty());

        history.record(&delivered("a"), Local::now());
        history.record(&delivered("b"), Local::now());
        history.clear();
        assert!(history.is_empty());
        history.clear();
        assert_eq!(history.len(), 0);
    }

    #[test]
    fn test_format_timestamp() {
        let t = Local.with_ymd_and_hms(2026, 1, 10, 7, 5, 59).earliest().unwrap();
        assert_eq!(format_timestamp(&t), "07:05");
    }
}
