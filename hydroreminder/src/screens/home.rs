//! Home screen state
//!
//! Owns the time picker, the delivered-notification history and the count of
//! scheduled reminders. Event subscriptions are acquired in `mount` and
//! released in `unmount` (or when the screen is dropped).

use crate::app::AppState;
use crate::config::{
    HOURLY_INTERVAL_SECS, REMINDER_BODY, REMINDER_TITLE, TEST_BODY, TEST_TITLE,
    WINDOW_END_HOUR, WINDOW_INTERVAL_SECS, WINDOW_START_HOUR,
};
use crate::error::{AppError, Result};
use crate::models::{NotificationHistoryItem, Payload};
use crate::screens::time_picker::TimePicker;
use crate::services::auth::IdentityProvider;
use crate::services::history::NotificationHistory;
use crate::services::scheduler::{NotificationScheduler, PermissionGrant, Subscription};
use chrono::Local;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// One-shot message shown to the user after an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    fn success(message: impl Into<String>) -> Self {
        Self {
            title: "Success".to_string(),
            message: message.into(),
        }
    }

    fn error(err: &AppError) -> Self {
        Self {
            title: "Error".to_string(),
            message: err.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.title == "Error"
    }
}

fn reminder_payload() -> Payload {
    Payload::new(REMINDER_TITLE, REMINDER_BODY).with_data("type", "hydration")
}

pub struct HomeScreen {
    scheduler: NotificationScheduler,
    identity: Arc<dyn IdentityProvider>,
    picker: TimePicker,
    history: Arc<Mutex<NotificationHistory>>,
    scheduled_count: usize,
    grant: Option<PermissionGrant>,
    subscriptions: Vec<Subscription>,
}

impl HomeScreen {
    pub fn new(state: &AppState) -> Self {
        Self {
            scheduler: state.scheduler.clone(),
            identity: Arc::clone(&state.identity),
            picker: TimePicker::new(),
            history: Arc::new(Mutex::new(NotificationHistory::new())),
            scheduled_count: 0,
            grant: None,
            subscriptions: Vec::new(),
        }
    }

    /// Ask for permission, subscribe to notification events and load the count
    pub async fn mount(&mut self) {
        // Remounting must not leave the previous listeners running
        self.unmount();

        match self.scheduler.ensure_permission().await {
            Ok(grant) => self.grant = Some(grant),
            Err(e) => tracing::warn!("Notifications unavailable: {}", e),
        }

        let history = Arc::clone(&self.history);
        self.subscriptions.push(self.scheduler.on_delivered(move |delivered| {
            tracing::debug!("Notification received: {}", delivered.handle);
            history.lock().record(&delivered, Local::now());
        }));
        self.subscriptions
            .push(self.scheduler.on_user_interaction(|interaction| {
                tracing::info!(
                    "Notification {} opened ({})",
                    interaction.handle,
                    interaction.action
                );
            }));

        self.refresh_scheduled_count().await;
    }

    /// Release the event subscriptions
    pub fn unmount(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.remove();
        }
    }

    pub fn is_mounted(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    pub fn picker(&self) -> &TimePicker {
        &self.picker
    }

    pub fn picker_mut(&mut self) -> &mut TimePicker {
        &mut self.picker
    }

    pub fn scheduled_count(&self) -> usize {
        self.scheduled_count
    }

    /// Delivered notifications, newest first
    pub fn history(&self) -> Vec<NotificationHistoryItem> {
        self.history.lock().items().iter().cloned().collect()
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }

    pub async fn refresh_scheduled_count(&mut self) {
        match self.scheduler.list_pending().await {
            Ok(pending) => self.scheduled_count = pending.len(),
            Err(e) => tracing::warn!("Failed to count scheduled notifications: {}", e),
        }
    }

    async fn grant(&mut self) -> Result<PermissionGrant> {
        if let Some(grant) = &self.grant {
            return Ok(grant.clone());
        }
        let grant = self.scheduler.ensure_permission().await?;
        self.grant = Some(grant.clone());
        Ok(grant)
    }

    async fn finish(&mut self, outcome: Result<String>) -> Alert {
        let alert = match outcome {
            Ok(message) => Alert::success(message),
            Err(e) => {
                tracing::error!("Reminder action failed: {}", e);
                Alert::error(&e)
            }
        };
        self.refresh_scheduled_count().await;
        alert
    }

    /// Daily reminder at the picked time
    pub async fn schedule_at_selected_time(&mut self) -> Alert {
        let outcome = self.try_schedule_at_selected_time().await;
        self.finish(outcome).await
    }

    /// Test notification delivered after a couple of seconds
    pub async fn test_notification(&mut self) -> Alert {
        let outcome = self.try_test_notification().await;
        self.finish(outcome).await
    }

    pub async fn schedule_hourly(&mut self) -> Alert {
        let outcome = self.try_schedule_hourly().await;
        self.finish(outcome).await
    }

    pub async fn schedule_every_two_hours(&mut self) -> Alert {
        let outcome = self.try_schedule_every_two_hours().await;
        self.finish(outcome).await
    }

    pub async fn cancel_all(&mut self) -> Alert {
        let outcome = self
            .scheduler
            .cancel_all()
            .await
            .map(|()| "All reminders cancelled!".to_string());
        self.finish(outcome).await
    }

    async fn try_schedule_at_selected_time(&mut self) -> Result<String> {
        let grant = self.grant().await?;
        let time = self.picker.time()?;
        self.scheduler
            .schedule_daily_at(&grant, time.hour(), time.minute(), reminder_payload())
            .await?;
        Ok(format!("Daily reminder scheduled for {}", self.picker.label()))
    }

    async fn try_test_notification(&mut self) -> Result<String> {
        let grant = self.grant().await?;
        self.scheduler
            .schedule_immediate(&grant, Payload::new(TEST_TITLE, TEST_BODY))
            .await?;
        Ok("Notification scheduled for 2 seconds from now!".to_string())
    }

    async fn try_schedule_hourly(&mut self) -> Result<String> {
        let grant = self.grant().await?;
        self.scheduler
            .schedule_recurring(&grant, HOURLY_INTERVAL_SECS, reminder_payload())
            .await?;
        Ok("Reminders scheduled every hour!".to_string())
    }

    async fn try_schedule_every_two_hours(&mut self) -> Result<String> {
        let grant = self.grant().await?;
        let outcomes = self
            .scheduler
            .schedule_windowed(
                &grant,
                WINDOW_INTERVAL_SECS,
                WINDOW_START_HOUR,
                WINDOW_END_HOUR,
                reminder_payload(),
            )
            .await;

        let total = outcomes.len();
        let mut failed = outcomes.into_iter().filter_map(|o| o.err());
        match failed.next() {
            None => Ok(format!(
                "Reminders scheduled every 2 hours ({}h to {}h)!",
                WINDOW_START_HOUR, WINDOW_END_HOUR
            )),
            Some(first) => {
                let failures = 1 + failed.count();
                tracing::warn!("{} of {} windowed reminders failed", failures, total);
                Err(first)
            }
        }
    }

    pub async fn sign_out(&mut self) -> Result<()> {
        self.unmount();
        self.identity.sign_out().await
    }
}

impl Drop for HomeScreen {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app;
    use crate::config::AppConfig;
    use crate::services::auth::ScriptedIdentityProvider;
    use crate::services::backend::MemoryBackend;
    use crate::services::credentials::{MemoryStore, TokenCache};
    use chrono::{DateTime, Duration, TimeZone};

    fn start() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 10, 7, 0, 0).earliest().unwrap()
    }

    fn setup() -> (HomeScreen, MemoryBackend) {
        let backend = MemoryBackend::starting_at(start());
        let cache = TokenCache::new(Arc::new(MemoryStore::new()));
        let identity = Arc::new(ScriptedIdentityProvider::new(cache.clone()));
        let state = app::setup(
            AppConfig::default(),
            Arc::new(backend.clone()),
            identity,
            cache,
        );
        (HomeScreen::new(&state), backend)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_test_notification_lands_in_history() {
        let (mut home, backend) = setup();
        home.mount().await;

        let alert = home.test_notification().await;
        assert!(!alert.is_error());
        assert_eq!(home.scheduled_count(), 1);

        backend.advance_to(start() + Duration::seconds(2));
        settle().await;

        let history = home.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].title, TEST_TITLE);

        home.refresh_scheduled_count().await;
        assert_eq!(home.scheduled_count(), 0);
    }

    #[tokio::test]
    async fn test_schedule_at_selected_time_uses_picker() {
        let (mut home, _backend) = setup();
        home.mount().await;
        home.picker_mut().decrement_hour();
        home.picker_mut().increment_minute();

        let alert = home.schedule_at_selected_time().await;
        assert_eq!(alert.message, "Daily reminder scheduled for 8:15");
        assert_eq!(home.scheduled_count(), 1);
    }

    #[tokio::test]
    async fn test_every_two_hours_then_cancel() {
        let (mut home, _backend) = setup();
        home.mount().await;

        let alert = home.schedule_every_two_hours().await;
        assert_eq!(alert.message, "Reminders scheduled every 2 hours (8h to 22h)!");
        assert_eq!(home.scheduled_count(), 8);

        home.schedule_hourly().await;
        assert_eq!(home.scheduled_count(), 9);

        home.cancel_all().await;
        assert_eq!(home.scheduled_count(), 0);
    }

    #[tokio::test]
    async fn test_permission_denied_shows_error() {
        let (mut home, backend) = setup();
        backend.deny_permission();
        home.mount().await;

        let alert = home.test_notification().await;
        assert!(alert.is_error());
        assert_eq!(alert.message, "Notification permission not granted");
        assert_eq!(home.scheduled_count(), 0);
    }

    #[tokio::test]
    async fn test_unmount_stops_history_updates() {
        let (mut home, backend) = setup();
        home.mount().await;
        home.test_notification().await;
        home.unmount();
        assert!(!home.is_mounted());

        backend.advance_to(start() + Duration::seconds(2));
        settle().await;
        assert!(home.history().is_empty());
    }

    #[tokio::test]
    async fn test_remount_does_not_duplicate_history() {
        let (mut home, backend) = setup();
        home.mount().await;
        home.mount().await;
        home.test_notification().await;

        backend.advance_to(start() + Duration::seconds(2));
        settle().await;
        assert_eq!(home.history().len(), 1);

        home.clear_history();
        assert!(home.history().is_empty());
    }
}
