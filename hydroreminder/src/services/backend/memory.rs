//! In-process backend driven by an explicit clock
//!
//! Nothing fires on its own: the owner calls `advance_to` with the current
//! time and every due occurrence is delivered exactly once.

use super::NotificationBackend;
use crate::config::EVENT_CHANNEL_CAPACITY;
use crate::error::{AppError, Result};
use crate::models::{
    DeliveredNotification, NotificationEvent, Payload, PendingRequest, PermissionStatus,
    ScheduledHandle, Trigger, UserInteraction,
};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
struct Entry {
    request: PendingRequest,
    scheduled_at: DateTime<Local>,
    next_fire: Option<DateTime<Local>>,
}

#[derive(Debug)]
struct State {
    permission: PermissionStatus,
    /// Answer given when an undetermined permission is requested
    prompt_answer: PermissionStatus,
    unavailable: bool,
    clock: DateTime<Local>,
    queue: Vec<Entry>,
}

/// Deterministic backend with a simulated clock
#[derive(Clone)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
    events: broadcast::Sender<NotificationEvent>,
}

impl MemoryBackend {
    /// Backend with undetermined permission that the user will grant
    pub fn new() -> Self {
        Self::starting_at(Local::now())
    }

    pub fn starting_at(clock: DateTime<Local>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(State {
                permission: PermissionStatus::Undetermined,
                prompt_answer: PermissionStatus::Granted,
                unavailable: false,
                clock,
                queue: Vec::new(),
            })),
            events,
        }
    }

    /// Make the simulated user deny the permission prompt
    pub fn deny_permission(&self) {
        let mut state = self.state.lock();
        state.permission = PermissionStatus::Denied;
        state.prompt_answer = PermissionStatus::Denied;
    }

    /// Simulate the host notification service failing every call
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    pub fn now(&self) -> DateTime<Local> {
        self.state.lock().clock
    }

    /// Move the clock forward and deliver everything that came due, oldest first.
    ///
    /// Returns the number of deliveries.
    pub fn advance_to(&self, now: DateTime<Local>) -> usize {
        let mut delivered = Vec::new();
        {
            let mut state = self.state.lock();
            if now < state.clock {
                tracing::warn!("Ignoring attempt to move the clock backwards");
                return 0;
            }
            state.clock = now;

            for entry in state.queue.iter_mut() {
                while let Some(fire) = entry.next_fire.filter(|fire| *fire <= now) {
                    delivered.push(DeliveredNotification {
                        handle: entry.request.handle.clone(),
                        content: entry.request.content.clone(),
                        delivered_at: fire,
                    });
                    entry.next_fire = entry.request.trigger.next_fire_after(entry.scheduled_at, fire);
                }
            }
            state.queue.retain(|entry| entry.next_fire.is_some());
        }

        delivered.sort_by_key(|d| d.delivered_at);
        let count = delivered.len();
        for notification in delivered {
            tracing::debug!("Delivering notification {}", notification.handle);
            // No receivers is fine: nobody is listening
            let _ = self.events.send(NotificationEvent::Delivered(notification));
        }
        count
    }

    fn check_available(state: &State) -> Result<()> {
        if state.unavailable {
            return Err(AppError::BackendUnavailable(
                "notification service is not responding".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationBackend for MemoryBackend {
    async fn permission_status(&self) -> Result<PermissionStatus> {
        let state = self.state.lock();
        Self::check_available(&state)?;
        Ok(state.permission)
    }

    async fn request_permission(&self) -> Result<PermissionStatus> {
        let mut state = self.state.lock();
        Self::check_available(&state)?;
        if state.permission == PermissionStatus::Undetermined {
            state.permission = state.prompt_answer;
        }
        Ok(state.permission)
    }

    async fn schedule(&self, content: Payload, trigger: Trigger) -> Result<ScheduledHandle> {
        let mut state = self.state.lock();
        Self::check_available(&state)?;
        if state.permission != PermissionStatus::Granted {
            return Err(AppError::PermissionDenied);
        }

        let handle = ScheduledHandle::new();
        let scheduled_at = state.clock;
        let next_fire = trigger.next_fire_after(scheduled_at, scheduled_at);
        state.queue.push(Entry {
            request: PendingRequest {
                handle: handle.clone(),
                content,
                trigger,
            },
            scheduled_at,
            next_fire,
        });
        Ok(handle)
    }

    async fn cancel_all(&self) -> Result<()> {
        let mut state = self.state.lock();
        Self::check_available(&state)?;
        state.queue.clear();
        Ok(())
    }

    async fn pending(&self) -> Result<Vec<PendingRequest>> {
        let state = self.state.lock();
        Self::check_available(&state)?;
        Ok(state.queue.iter().map(|e| e.request.clone()).collect())
    }

    async fn respond(&self, handle: &ScheduledHandle, action: &str) -> Result<()> {
        let _ = self.events.send(NotificationEvent::Interacted(UserInteraction {
            handle: handle.clone(),
            action: action.to_string(),
        }));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 10, 7, 0, 0).earliest().unwrap()
    }

    async fn granted_backend() -> MemoryBackend {
        let backend = MemoryBackend::starting_at(start());
        backend.request_permission().await.unwrap();
        backend
    }

    #[tokio::test]
    async fn test_schedule_requires_permission() {
        let backend = MemoryBackend::starting_at(start());
        let result = backend
            .schedule(Payload::new("t", "b"), Trigger::Daily { hour: 9, minute: 0 })
            .await;
        assert!(matches!(result, Err(AppError::PermissionDenied)));
    }

    #[tokio::test]
    async fn test_denied_prompt_stays_denied() {
        let backend = MemoryBackend::starting_at(start());
        backend.deny_permission();
        assert_eq!(
            backend.request_permission().await.unwrap(),
            PermissionStatus::Denied
        );
    }

    #[tokio::test]
    async fn test_one_shot_leaves_queue_after_delivery() {
        let backend = granted_backend().await;
        let mut events = backend.subscribe();
        backend
            .schedule(
                Payload::new("t", "b"),
                Trigger::TimeInterval {
                    seconds: 2,
                    repeats: false,
                },
            )
            .await
            .unwrap();

        assert_eq!(backend.advance_to(start() + Duration::seconds(1)), 0);
        assert_eq!(backend.pending().await.unwrap().len(), 1);

        assert_eq!(backend.advance_to(start() + Duration::seconds(2)), 1);
        assert!(backend.pending().await.unwrap().is_empty());
        assert!(matches!(
            events.try_recv().unwrap(),
            NotificationEvent::Delivered(_)
        ));

        assert_eq!(backend.advance_to(start() + Duration::hours(5)), 0);
    }

    #[tokio::test]
    async fn test_repeating_delivers_every_occurrence() {
        let backend = granted_backend().await;
        backend
            .schedule(
                Payload::new("t", "b"),
                Trigger::TimeInterval {
                    seconds: 3_600,
                    repeats: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(backend.advance_to(start() + Duration::hours(3)), 3);
        assert_eq!(backend.pending().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_backend_fails_calls() {
        let backend = granted_backend().await;
        backend.set_unavailable(true);
        assert!(matches!(
            backend.pending().await,
            Err(AppError::BackendUnavailable(_))
        ));
        assert!(backend.cancel_all().await.is_err());
    }
}
