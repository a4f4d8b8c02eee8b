//! Notification scheduler service
//!
//! Façade over a `NotificationBackend`: translates reminder policies into
//! backend requests, lists and cancels them, and hands out event
//! subscriptions. Holds no mutable state of its own.

use crate::error::{AppError, Result};
use crate::models::{
    DeliveredNotification, NotificationEvent, Payload, PendingRequest, PermissionStatus,
    ScheduleKind, ScheduleRequest, ScheduledHandle, UserInteraction,
};
use crate::services::backend::NotificationBackend;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Proof that notification permission was granted.
///
/// Only `NotificationScheduler::ensure_permission` creates one.
#[derive(Debug, Clone)]
pub struct PermissionGrant {
    _private: (),
}

/// Live event subscription. Dropping it or calling `remove` stops the callback.
#[derive(Debug)]
pub struct Subscription {
    task: Option<JoinHandle<()>>,
    active: Arc<AtomicBool>,
}

impl Subscription {
    fn spawn<F>(mut receiver: broadcast::Receiver<NotificationEvent>, mut on_event: F) -> Self
    where
        F: FnMut(NotificationEvent) + Send + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        let live = Arc::clone(&active);
        let task = tokio::spawn(async move {
            loop {
                let received = receiver.recv().await;
                // Buffered events must not reach the callback after release
                if !live.load(Ordering::SeqCst) {
                    break;
                }
                match received {
                    Ok(event) => on_event(event),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!("Notification subscriber lagged, {} events dropped", missed);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Self {
            task: Some(task),
            active,
        }
    }

    /// Release the subscription; the callback will not run again
    pub fn remove(mut self) {
        self.release();
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
            && self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn release(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

/// Scheduling façade
#[derive(Clone)]
pub struct NotificationScheduler {
    backend: Arc<dyn NotificationBackend>,
}

impl NotificationScheduler {
    pub fn new(backend: Arc<dyn NotificationBackend>) -> Self {
        Self { backend }
    }

    /// Ask for notification permission, prompting if it was never asked
    pub async fn ensure_permission(&self) -> Result<PermissionGrant> {
        let mut status = self.backend.permission_status().await?;
        if status == PermissionStatus::Undetermined {
            tracing::info!("Requesting notification permission");
            status = self.backend.request_permission().await?;
        }

        match status {
            PermissionStatus::Granted => Ok(PermissionGrant { _private: () }),
            _ => {
                tracing::warn!("Notification permission not granted: {:?}", status);
                Err(AppError::PermissionDenied)
            }
        }
    }

    /// Deliver after the short fixed delay
    pub async fn schedule_immediate(
        &self,
        grant: &PermissionGrant,
        payload: Payload,
    ) -> Result<ScheduledHandle> {
        self.schedule_one(grant, ScheduleKind::immediate(), payload).await
    }

    /// Deliver every day at `hour:minute`, until cancelled
    pub async fn schedule_daily_at(
        &self,
        grant: &PermissionGrant,
        hour: u32,
        minute: u32,
        payload: Payload,
    ) -> Result<ScheduledHandle> {
        self.schedule_one(grant, ScheduleKind::DailyAt { hour, minute }, payload)
            .await
    }

    /// Deliver every `interval_seconds`, until cancelled
    pub async fn schedule_recurring(
        &self,
        grant: &PermissionGrant,
        interval_seconds: u64,
        payload: Payload,
    ) -> Result<ScheduledHandle> {
        self.schedule_one(
            grant,
            ScheduleKind::RecurringInterval { interval_seconds },
            payload,
        )
        .await
    }

    /// One daily request per fire time of the `[start_hour, end_hour]` window.
    ///
    /// Sub-requests are independent: a failure is reported in its slot and
    /// does not roll back the others.
    pub async fn schedule_windowed(
        &self,
        grant: &PermissionGrant,
        interval_seconds: u64,
        start_hour: u32,
        end_hour: u32,
        payload: Payload,
    ) -> Vec<Result<ScheduledHandle>> {
        let request = ScheduleRequest {
            kind: ScheduleKind::WindowedRecurring {
                interval_seconds,
                start_hour,
                end_hour,
            },
            payload,
        };
        self.schedule(grant, request).await
    }

    /// Schedule any request, returning one outcome per backend request issued
    pub async fn schedule(
        &self,
        _grant: &PermissionGrant,
        request: ScheduleRequest,
    ) -> Vec<Result<ScheduledHandle>> {
        let triggers = match request.kind.triggers() {
            Ok(triggers) => triggers,
            Err(e) => {
                tracing::warn!("Rejected reminder request {:?}: {}", request.kind, e);
                return vec![Err(e)];
            }
        };

        let mut outcomes = Vec::with_capacity(triggers.len());
        for trigger in triggers {
            let outcome = self.backend.schedule(request.payload.clone(), trigger).await;
            match &outcome {
                Ok(handle) => tracing::info!("Scheduled {} with {:?}", handle, trigger),
                Err(e) => tracing::error!("Failed to schedule {:?}: {}", trigger, e),
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn schedule_one(
        &self,
        grant: &PermissionGrant,
        kind: ScheduleKind,
        payload: Payload,
    ) -> Result<ScheduledHandle> {
        self.schedule(grant, ScheduleRequest { kind, payload })
            .await
            .pop()
            .unwrap_or_else(|| Err(AppError::Scheduler("no request issued".to_string())))
    }

    /// Remove every pending request. Delivered history is untouched.
    pub async fn cancel_all(&self) -> Result<()> {
        self.backend.cancel_all().await?;
        tracing::info!("All scheduled notifications cancelled");
        Ok(())
    }

    /// Requests still waiting to fire, in backend order
    pub async fn list_pending(&self) -> Result<Vec<PendingRequest>> {
        self.backend.pending().await
    }

    /// Raw event stream
    pub fn events(&self) -> broadcast::Receiver<NotificationEvent> {
        self.backend.subscribe()
    }

    /// Run `callback` for each delivered notification while the subscription lives
    pub fn on_delivered<F>(&self, mut callback: F) -> Subscription
    where
        F: FnMut(DeliveredNotification) + Send + 'static,
    {
        Subscription::spawn(self.backend.subscribe(), move |event| {
            if let NotificationEvent::Delivered(delivered) = event {
                callback(delivered);
            }
        })
    }

    /// Run `callback` each time the user acts on a notification while the subscription lives
    pub fn on_user_interaction<F>(&self, mut callback: F) -> Subscription
    where
        F: FnMut(UserInteraction) + Send + 'static,
    {
        Subscription::spawn(self.backend.subscribe(), move |event| {
            if let NotificationEvent::Interacted(interaction) = event {
                callback(interaction);
            }
        })
    }
}
