//! In-process backend built on tokio-cron-scheduler
//!
//! Daily triggers become cron jobs evaluated in the local time zone,
//! interval triggers become one-shot or repeated jobs.

use super::NotificationBackend;
use crate::config::EVENT_CHANNEL_CAPACITY;
use crate::error::{AppError, Result};
use crate::models::{
    DeliveredNotification, NotificationEvent, Payload, PendingRequest, PermissionStatus,
    ScheduledHandle, Trigger, UserInteraction,
};
use async_trait::async_trait;
use chrono::Local;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

type Queue = Arc<Mutex<Vec<(Uuid, PendingRequest)>>>;

/// Remove every queued job, dropping an entry only once its job is gone.
/// Jobs whose removal fails stay queued and can still fire.
async fn cancel_queued<F, Fut, E>(queue: &Queue, mut remove: F) -> Result<()>
where
    F: FnMut(Uuid) -> Fut,
    Fut: Future<Output = std::result::Result<(), E>>,
    E: std::fmt::Display,
{
    let jobs: Vec<Uuid> = queue.lock().iter().map(|(id, _)| *id).collect();

    let mut first_error = None;
    for job_id in jobs {
        match remove(job_id).await {
            Ok(()) => {
                queue.lock().retain(|(id, _)| *id != job_id);
            }
            Err(e) => {
                tracing::error!("Failed to remove notification job {}: {}", job_id, e);
                first_error.get_or_insert_with(|| e.to_string());
            }
        }
    }

    match first_error {
        Some(e) => Err(AppError::BackendUnavailable(format!(
            "Failed to cancel notifications: {}",
            e
        ))),
        None => Ok(()),
    }
}

/// Cron expression firing every day at `hour:minute`
fn daily_cron(hour: u32, minute: u32) -> String {
    format!("0 {} {} * * *", minute, hour)
}

/// Backend that fires notifications from a local job scheduler
pub struct CronBackend {
    scheduler: Arc<RwLock<JobScheduler>>,
    queue: Queue,
    events: broadcast::Sender<NotificationEvent>,
}

impl CronBackend {
    /// Create and start the job scheduler
    pub async fn new() -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to create scheduler: {}", e)))?;
        scheduler
            .start()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to start scheduler: {}", e)))?;
        tracing::info!("Notification scheduler started");

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            scheduler: Arc::new(RwLock::new(scheduler)),
            queue: Arc::new(Mutex::new(Vec::new())),
            events,
        })
    }

    /// Stop every job and the scheduler itself
    pub async fn shutdown(&self) -> Result<()> {
        let mut scheduler = self.scheduler.write().await;
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to shutdown scheduler: {}", e)))?;
        self.queue.lock().clear();
        tracing::info!("Notification scheduler shutdown");
        Ok(())
    }

    /// Job body publishing a delivered event
    fn deliver(
        &self,
        handle: ScheduledHandle,
        content: Payload,
        one_shot: bool,
    ) -> impl FnMut(Uuid, JobScheduler) -> Pin<Box<dyn Future<Output = ()> + Send>>
           + Send
           + Sync
           + 'static {
        let events = self.events.clone();
        let queue = Arc::clone(&self.queue);

        move |_job_id, _scheduler| {
            let events = events.clone();
            let queue = Arc::clone(&queue);
            let handle = handle.clone();
            let content = content.clone();

            Box::pin(async move {
                if one_shot {
                    queue.lock().retain(|(_, request)| request.handle != handle);
                }
                tracing::info!("Delivering notification {}", handle);
                let _ = events.send(NotificationEvent::Delivered(DeliveredNotification {
                    handle,
                    content,
                    delivered_at: Local::now(),
                }));
            })
        }
    }

    fn build_job(&self, handle: &ScheduledHandle, content: &Payload, trigger: Trigger) -> Result<Job> {
        let job = match trigger {
            Trigger::TimeInterval {
                seconds,
                repeats: false,
            } => Job::new_one_shot_async(
                Duration::from_secs(seconds),
                self.deliver(handle.clone(), content.clone(), true),
            ),
            Trigger::TimeInterval {
                seconds,
                repeats: true,
            } => {
                if seconds == 0 {
                    return Err(AppError::InvalidInterval(seconds));
                }
                Job::new_repeated_async(
                    Duration::from_secs(seconds),
                    self.deliver(handle.clone(), content.clone(), false),
                )
            }
            Trigger::Daily { hour, minute } => Job::new_async_tz(
                daily_cron(hour, minute),
                Local,
                self.deliver(handle.clone(), content.clone(), false),
            ),
        };

        job.map_err(|e| AppError::Scheduler(format!("Failed to create notification job: {}", e)))
    }
}

#[async_trait]
impl NotificationBackend for CronBackend {
    async fn permission_status(&self) -> Result<PermissionStatus> {
        Ok(PermissionStatus::Granted)
    }

    async fn request_permission(&self) -> Result<PermissionStatus> {
        Ok(PermissionStatus::Granted)
    }

    async fn schedule(&self, content: Payload, trigger: Trigger) -> Result<ScheduledHandle> {
        let handle = ScheduledHandle::new();
        let job = self.build_job(&handle, &content, trigger)?;
        let job_id = job.guid();

        self.queue.lock().push((
            job_id,
            PendingRequest {
                handle: handle.clone(),
                content,
                trigger,
            },
        ));

        let scheduler = self.scheduler.read().await;
        if let Err(e) = scheduler.add(job).await {
            self.queue.lock().retain(|(id, _)| *id != job_id);
            return Err(AppError::BackendUnavailable(format!(
                "Failed to schedule notification: {}",
                e
            )));
        }

        tracing::debug!("Scheduled notification {} ({:?})", handle, trigger);
        Ok(handle)
    }

    async fn cancel_all(&self) -> Result<()> {
        let guard = self.scheduler.read().await;
        let scheduler = &*guard;
        cancel_queued(&self.queue, move |job_id| async move {
            scheduler.remove(&job_id).await
        })
        .await
    }

    async fn pending(&self) -> Result<Vec<PendingRequest>> {
        Ok(self
            .queue
            .lock()
            .iter()
            .map(|(_, request)| request.clone())
            .collect())
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

    #[test]
    fn test_daily_cron_expression() {
        assert_eq!(daily_cron(9, 0), "0 0 9 * * *");
        assert_eq!(daily_cron(22, 45), "0 45 22 * * *");
    }

    fn queued(trigger: Trigger) -> (Uuid, PendingRequest) {
        (
            Uuid::new_v4(),
            PendingRequest {
                handle: ScheduledHandle::new(),
                content: Payload::new("t", "b"),
                trigger,
            },
        )
    }

    #[tokio::test]
    async fn test_failed_removal_stays_pending() {
        let queue: Queue = Arc::new(Mutex::new(vec![
            queued(Trigger::Daily { hour: 8, minute: 0 }),
            queued(Trigger::Daily { hour: 10, minute: 0 }),
            queued(Trigger::Daily { hour: 12, minute: 0 }),
        ]));
        let stuck = queue.lock()[1].0;

        let result = cancel_queued(&queue, |job_id| {
            std::future::ready(if job_id == stuck { Err("job locked") } else { Ok(()) })
        })
        .await;

        assert!(matches!(result, Err(AppError::BackendUnavailable(_))));
        let left = queue.lock();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].0, stuck);
        assert_eq!(left[0].1.trigger, Trigger::Daily { hour: 10, minute: 0 });
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_pending_and_cancel_all() {
        let backend = CronBackend::new().await.unwrap();

        backend
            .schedule(Payload::new("t", "b"), Trigger::Daily { hour: 9, minute: 0 })
            .await
            .unwrap();
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
        assert_eq!(backend.pending().await.unwrap().len(), 2);

        backend.cancel_all().await.unwrap();
        assert!(backend.pending().await.unwrap().is_empty());

        backend.shutdown().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_one_shot_fires_and_leaves_queue() {
        let backend = CronBackend::new().await.unwrap();
        let mut events = backend.subscribe();

        let handle = backend
            .schedule(
                Payload::new("t", "b"),
                Trigger::TimeInterval {
                    seconds: 1,
                    repeats: false,
                },
            )
            .await
            .unwrap();

        let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
            .await
            .unwrap()
            .unwrap();
        match event {
            NotificationEvent::Delivered(delivered) => assert_eq!(delivered.handle, handle),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(backend.pending().await.unwrap().is_empty());

        backend.shutdown().await.unwrap();
    }
}
