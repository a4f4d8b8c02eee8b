//! Notification backends
//!
//! The host notification subsystem the scheduler façade delegates to.
//! Platform-specific notification adapters implement this trait.

mod cron;
mod memory;

pub use cron::CronBackend;
pub use memory::MemoryBackend;

use crate::error::Result;
use crate::models::{
    NotificationEvent, Payload, PendingRequest, PermissionStatus, ScheduledHandle, Trigger,
};
use async_trait::async_trait;
use tokio::sync::broadcast;

#[async_trait]
pub trait NotificationBackend: Send + Sync {
    /// Current permission, without prompting
    async fn permission_status(&self) -> Result<PermissionStatus>;

    /// Prompt for permission if it is still undetermined
    async fn request_permission(&self) -> Result<PermissionStatus>;

    /// Queue one request
    async fn schedule(&self, content: Payload, trigger: Trigger) -> Result<ScheduledHandle>;

    /// Drop every request this application queued
    async fn cancel_all(&self) -> Result<()>;

    /// Requests still waiting to fire, in backend order
    async fn pending(&self) -> Result<Vec<PendingRequest>>;

    /// Report that the user acted on a delivered notification
    async fn respond(&self, handle: &ScheduledHandle, action: &str) -> Result<()>;

    /// Event stream of deliveries and user interactions
    fn subscribe(&self) -> broadcast::Receiver<NotificationEvent>;
}
