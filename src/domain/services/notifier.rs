use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::domain::models::{Notification, PermissionState};
use crate::domain::ports::NotificationPlatform;
use crate::domain::services::reminders;

/// Thin stateful wrapper over the platform notification service: caches the
/// permission decision, maps entity ids to platform slots and keeps platform
/// failures from propagating into the engine.
pub struct NotificationScheduler {
    platform: Arc<dyn NotificationPlatform>,
    permission_granted: AtomicBool,
}

impl NotificationScheduler {
    pub fn new(platform: Arc<dyn NotificationPlatform>) -> Self {
        Self {
            platform,
            permission_granted: AtomicBool::new(false),
        }
    }

    /// Last known permission state, without touching the platform.
    pub fn permission_granted(&self) -> bool {
        self.permission_granted.load(Ordering::Relaxed)
    }

    /// Silent query; refreshes the cache.
    pub async fn check_permission(&self) -> bool {
        let granted = match self.platform.check_permissions().await {
            Ok(state) => state == PermissionState::Granted,
            Err(err) => {
                error!(%err, "notification permission check failed");
                false
            }
        };
        self.permission_granted.store(granted, Ordering::Relaxed);
        granted
    }

    /// Prompts the user; refreshes the cache.
    pub async fn request_permission(&self) -> bool {
        let granted = match self.platform.request_permissions().await {
            Ok(state) => state == PermissionState::Granted,
            Err(err) => {
                error!(%err, "notification permission request failed");
                false
            }
        };
        self.permission_granted.store(granted, Ordering::Relaxed);
        granted
    }

    /// Opportunistic permission acquisition: silent check first, prompt only
    /// when that comes back negative.
    pub async fn ensure_permission(&self) -> bool {
        if self.check_permission().await {
            return true;
        }
        self.request_permission().await
    }

    /// Schedules a batch. A missing permission makes this a logged no-op; it
    /// never prompts on its own.
    pub async fn schedule(&self, notifications: Vec<Notification>) {
        if !self.check_permission().await {
            debug!("notification permission not granted, skipping schedule");
            return;
        }
        if notifications.is_empty() {
            debug!("no notifications to schedule");
            return;
        }
        let count = notifications.len();
        match self.platform.schedule(notifications).await {
            Ok(()) => info!(count, "scheduled notifications"),
            Err(err) => error!(%err, "failed to schedule notifications"),
        }
    }

    /// Cancels the slot owned by an entity, whichever notification occupies it.
    pub async fn cancel_for_entity(&self, entity_id: &str) {
        let id = reminders::numeric_id(entity_id);
        match self.platform.cancel(vec![id]).await {
            Ok(()) => debug!(id, entity_id, "canceled notification"),
            Err(err) => error!(%err, entity_id, "failed to cancel notification"),
        }
    }

    pub async fn cancel_pending(&self) {
        match self.platform.pending().await {
            Ok(ids) if ids.is_empty() => debug!("no pending notifications to cancel"),
            Ok(ids) => {
                let count = ids.len();
                match self.platform.cancel(ids).await {
                    Ok(()) => info!(count, "canceled pending notifications"),
                    Err(err) => error!(%err, "failed to cancel pending notifications"),
                }
            }
            Err(err) => error!(%err, "failed to list pending notifications"),
        }
    }

    pub async fn remove_delivered(&self) {
        if let Err(err) = self.platform.remove_all_delivered().await {
            error!(%err, "failed to remove delivered notifications");
        }
    }

    /// Cancels everything pending and clears everything delivered.
    pub async fn remove_all(&self) {
        self.cancel_pending().await;
        self.remove_delivered().await;
    }
}
