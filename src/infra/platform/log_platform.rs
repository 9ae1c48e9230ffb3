use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::models::{ActionType, Notification, PermissionState};
use crate::domain::ports::NotificationPlatform;
use crate::error::AppError;

/// Notification adapter for hosts without a native notification service.
/// Tracks the pending-id set in memory and logs every operation; nothing is
/// ever actually displayed.
pub struct LogNotificationPlatform {
    permission: Mutex<PermissionState>,
    pending: Mutex<HashSet<u32>>,
}

impl LogNotificationPlatform {
    pub fn new() -> Self {
        Self::with_permission(PermissionState::Prompt)
    }

    pub fn with_permission(permission: PermissionState) -> Self {
        Self {
            permission: Mutex::new(permission),
            pending: Mutex::new(HashSet::new()),
        }
    }
}

impl Default for LogNotificationPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationPlatform for LogNotificationPlatform {
    async fn check_permissions(&self) -> Result<PermissionState, AppError> {
        Ok(*self.permission.lock().unwrap())
    }

    async fn request_permissions(&self) -> Result<PermissionState, AppError> {
        let mut permission = self.permission.lock().unwrap();
        if *permission == PermissionState::Prompt {
            *permission = PermissionState::Granted;
        }
        Ok(*permission)
    }

    async fn schedule(&self, notifications: Vec<Notification>) -> Result<(), AppError> {
        let mut pending = self.pending.lock().unwrap();
        for n in &notifications {
            debug!(id = n.id, at = %n.schedule.at, title = %n.title, "notification scheduled");
            pending.insert(n.id);
        }
        info!(count = notifications.len(), "notification batch accepted");
        Ok(())
    }

    async fn cancel(&self, ids: Vec<u32>) -> Result<(), AppError> {
        let mut pending = self.pending.lock().unwrap();
        for id in ids {
            pending.remove(&id);
            debug!(id, "notification canceled");
        }
        Ok(())
    }

    async fn pending(&self) -> Result<Vec<u32>, AppError> {
        Ok(self.pending.lock().unwrap().iter().copied().collect())
    }

    async fn remove_all_delivered(&self) -> Result<(), AppError> {
        debug!("delivered notifications cleared");
        Ok(())
    }

    async fn register_action_types(&self, types: Vec<ActionType>) -> Result<(), AppError> {
        info!(count = types.len(), "notification action types registered");
        Ok(())
    }
}
