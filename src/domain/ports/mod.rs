use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::models::{
    ActionType, Event, GlobalConfig, Notification, PermissionState, StoreChange, Student,
};
use crate::error::AppError;

/// Boundary to the host's data store. The store owns students, events and
/// config; the engine reads them, writes lifecycle results back, and listens
/// for typed change events. Persistence is entirely the adapter's concern.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn list_students(&self) -> Result<Vec<Student>, AppError>;
    async fn find_student(&self, id: &str) -> Result<Option<Student>, AppError>;
    async fn upsert_student(&self, student: &Student) -> Result<(), AppError>;
    async fn remove_student(&self, id: &str) -> Result<(), AppError>;

    /// All events, soft-deleted ones included. Callers that want the visible
    /// agenda filter on `deleted` themselves.
    async fn list_events(&self) -> Result<Vec<Event>, AppError>;
    async fn find_event(&self, id: &str) -> Result<Option<Event>, AppError>;
    async fn insert_event(&self, event: &Event) -> Result<(), AppError>;
    async fn update_event(&self, event: &Event) -> Result<(), AppError>;
    /// Hard-removes a manual event; soft-deletes a generated one so the
    /// generator does not immediately recreate the slot.
    async fn remove_event(&self, id: &str) -> Result<(), AppError>;
    /// Wholesale swap of the event collection, emitting per-entity changes
    /// for the difference. Used by reconciliation passes.
    async fn replace_events(&self, events: Vec<Event>) -> Result<(), AppError>;

    async fn config(&self) -> Result<GlobalConfig, AppError>;
    async fn update_config(&self, config: &GlobalConfig) -> Result<(), AppError>;

    /// Factory for a blank event record with a fresh id.
    fn new_event(&self) -> Event;

    fn subscribe(&self) -> mpsc::UnboundedReceiver<StoreChange>;
}

/// Boundary to the platform's local-notification service.
#[async_trait]
pub trait NotificationPlatform: Send + Sync {
    /// Silent permission query, never prompts.
    async fn check_permissions(&self) -> Result<PermissionState, AppError>;
    /// May prompt the user.
    async fn request_permissions(&self) -> Result<PermissionState, AppError>;
    async fn schedule(&self, notifications: Vec<Notification>) -> Result<(), AppError>;
    async fn cancel(&self, ids: Vec<u32>) -> Result<(), AppError>;
    /// Ids of currently pending (not yet fired) notifications.
    async fn pending(&self) -> Result<Vec<u32>, AppError>;
    async fn remove_all_delivered(&self) -> Result<(), AppError>;
    async fn register_action_types(&self, types: Vec<ActionType>) -> Result<(), AppError>;
}
