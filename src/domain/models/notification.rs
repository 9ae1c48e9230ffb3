use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Platform notification record. `id` is a stable numeric hash of the owning
/// entity's id so the same entity always maps to the same platform slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u32,
    pub title: String,
    pub body: String,
    pub schedule: NotificationSchedule,
    pub extra: NotificationExtra,
    pub action_type_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NotificationSchedule {
    pub at: NaiveDateTime,
    pub allow_while_idle: bool,
}

/// Deep-link payload carried to the platform and back through action callbacks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationExtra {
    pub event_id: Option<String>,
    pub student_id: Option<String>,
    pub whatsapp: Option<String>,
    pub maps: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionType {
    pub id: String,
    pub actions: Vec<NotificationAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    /// Not decided yet; the platform would show a prompt on request.
    Prompt,
}

/// A pending notification-recompute unit. The enum doubles as the dedup key:
/// repeated marks of the same entity collapse in a set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DirtyItem {
    Event(String),
    Birthday(String),
}
