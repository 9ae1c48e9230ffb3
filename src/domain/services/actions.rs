use crate::domain::models::{ActionType, Notification, NotificationAction};
use crate::domain::services::reminders::EVENT_ACTION_TYPE;

/// Action buttons registered with the platform for lesson reminders.
pub fn action_types() -> Vec<ActionType> {
    vec![ActionType {
        id: EVENT_ACTION_TYPE.to_string(),
        actions: vec![
            NotificationAction {
                id: "details".to_string(),
                title: "Edit".to_string(),
            },
            NotificationAction {
                id: "maps".to_string(),
                title: "Navigate".to_string(),
            },
            NotificationAction {
                id: "whatsapp".to_string(),
                title: "WhatsApp".to_string(),
            },
        ],
    }]
}

/// What the host should do in response to a notification action. Navigation
/// itself is the host's job; the engine only resolves the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineAction {
    OpenAgenda,
    OpenEvent(String),
    OpenUrl(String),
}

pub fn resolve_action(action_id: &str, notification: &Notification) -> Option<EngineAction> {
    match action_id {
        "tap" => Some(EngineAction::OpenAgenda),
        "details" => notification
            .extra
            .event_id
            .clone()
            .map(EngineAction::OpenEvent),
        "maps" => notification.extra.maps.clone().map(EngineAction::OpenUrl),
        "whatsapp" => notification
            .extra
            .whatsapp
            .clone()
            .map(EngineAction::OpenUrl),
        _ => None,
    }
}
