pub mod change;
pub mod event;
pub mod notification;
pub mod settings;
pub mod student;

pub use change::{
    config_changes, event_changes, student_changes, ConfigField, EventField, StoreChange,
    StudentField,
};
pub use event::{Event, EventStatus};
pub use notification::{
    ActionType, DirtyItem, Notification, NotificationAction, NotificationExtra,
    NotificationSchedule, PermissionState,
};
pub use settings::{FlagKey, GlobalConfig, NumberKey, PolicyOverrides, Setting};
pub use student::{Student, WeeklySlot};
