use super::event::Event;
use super::settings::GlobalConfig;
use super::student::Student;

/// Event fields the engine reacts to. Everything else lands in `Other`, which
/// deliberately triggers nothing: free-text edits must not churn notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventField {
    IdStudent,
    StudentName,
    Date,
    Time,
    Duration,
    MinutesBefore,
    Status,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentField {
    Name,
    StudentPhone,
    ParentPhone,
    Dob,
    Paused,
    WeeklySchedule,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    NotifyBirthday,
    NotifyBirthdayDayBefore,
    /// Any of the agenda switches: generation, auto-finish, horizon, removal.
    Agenda,
    /// Billing/notification policy defaults.
    Policy,
    Other,
}

/// Typed change events emitted by the store. The engine subscribes to these
/// instead of diffing snapshots of the whole data set.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    EventAdded { id: String },
    EventRemoved { id: String },
    EventChanged { id: String, fields: Vec<EventField> },
    StudentAdded { id: String },
    StudentRemoved { id: String },
    StudentChanged { id: String, fields: Vec<StudentField> },
    ConfigChanged { fields: Vec<ConfigField> },
}

pub fn event_changes(old: &Event, new: &Event) -> Vec<EventField> {
    let mut fields = Vec::new();
    if old.id_student != new.id_student {
        fields.push(EventField::IdStudent);
    }
    if old.student_name != new.student_name {
        fields.push(EventField::StudentName);
    }
    if old.date != new.date {
        fields.push(EventField::Date);
    }
    if old.time != new.time {
        fields.push(EventField::Time);
    }
    if old.policy.duration != new.policy.duration {
        fields.push(EventField::Duration);
    }
    if old.policy.minutes_before != new.policy.minutes_before {
        fields.push(EventField::MinutesBefore);
    }
    if old.status != new.status {
        fields.push(EventField::Status);
    }
    if fields.is_empty() && old != new {
        fields.push(EventField::Other);
    }
    fields
}

pub fn student_changes(old: &Student, new: &Student) -> Vec<StudentField> {
    let mut fields = Vec::new();
    if old.student_name != new.student_name {
        fields.push(StudentField::Name);
    }
    if old.student_phone != new.student_phone {
        fields.push(StudentField::StudentPhone);
    }
    if old.parent_phone != new.parent_phone {
        fields.push(StudentField::ParentPhone);
    }
    if old.dob != new.dob {
        fields.push(StudentField::Dob);
    }
    if old.paused != new.paused {
        fields.push(StudentField::Paused);
    }
    if old.weekly_schedule != new.weekly_schedule {
        fields.push(StudentField::WeeklySchedule);
    }
    if fields.is_empty() && old != new {
        fields.push(StudentField::Other);
    }
    fields
}

pub fn config_changes(old: &GlobalConfig, new: &GlobalConfig) -> Vec<ConfigField> {
    let mut fields = Vec::new();
    if old.notify_birthday != new.notify_birthday {
        fields.push(ConfigField::NotifyBirthday);
    }
    if old.notify_birthday_day_before != new.notify_birthday_day_before {
        fields.push(ConfigField::NotifyBirthdayDayBefore);
    }
    if old.auto_create_events != new.auto_create_events
        || old.auto_finish_events != new.auto_finish_events
        || old.auto_finish_offset != new.auto_finish_offset
        || old.auto_remove_past_events != new.auto_remove_past_events
        || old.number_of_days != new.number_of_days
        || old.removal_grace_hours != new.removal_grace_hours
    {
        fields.push(ConfigField::Agenda);
    }
    if old.cost != new.cost
        || old.duration != new.duration
        || old.variable_cost != new.variable_cost
        || old.charge_cancelation != new.charge_cancelation
        || old.free_cancelation_before != new.free_cancelation_before
        || old.cancelation_fee != new.cancelation_fee
        || old.minutes_before != new.minutes_before
    {
        fields.push(ConfigField::Policy);
    }
    if fields.is_empty() && old != new {
        fields.push(ConfigField::Other);
    }
    fields
}
