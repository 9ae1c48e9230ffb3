use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::settings::PolicyOverrides;

/// One weekly recurrence template slot. `week_day` uses Sunday = 0 .. Saturday = 6;
/// `None` (not zero) marks a slot the user has not filled in yet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklySlot {
    pub week_day: Option<u8>,
    /// "HH:MM", empty when unset.
    pub time_day: String,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id_student: String,
    pub student_name: String,
    pub student_phone: String,
    pub parent_phone: String,
    pub address: String,
    /// "YYYY-MM-DD", empty when unknown.
    pub dob: String,
    pub paused: bool,
    pub weekly_schedule: Vec<WeeklySlot>,
    pub obs: String,
    pub added_on: DateTime<Utc>,
    #[serde(flatten)]
    pub policy: PolicyOverrides,
}

impl Student {
    pub fn new(name: &str) -> Self {
        Self {
            id_student: format!("student_{}", Uuid::new_v4()),
            student_name: name.to_string(),
            student_phone: String::new(),
            parent_phone: String::new(),
            address: String::new(),
            dob: String::new(),
            paused: false,
            weekly_schedule: Vec::new(),
            obs: String::new(),
            added_on: Utc::now(),
            policy: PolicyOverrides::default(),
        }
    }
}
