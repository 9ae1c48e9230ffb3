use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::settings::PolicyOverrides;
use crate::domain::time;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Freshly created, not yet saved with a status.
    #[default]
    Unset,
    Scheduled,
    Done,
    Canceled,
}

/// A concrete lesson instance, either synthesized from a weekly template or
/// created by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id_event: String,
    pub id_student: String,
    pub student_name: String,
    pub subject: String,
    /// Current start, local "YYYY-MM-DD" / "HH:MM".
    pub date: String,
    pub time: String,
    pub date_end: String,
    pub time_end: String,
    /// Canonical recurrence slot this instance was generated for. Stays fixed
    /// when the user reschedules the lesson.
    pub original_date: String,
    pub original_time: String,
    pub status: EventStatus,
    pub canceled_at: Option<NaiveDateTime>,
    pub added_manually: bool,
    /// Soft-delete, used for generated events only: a hard-deleted slot would
    /// be recreated on the next reconcile pass.
    pub deleted: bool,
    /// Trial lesson, never billed.
    pub experimental: bool,
    pub rescheduled: bool,
    /// Idempotence key `student::originalDate::originalTime`. `None` on
    /// legacy records.
    pub gen_key: Option<String>,
    pub obs: String,
    pub added_on: DateTime<Utc>,
    #[serde(flatten)]
    pub policy: PolicyOverrides,
}

impl Event {
    pub fn new() -> Self {
        Self {
            id_event: format!("event_{}", Uuid::new_v4()),
            id_student: String::new(),
            student_name: String::new(),
            subject: String::new(),
            date: String::new(),
            time: String::new(),
            date_end: String::new(),
            time_end: String::new(),
            original_date: String::new(),
            original_time: String::new(),
            status: EventStatus::Unset,
            canceled_at: None,
            added_manually: true,
            deleted: false,
            experimental: false,
            rescheduled: false,
            gen_key: None,
            obs: String::new(),
            added_on: Utc::now(),
            policy: PolicyOverrides::default(),
        }
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        time::parse_date(&self.date, &self.time)
    }

    pub fn gen_key_for(student_id: &str, date: &str, time: &str) -> String {
        format!("{}::{}::{}", student_id, date, time)
    }

    /// Recurrence key derived from the canonical slot, falling back to the
    /// current slot when no anchor was recorded.
    pub fn derived_gen_key(&self) -> String {
        let date = if self.original_date.is_empty() {
            &self.date
        } else {
            &self.original_date
        };
        let time = if self.original_time.is_empty() {
            &self.time
        } else {
            &self.original_time
        };
        Self::gen_key_for(&self.id_student, date, time)
    }

    /// Stored key if present, derived otherwise. Used for duplicate checks;
    /// the stored key alone decides removal eligibility.
    pub fn effective_gen_key(&self) -> String {
        self.gen_key.clone().unwrap_or_else(|| self.derived_gen_key())
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}
