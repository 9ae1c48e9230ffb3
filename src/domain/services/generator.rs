use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use crate::domain::models::{
    Event, EventStatus, FlagKey, GlobalConfig, NumberKey, Student, WeeklySlot,
};
use crate::domain::ports::DataStore;
use crate::domain::services::policy;
use crate::domain::time;
use crate::error::AppError;
use crate::timer::Debounce;

/// Expands weekly recurrence templates into concrete lesson instances over a
/// rolling horizon, idempotently, and runs the companion removal passes.
///
/// Reconciliation reads the full event collection, computes the replacement
/// set and swaps it wholesale; it assumes the host does not mutate the store
/// while a pass is running.
pub struct EventGenerator {
    inner: Arc<GeneratorInner>,
    debounce: Debounce,
}

struct GeneratorInner {
    store: Arc<dyn DataStore>,
}

impl EventGenerator {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self {
            inner: Arc::new(GeneratorInner { store }),
            debounce: Debounce::new(),
        }
    }

    /// Full reconciliation pass over every student.
    pub async fn generate(&self) -> Result<(), AppError> {
        self.inner.generate().await
    }

    /// Differential pass touching only one student's events; other students'
    /// instances are left byte-for-byte alone.
    pub async fn generate_for_student(&self, id_student: &str) -> Result<(), AppError> {
        self.inner.generate_for_student(id_student).await
    }

    /// Drops every scheduled event owned by a paused student. Done and
    /// canceled history is preserved.
    pub async fn remove_scheduled_for_paused(&self) -> Result<(), AppError> {
        self.inner.remove_scheduled_for_paused().await
    }

    /// Single-student purge used when a student changes: scheduled generated
    /// events go, manual ones and history stay.
    pub async fn remove_scheduled_for_student(&self, id_student: &str) -> Result<(), AppError> {
        self.inner.remove_scheduled_for_student(id_student).await
    }

    /// Removes scheduled, non-manual events whose finish threshold is past
    /// the removal grace.
    pub async fn strip_overdue_past(&self) -> Result<(), AppError> {
        self.inner.strip_overdue_past().await
    }

    /// Debounced full pass: generation followed by past-event cleanup.
    pub fn schedule_generate(&self, delay: Duration) {
        let inner = Arc::clone(&self.inner);
        self.debounce.arm(delay, async move {
            if let Err(err) = inner.generate().await {
                warn!(%err, "event generation failed");
            }
            if let Err(err) = inner.strip_overdue_past().await {
                warn!(%err, "past-event cleanup failed");
            }
        });
    }

    pub fn stop(&self) {
        self.debounce.cancel();
    }
}

impl GeneratorInner {
    async fn generate(&self) -> Result<(), AppError> {
        let config = self.store.config().await?;
        if !config.auto_create_events {
            return Ok(());
        }
        let students = self.store.list_students().await?;
        if students.is_empty() {
            return Ok(());
        }

        let mut events = self.store.list_events().await?;
        let window = date_window(time::today(), config.number_of_days);
        let now = time::now();

        // Keys of every existing event, soft-deleted ones included: a deleted
        // slot must keep suppressing regeneration.
        let mut existing: HashSet<String> =
            events.iter().map(Event::effective_gen_key).collect();
        let mut valid_keys = HashSet::new();
        let mut created = 0usize;

        for student in students
            .iter()
            .filter(|s| !s.paused && !s.weekly_schedule.is_empty())
        {
            for slot in &student.weekly_schedule {
                let Some(week_day) = slot.week_day else { continue };
                if slot.time_day.is_empty() {
                    continue;
                }
                for (date, day) in &window {
                    if *day != week_day {
                        continue;
                    }
                    let key = Event::gen_key_for(&student.id_student, date, &slot.time_day);
                    valid_keys.insert(key.clone());
                    if existing.contains(&key) {
                        continue;
                    }
                    events.push(self.materialize(student, date, slot, &config));
                    existing.insert(key);
                    created += 1;
                }
            }
        }

        let before = events.len();
        events.retain(|e| retain_in_window(e, &valid_keys, now));
        let removed = before - events.len();

        if created > 0 || removed > 0 {
            info!(created, removed, "agenda reconciled");
            self.store.replace_events(events).await?;
        }
        Ok(())
    }

    async fn generate_for_student(&self, id_student: &str) -> Result<(), AppError> {
        let config = self.store.config().await?;
        if !config.auto_create_events || id_student.is_empty() {
            return Ok(());
        }
        let Some(student) = self.store.find_student(id_student).await? else {
            return Ok(());
        };
        if student.paused {
            return Ok(());
        }

        let mut events = self.store.list_events().await?;
        let window = date_window(time::today(), config.number_of_days);
        let now = time::now();

        let mut existing: HashSet<String> =
            events.iter().map(Event::effective_gen_key).collect();
        let mut valid_keys = HashSet::new();
        let mut created = 0usize;

        for slot in &student.weekly_schedule {
            let Some(week_day) = slot.week_day else { continue };
            if slot.time_day.is_empty() {
                continue;
            }
            for (date, day) in &window {
                if *day != week_day {
                    continue;
                }
                let key = Event::gen_key_for(&student.id_student, date, &slot.time_day);
                valid_keys.insert(key.clone());
                if existing.contains(&key) {
                    continue;
                }
                events.push(self.materialize(&student, date, slot, &config));
                existing.insert(key);
                created += 1;
            }
        }

        let before = events.len();
        events.retain(|e| e.id_student != id_student || retain_in_window(e, &valid_keys, now));
        let removed = before - events.len();

        if created > 0 || removed > 0 {
            info!(id_student, created, removed, "agenda reconciled for student");
            self.store.replace_events(events).await?;
        }
        Ok(())
    }

    async fn remove_scheduled_for_paused(&self) -> Result<(), AppError> {
        let students = self.store.list_students().await?;
        let paused: HashSet<&str> = students
            .iter()
            .filter(|s| s.paused)
            .map(|s| s.id_student.as_str())
            .collect();
        if paused.is_empty() {
            return Ok(());
        }

        let events = self.store.list_events().await?;
        let kept: Vec<Event> = events
            .iter()
            .filter(|e| {
                !(paused.contains(e.id_student.as_str()) && e.status == EventStatus::Scheduled)
            })
            .cloned()
            .collect();
        if kept.len() != events.len() {
            info!(
                removed = events.len() - kept.len(),
                "purged lessons of paused students"
            );
            self.store.replace_events(kept).await?;
        }
        Ok(())
    }

    async fn remove_scheduled_for_student(&self, id_student: &str) -> Result<(), AppError> {
        if id_student.is_empty() {
            return Ok(());
        }
        let events = self.store.list_events().await?;
        let kept: Vec<Event> = events
            .iter()
            .filter(|e| {
                e.id_student != id_student
                    || e.status != EventStatus::Scheduled
                    || e.added_manually
            })
            .cloned()
            .collect();
        if kept.len() != events.len() {
            self.store.replace_events(kept).await?;
        }
        Ok(())
    }

    /// Only removes when `auto_remove_past_events` is on; the pass itself also
    /// runs under `auto_finish_events` alone, matching the refresh cycle it
    /// belongs to.
    async fn strip_overdue_past(&self) -> Result<(), AppError> {
        let config = self.store.config().await?;
        if !config.auto_finish_events && !config.auto_remove_past_events {
            return Ok(());
        }

        let now = time::now();
        let events = self.store.list_events().await?;
        let kept: Vec<Event> = events
            .iter()
            .filter(|e| !removal_overdue(e, &config, now))
            .cloned()
            .collect();
        if kept.len() != events.len() {
            info!(
                removed = events.len() - kept.len(),
                "stripped overdue past lessons"
            );
            self.store.replace_events(kept).await?;
        }
        Ok(())
    }

    /// Builds one event for a recurrence slot, seeding the policy fields
    /// eagerly through the student-then-config cascade so later edits to the
    /// student or the defaults never retro-change an existing lesson.
    fn materialize(
        &self,
        student: &Student,
        date: &str,
        slot: &WeeklySlot,
        config: &GlobalConfig,
    ) -> Event {
        let mut event = self.store.new_event();
        event.id_student = student.id_student.clone();
        event.student_name = student.student_name.clone();
        event.subject = slot.subject.clone();
        event.date = date.to_string();
        event.time = slot.time_day.clone();
        event.original_date = date.to_string();
        event.original_time = slot.time_day.clone();
        event.status = EventStatus::Scheduled;
        event.added_manually = false;

        let blank = Default::default();
        let owner = Some(&student.policy);
        let number = |key| policy::resolve_number(&blank, owner, config, key);
        let flag = |key| policy::resolve_flag(&blank, owner, config, key);
        event.policy.cost = number(NumberKey::Cost).into();
        event.policy.duration = number(NumberKey::Duration).into();
        event.policy.variable_cost = flag(FlagKey::VariableCost).into();
        event.policy.charge_cancelation = flag(FlagKey::ChargeCancelation).into();
        event.policy.free_cancelation_before = number(NumberKey::FreeCancelationBefore).into();
        event.policy.cancelation_fee = number(NumberKey::CancelationFee).into();
        event.policy.minutes_before = number(NumberKey::MinutesBefore).into();

        event.gen_key = Some(event.derived_gen_key());
        event
    }
}

/// Candidate dates: today through today + days, each tagged with its weekday
/// index (Sunday = 0).
fn date_window(today: NaiveDate, days: u32) -> Vec<(String, u8)> {
    (0..=i64::from(days))
        .filter_map(|offset| today.checked_add_days(chrono::Days::new(offset as u64)))
        .map(|date| {
            (
                time::date_iso(date),
                date.weekday().num_days_from_sunday() as u8,
            )
        })
        .collect()
}

/// Removal policy for reconciliation: manual events, events already started
/// and legacy events without a stored key are always retained; everything
/// else must belong to the currently valid key set.
fn retain_in_window(event: &Event, valid_keys: &HashSet<String>, now: NaiveDateTime) -> bool {
    if event.added_manually {
        return true;
    }
    if event.start().is_some_and(|start| start < now) {
        return true;
    }
    let Some(key) = &event.gen_key else {
        return true;
    };
    valid_keys.contains(key)
}

fn removal_overdue(event: &Event, config: &GlobalConfig, now: NaiveDateTime) -> bool {
    if event.added_manually || event.status != EventStatus::Scheduled {
        return false;
    }
    let time = if event.time.is_empty() {
        "23:59"
    } else {
        event.time.as_str()
    };
    let Some(start) = time::parse_date(&event.date, time) else {
        return false;
    };
    let threshold = start + chrono::Duration::minutes(config.auto_finish_offset);
    let hours_overdue = (now - threshold).num_minutes() as f64 / 60.0;
    hours_overdue >= config.removal_grace_hours as f64 && config.auto_remove_past_events
}
