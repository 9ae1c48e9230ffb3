#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDateTime, Timelike};

use agenda_engine::config::EngineConfig;
use agenda_engine::domain::models::{
    ActionType, Event, EventStatus, Notification, PermissionState, Setting, Student, WeeklySlot,
};
use agenda_engine::domain::ports::NotificationPlatform;
use agenda_engine::domain::time;
use agenda_engine::engine::Engine;
use agenda_engine::error::AppError;
use agenda_engine::infra::store::MemoryStore;
use agenda_engine::state::{bootstrap_state, EngineState};

#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    Check,
    Request,
    Schedule(Vec<u32>),
    Cancel(Vec<u32>),
    Pending,
    RemoveDelivered,
    RegisterActions,
}

/// Recording fake for the platform notification service.
pub struct MockPlatform {
    permission: Mutex<PermissionState>,
    pub calls: Mutex<Vec<PlatformCall>>,
    pub scheduled: Mutex<Vec<Notification>>,
    pending: Mutex<HashSet<u32>>,
    pub fail_schedule: AtomicBool,
}

impl MockPlatform {
    pub fn with_permission(permission: PermissionState) -> Self {
        Self {
            permission: Mutex::new(permission),
            calls: Mutex::new(Vec::new()),
            scheduled: Mutex::new(Vec::new()),
            pending: Mutex::new(HashSet::new()),
            fail_schedule: AtomicBool::new(false),
        }
    }

    pub fn set_permission(&self, permission: PermissionState) {
        *self.permission.lock().unwrap() = permission;
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn schedule_batches(&self) -> Vec<Vec<u32>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                PlatformCall::Schedule(ids) => Some(ids),
                _ => None,
            })
            .collect()
    }

    pub fn cancels(&self) -> Vec<Vec<u32>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                PlatformCall::Cancel(ids) => Some(ids),
                _ => None,
            })
            .collect()
    }

    pub fn cancel_count_for(&self, id: u32) -> usize {
        self.cancels().iter().filter(|ids| ids.contains(&id)).count()
    }

    pub fn pending_ids(&self) -> Vec<u32> {
        self.pending.lock().unwrap().iter().copied().collect()
    }

    fn record(&self, call: PlatformCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl NotificationPlatform for MockPlatform {
    async fn check_permissions(&self) -> Result<PermissionState, AppError> {
        self.record(PlatformCall::Check);
        Ok(*self.permission.lock().unwrap())
    }

    async fn request_permissions(&self) -> Result<PermissionState, AppError> {
        self.record(PlatformCall::Request);
        Ok(*self.permission.lock().unwrap())
    }

    async fn schedule(&self, notifications: Vec<Notification>) -> Result<(), AppError> {
        self.record(PlatformCall::Schedule(
            notifications.iter().map(|n| n.id).collect(),
        ));
        if self.fail_schedule.load(Ordering::SeqCst) {
            return Err(AppError::Platform("schedule rejected".into()));
        }
        let mut pending = self.pending.lock().unwrap();
        for n in &notifications {
            pending.insert(n.id);
        }
        self.scheduled.lock().unwrap().extend(notifications);
        Ok(())
    }

    async fn cancel(&self, ids: Vec<u32>) -> Result<(), AppError> {
        let mut pending = self.pending.lock().unwrap();
        for id in &ids {
            pending.remove(id);
        }
        self.scheduled.lock().unwrap().retain(|n| !ids.contains(&n.id));
        self.record(PlatformCall::Cancel(ids));
        Ok(())
    }

    async fn pending(&self) -> Result<Vec<u32>, AppError> {
        self.record(PlatformCall::Pending);
        Ok(self.pending.lock().unwrap().iter().copied().collect())
    }

    async fn remove_all_delivered(&self) -> Result<(), AppError> {
        self.record(PlatformCall::RemoveDelivered);
        Ok(())
    }

    async fn register_action_types(&self, _types: Vec<ActionType>) -> Result<(), AppError> {
        self.record(PlatformCall::RegisterActions);
        Ok(())
    }
}

pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub platform: Arc<MockPlatform>,
    pub engine: Engine,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_permission(PermissionState::Granted)
    }

    pub fn with_permission(permission: PermissionState) -> Self {
        let store = Arc::new(MemoryStore::new());
        let platform = Arc::new(MockPlatform::with_permission(permission));
        let state = Arc::new(bootstrap_state(
            EngineConfig::default(),
            store.clone(),
            platform.clone(),
        ));
        let engine = Engine::new(state);
        Self {
            store,
            platform,
            engine,
        }
    }

    pub fn state(&self) -> &Arc<EngineState> {
        self.engine.state()
    }
}

/// Now truncated to the minute, matching the "HH:MM" precision of lesson times.
pub fn now_minute() -> NaiveDateTime {
    time::now().with_second(0).unwrap().with_nanosecond(0).unwrap()
}

pub fn student_with_slot(name: &str, week_day: u8, time_day: &str) -> Student {
    let mut student = Student::new(name);
    student.weekly_schedule = vec![WeeklySlot {
        week_day: Some(week_day),
        time_day: time_day.to_string(),
        subject: "math".to_string(),
    }];
    student
}

/// Weekday index (Sunday = 0) of today plus an offset in days.
pub fn weekday_in(days: i64) -> u8 {
    (time::today() + Duration::days(days))
        .weekday()
        .num_days_from_sunday() as u8
}

/// A scheduled lesson for a student starting at the given local time.
pub fn scheduled_event(student: &Student, start: NaiveDateTime) -> Event {
    let mut event = Event::new();
    event.id_student = student.id_student.clone();
    event.student_name = student.student_name.clone();
    event.date = time::date_iso(start.date());
    event.time = time::time_iso(start);
    event.status = EventStatus::Scheduled;
    event.added_manually = false;
    event.gen_key = Some(event.derived_gen_key());
    event.policy.duration = Setting::Num(1.0);
    event
}

pub fn manual_event(student: &Student, start: NaiveDateTime) -> Event {
    let mut event = scheduled_event(student, start);
    event.added_manually = true;
    event.gen_key = None;
    event
}
