use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::models::{ConfigField, EventField, StoreChange, StudentField};
use crate::domain::services::{actions, reminders};
use crate::domain::time;
use crate::error::AppError;
use crate::state::EngineState;
use crate::timer::TaskSlot;

/// The engine's front door: owns the change-dispatch task and the lifecycle
/// entry points the host calls (bootup, resume, stop).
pub struct Engine {
    state: Arc<EngineState>,
    dispatch: TaskSlot,
}

impl Engine {
    pub fn new(state: Arc<EngineState>) -> Self {
        Self {
            state,
            dispatch: TaskSlot::new(),
        }
    }

    pub fn state(&self) -> &Arc<EngineState> {
        &self.state
    }

    /// Subscribes to the store's change stream and starts routing.
    pub fn start(&self) {
        let state = Arc::clone(&self.state);
        let mut changes = state.store.subscribe();
        self.dispatch.replace(tokio::spawn(async move {
            while let Some(change) = changes.recv().await {
                if let Err(err) = dispatch_change(&state, change).await {
                    warn!(%err, "change dispatch failed");
                }
            }
        }));
    }

    /// Startup sequence: action registration, opportunistic permission
    /// request, daily refresh, auto-finish catch-up, paused-student purge and
    /// an initial (debounced) generation pass.
    pub async fn bootup(&self) -> Result<(), AppError> {
        info!("starting agenda engine");
        if let Err(err) = self
            .state
            .platform
            .register_action_types(actions::action_types())
            .await
        {
            warn!(%err, "failed to register notification actions");
        }
        self.state.notifier.ensure_permission().await;
        self.morning_refresh().await?;
        self.state.auto_finish.rearm().await?;
        self.state.generator.remove_scheduled_for_paused().await?;
        self.state
            .generator
            .schedule_generate(Duration::from_millis(10));
        Ok(())
    }

    /// Host hook for app foregrounding: permission may have changed in the
    /// device settings, and a day may have rolled over in the meantime.
    pub async fn resume(&self) -> Result<(), AppError> {
        if self.state.notifier.check_permission().await {
            self.morning_refresh().await
        } else {
            self.shutdown_notifications().await;
            Ok(())
        }
    }

    /// Rebuilds all notifications once per calendar day.
    pub async fn morning_refresh(&self) -> Result<(), AppError> {
        let mut config = self.state.store.config().await?;
        let Some(today) = reminders::is_new_day(config.last_refresh_date.as_deref(), time::today())
        else {
            return Ok(());
        };
        config.last_refresh_date = Some(today);
        self.state.store.update_config(&config).await?;
        info!("new day detected, refreshing notifications");
        self.set_all_notifications().await
    }

    /// Full rebuild: clears platform state, then schedules one batch covering
    /// every eligible lesson and birthday.
    pub async fn set_all_notifications(&self) -> Result<(), AppError> {
        if !self.state.notifier.check_permission().await {
            return Ok(());
        }
        let students = self.state.store.list_students().await?;
        let events = self.state.store.list_events().await?;
        let config = self.state.store.config().await?;

        self.state.notifier.remove_all().await;

        let now = time::now();
        let window = self.state.config.notify_window_days;
        let mut batch = Vec::new();
        for event in events.iter().filter(|e| !e.deleted) {
            let Some(student) = students.iter().find(|s| s.id_student == event.id_student)
            else {
                continue;
            };
            if let Some(notification) =
                reminders::event_notification(event, student, &config, now, window)
            {
                batch.push(notification);
            }
        }
        let lessons = batch.len();
        if config.notify_birthday {
            for student in &students {
                if let Some(notification) =
                    reminders::birthday_notification(student, &config, now, window)
                {
                    batch.push(notification);
                }
            }
        }
        info!(
            lessons,
            birthdays = batch.len() - lessons,
            "rebuilding notification schedule"
        );
        self.state.notifier.schedule(batch).await;
        Ok(())
    }

    /// Clears everything pending and delivered, e.g. when permission is
    /// revoked.
    pub async fn shutdown_notifications(&self) {
        info!("shutting down notifications");
        self.state.notifier.remove_all().await;
    }

    /// Stops the dispatch task and every timer. The store and platform stay
    /// untouched.
    pub fn stop(&self) {
        self.dispatch.clear();
        self.state.auto_finish.stop();
        self.state.dirty_queue.stop();
        self.state.generator.stop();
    }
}

async fn dispatch_change(state: &Arc<EngineState>, change: StoreChange) -> Result<(), AppError> {
    match change {
        StoreChange::EventAdded { id } | StoreChange::EventRemoved { id } => {
            state.dirty_queue.mark_event(&id);
            state.auto_finish.rearm().await?;
        }
        StoreChange::EventChanged { id, fields } => {
            let notify_relevant = fields.iter().any(|f| {
                matches!(
                    f,
                    EventField::IdStudent
                        | EventField::StudentName
                        | EventField::Date
                        | EventField::Time
                        | EventField::Duration
                        | EventField::MinutesBefore
                )
            });
            if notify_relevant {
                state.dirty_queue.mark_event(&id);
            }
            let lifecycle_relevant = fields.iter().any(|f| {
                matches!(f, EventField::Date | EventField::Time | EventField::Status)
            });
            if lifecycle_relevant {
                state.auto_finish.rearm().await?;
            }
        }
        StoreChange::StudentAdded { id } => {
            if let Some(student) = state.store.find_student(&id).await? {
                if !student.dob.is_empty() {
                    state.dirty_queue.mark_birthday(&id);
                }
            }
            regenerate_student(state, &id).await?;
        }
        StoreChange::StudentRemoved { id } => {
            state.dirty_queue.mark_birthday(&id);
            regenerate_student(state, &id).await?;
        }
        StoreChange::StudentChanged { id, fields } => {
            let contact_relevant = fields.iter().any(|f| {
                matches!(
                    f,
                    StudentField::Name | StudentField::StudentPhone | StudentField::ParentPhone
                )
            });
            if contact_relevant {
                let events = state.store.list_events().await?;
                for event in events.iter().filter(|e| e.id_student == id && !e.deleted) {
                    state.dirty_queue.mark_event(&event.id_event);
                }
            }
            if fields
                .iter()
                .any(|f| matches!(f, StudentField::Name | StudentField::Dob))
            {
                state.dirty_queue.mark_birthday(&id);
            }
            if fields
                .iter()
                .any(|f| matches!(f, StudentField::Paused | StudentField::WeeklySchedule))
            {
                regenerate_student(state, &id).await?;
                state.auto_finish.rearm().await?;
            }
        }
        StoreChange::ConfigChanged { fields } => {
            if fields.contains(&ConfigField::Agenda) {
                // rearm handles the disabled case by simply not arming
                state.auto_finish.rearm().await?;
                state
                    .generator
                    .schedule_generate(state.config.generate_debounce);
            }
            let birthday_relevant = fields.iter().any(|f| {
                matches!(
                    f,
                    ConfigField::NotifyBirthday | ConfigField::NotifyBirthdayDayBefore
                )
            });
            if birthday_relevant {
                let config = state.store.config().await?;
                let students = state.store.list_students().await?;
                for student in students.iter().filter(|s| !s.dob.is_empty()) {
                    if config.notify_birthday {
                        state.dirty_queue.mark_birthday(&student.id_student);
                    } else {
                        state.notifier.cancel_for_entity(&student.id_student).await;
                    }
                }
            }
        }
    }
    Ok(())
}

/// The differential reaction to a student-level agenda change: purge that
/// student's scheduled generated events, regenerate from the current
/// template, then clean up anything now overdue.
async fn regenerate_student(state: &Arc<EngineState>, id: &str) -> Result<(), AppError> {
    state.generator.remove_scheduled_for_student(id).await?;
    state.generator.generate_for_student(id).await?;
    state.generator.strip_overdue_past().await?;
    Ok(())
}
