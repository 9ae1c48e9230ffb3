use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::config::EngineConfig;
use crate::domain::models::{DirtyItem, Notification};
use crate::domain::ports::DataStore;
use crate::domain::services::notifier::NotificationScheduler;
use crate::domain::services::reminders;
use crate::domain::time;
use crate::timer::Debounce;

/// Coalesces bursts of change marks into one batched notification
/// reconciliation. Marks land in a dedup set and restart a trailing-edge
/// debounce window; when the window elapses undisturbed the queue drains.
///
/// Drain ordering is fixed: delivered cleanup, then every cancellation for
/// the batch, then one schedule call for every recomputed notification. An
/// old and a new notification for the same entity therefore never coexist.
pub struct NotificationDirtyQueue {
    inner: Arc<QueueInner>,
    debounce: Debounce,
}

struct QueueInner {
    store: Arc<dyn DataStore>,
    notifier: Arc<NotificationScheduler>,
    config: EngineConfig,
    pending: Mutex<HashSet<DirtyItem>>,
}

impl NotificationDirtyQueue {
    pub fn new(
        store: Arc<dyn DataStore>,
        notifier: Arc<NotificationScheduler>,
        config: EngineConfig,
    ) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                store,
                notifier,
                config,
                pending: Mutex::new(HashSet::new()),
            }),
            debounce: Debounce::new(),
        }
    }

    pub fn mark_event(&self, id: &str) {
        self.mark(DirtyItem::Event(id.to_string()));
    }

    pub fn mark_birthday(&self, id: &str) {
        self.mark(DirtyItem::Birthday(id.to_string()));
    }

    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().unwrap().len()
    }

    /// Resolves everything currently marked, bypassing the debounce window.
    pub async fn drain(&self) {
        self.inner.drain().await;
    }

    pub fn stop(&self) {
        self.debounce.cancel();
    }

    fn mark(&self, item: DirtyItem) {
        self.inner.pending.lock().unwrap().insert(item);
        let inner = Arc::clone(&self.inner);
        self.debounce
            .arm(self.inner.config.dirty_debounce, async move {
                inner.drain().await;
            });
    }
}

impl QueueInner {
    /// Processed items are cleared after the attempt even when platform calls
    /// fail; a later mark simply starts the next cycle.
    async fn drain(&self) {
        // Delivered (already fired) notifications go first, before any
        // recomputation.
        self.notifier.remove_delivered().await;

        let items: Vec<DirtyItem> = self.pending.lock().unwrap().iter().cloned().collect();
        if items.is_empty() {
            return;
        }

        let mut fresh: Vec<Notification> = Vec::new();
        for item in &items {
            match item {
                DirtyItem::Event(id) => {
                    self.notifier.cancel_for_entity(id).await;
                    if let Some(notification) = self.recompute_event(id).await {
                        fresh.push(notification);
                    }
                }
                DirtyItem::Birthday(id) => {
                    self.notifier.cancel_for_entity(id).await;
                    if let Some(notification) = self.recompute_birthday(id).await {
                        fresh.push(notification);
                    }
                }
            }
        }

        self.notifier.schedule(fresh).await;

        let mut pending = self.pending.lock().unwrap();
        for item in &items {
            pending.remove(item);
        }
    }

    async fn recompute_event(&self, id: &str) -> Option<Notification> {
        let event = match self.store.find_event(id).await {
            Ok(found) => found?,
            Err(err) => {
                warn!(%err, id, "event lookup failed during drain");
                return None;
            }
        };
        if event.deleted {
            return None;
        }
        let student = match self.store.find_student(&event.id_student).await {
            Ok(found) => found?,
            Err(err) => {
                warn!(%err, id, "student lookup failed during drain");
                return None;
            }
        };
        let config = match self.store.config().await {
            Ok(config) => config,
            Err(err) => {
                warn!(%err, "config lookup failed during drain");
                return None;
            }
        };
        reminders::event_notification(
            &event,
            &student,
            &config,
            time::now(),
            self.config.notify_window_days,
        )
    }

    async fn recompute_birthday(&self, id: &str) -> Option<Notification> {
        let student = match self.store.find_student(id).await {
            Ok(found) => found?,
            Err(err) => {
                warn!(%err, id, "student lookup failed during drain");
                return None;
            }
        };
        if student.dob.is_empty() {
            return None;
        }
        let config = match self.store.config().await {
            Ok(config) => config,
            Err(err) => {
                warn!(%err, "config lookup failed during drain");
                return None;
            }
        };
        if !config.notify_birthday {
            return None;
        }
        reminders::birthday_notification(
            &student,
            &config,
            time::now(),
            self.config.notify_window_days,
        )
    }
}
