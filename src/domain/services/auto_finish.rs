use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::models::EventStatus;
use crate::domain::ports::DataStore;
use crate::domain::time;
use crate::error::AppError;
use crate::timer::TaskSlot;

/// Advances lessons from scheduled to done once their finish threshold
/// (start + offset) has passed.
///
/// One timer serves all lessons: each scan flips everything already overdue,
/// then arms a single sleep for the nearest future threshold. Firing re-runs
/// the whole scan, since the candidate set may have changed in the meantime.
/// Recomputation is O(events) per wake, which beats holding one live timer
/// per lesson for the collection sizes this engine serves.
pub struct AutoFinishScheduler {
    inner: Arc<FinishInner>,
    timer: TaskSlot,
}

struct FinishInner {
    store: Arc<dyn DataStore>,
}

impl AutoFinishScheduler {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self {
            inner: Arc::new(FinishInner { store }),
            timer: TaskSlot::new(),
        }
    }

    /// Cancels the pending timer, catches up on overdue lessons and re-arms
    /// for the nearest future threshold. Returns the armed delay, if any.
    pub async fn rearm(&self) -> Result<Option<Duration>, AppError> {
        self.timer.clear();
        let next = self.inner.scan().await?;
        if let Some(delay) = next {
            self.arm(delay);
        }
        Ok(next)
    }

    pub fn stop(&self) {
        self.timer.clear();
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_armed()
    }

    fn arm(&self, first_delay: Duration) {
        debug!(delay_secs = first_delay.as_secs(), "auto-finish timer armed");
        let inner = Arc::clone(&self.inner);
        self.timer.replace(tokio::spawn(async move {
            let mut delay = first_delay;
            loop {
                tokio::time::sleep(delay).await;
                match inner.scan().await {
                    Ok(Some(next)) => delay = next,
                    Ok(None) => break,
                    Err(err) => {
                        warn!(%err, "auto-finish scan failed");
                        break;
                    }
                }
            }
        }));
    }
}

impl FinishInner {
    /// Synchronous catch-up plus nearest-threshold lookahead.
    async fn scan(&self) -> Result<Option<Duration>, AppError> {
        let config = self.store.config().await?;
        if !config.auto_finish_events {
            return Ok(None);
        }

        let students = self.store.list_students().await?;
        let events = self.store.list_events().await?;
        let now = time::now();
        let mut next: Option<chrono::Duration> = None;

        for mut event in events {
            if event.status != EventStatus::Scheduled || event.deleted {
                continue;
            }
            let Some(student) = students.iter().find(|s| s.id_student == event.id_student)
            else {
                continue;
            };
            if student.paused {
                continue;
            }
            let Some(start) = event.start() else {
                continue;
            };

            let threshold = start + chrono::Duration::minutes(config.auto_finish_offset);
            if threshold <= now {
                event.status = EventStatus::Done;
                info!(id_event = %event.id_event, "lesson auto-finished");
                self.store.update_event(&event).await?;
                continue;
            }

            let delay = threshold - now;
            if next.is_none_or(|d| delay < d) {
                next = Some(delay);
            }
        }

        Ok(next.and_then(|d| d.to_std().ok()))
    }
}
