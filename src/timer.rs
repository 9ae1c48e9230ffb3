use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Holder for a single background task. Replacing or clearing the slot aborts
/// whatever was running before, so at most one task per concern is ever live.
#[derive(Default)]
pub struct TaskSlot {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl TaskSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, handle: JoinHandle<()>) {
        let mut slot = self.handle.lock().unwrap();
        if let Some(prev) = slot.take() {
            prev.abort();
        }
        *slot = Some(handle);
    }

    pub fn clear(&self) {
        if let Some(prev) = self.handle.lock().unwrap().take() {
            prev.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

/// Trailing-edge debounce over a [`TaskSlot`]: every `arm` restarts the window,
/// and the task only runs once the window elapses undisturbed.
#[derive(Default)]
pub struct Debounce {
    slot: TaskSlot,
}

impl Debounce {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm<F>(&self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.slot.replace(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    pub fn cancel(&self) {
        self.slot.clear();
    }

    pub fn is_armed(&self) -> bool {
        self.slot.is_armed()
    }
}
