use std::sync::Arc;

use crate::config::EngineConfig;
use crate::domain::ports::{DataStore, NotificationPlatform};
use crate::domain::services::auto_finish::AutoFinishScheduler;
use crate::domain::services::dirty_queue::NotificationDirtyQueue;
use crate::domain::services::generator::EventGenerator;
use crate::domain::services::notifier::NotificationScheduler;

/// The wired service graph. Built once by the host, shared by reference.
pub struct EngineState {
    pub config: EngineConfig,
    pub store: Arc<dyn DataStore>,
    pub platform: Arc<dyn NotificationPlatform>,
    pub notifier: Arc<NotificationScheduler>,
    pub dirty_queue: Arc<NotificationDirtyQueue>,
    pub generator: Arc<EventGenerator>,
    pub auto_finish: Arc<AutoFinishScheduler>,
}

pub fn bootstrap_state(
    config: EngineConfig,
    store: Arc<dyn DataStore>,
    platform: Arc<dyn NotificationPlatform>,
) -> EngineState {
    let notifier = Arc::new(NotificationScheduler::new(platform.clone()));
    let dirty_queue = Arc::new(NotificationDirtyQueue::new(
        store.clone(),
        notifier.clone(),
        config.clone(),
    ));
    let generator = Arc::new(EventGenerator::new(store.clone()));
    let auto_finish = Arc::new(AutoFinishScheduler::new(store.clone()));

    EngineState {
        config,
        store,
        platform,
        notifier,
        dirty_queue,
        generator,
        auto_finish,
    }
}
