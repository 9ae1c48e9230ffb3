use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::models::{
    config_changes, event_changes, student_changes, Event, GlobalConfig, StoreChange, Student,
};
use crate::domain::ports::DataStore;
use crate::error::AppError;

/// The full data set owned by the store. Serializable as one unit so hosts
/// can snapshot and restore it through whatever storage they have.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppData {
    pub students: Vec<Student>,
    pub events: Vec<Event>,
    pub config: GlobalConfig,
}

/// In-memory [`DataStore`] adapter. Every mutation is diffed against the
/// previous state and published as typed [`StoreChange`] events to all
/// subscribers.
pub struct MemoryStore {
    data: RwLock<AppData>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<StoreChange>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_data(AppData::default())
    }

    pub fn with_data(data: AppData) -> Self {
        Self {
            data: RwLock::new(data),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn snapshot(&self) -> Result<String, AppError> {
        serde_json::to_string_pretty(&*self.data.read().unwrap())
            .map_err(|e| AppError::Store(e.to_string()))
    }

    pub fn restore(json: &str) -> Result<Self, AppError> {
        let data: AppData =
            serde_json::from_str(json).map_err(|e| AppError::Store(e.to_string()))?;
        Ok(Self::with_data(data))
    }

    fn emit(&self, change: StoreChange) {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| tx.send(change.clone()).is_ok());
    }

    fn emit_all(&self, changes: Vec<StoreChange>) {
        for change in changes {
            self.emit(change);
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn list_students(&self) -> Result<Vec<Student>, AppError> {
        Ok(self.data.read().unwrap().students.clone())
    }

    async fn find_student(&self, id: &str) -> Result<Option<Student>, AppError> {
        Ok(self
            .data
            .read()
            .unwrap()
            .students
            .iter()
            .find(|s| s.id_student == id)
            .cloned())
    }

    async fn upsert_student(&self, student: &Student) -> Result<(), AppError> {
        let change = {
            let mut data = self.data.write().unwrap();
            match data
                .students
                .iter_mut()
                .find(|s| s.id_student == student.id_student)
            {
                Some(existing) => {
                    let fields = student_changes(existing, student);
                    *existing = student.clone();
                    if fields.is_empty() {
                        None
                    } else {
                        Some(StoreChange::StudentChanged {
                            id: student.id_student.clone(),
                            fields,
                        })
                    }
                }
                None => {
                    data.students.push(student.clone());
                    Some(StoreChange::StudentAdded {
                        id: student.id_student.clone(),
                    })
                }
            }
        };
        if let Some(change) = change {
            self.emit(change);
        }
        Ok(())
    }

    async fn remove_student(&self, id: &str) -> Result<(), AppError> {
        let removed = {
            let mut data = self.data.write().unwrap();
            let before = data.students.len();
            data.students.retain(|s| s.id_student != id);
            data.students.len() != before
        };
        if removed {
            self.emit(StoreChange::StudentRemoved { id: id.to_string() });
        }
        Ok(())
    }

    async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        Ok(self.data.read().unwrap().events.clone())
    }

    async fn find_event(&self, id: &str) -> Result<Option<Event>, AppError> {
        Ok(self
            .data
            .read()
            .unwrap()
            .events
            .iter()
            .find(|e| e.id_event == id)
            .cloned())
    }

    async fn insert_event(&self, event: &Event) -> Result<(), AppError> {
        self.data.write().unwrap().events.push(event.clone());
        self.emit(StoreChange::EventAdded {
            id: event.id_event.clone(),
        });
        Ok(())
    }

    async fn update_event(&self, event: &Event) -> Result<(), AppError> {
        let change = {
            let mut data = self.data.write().unwrap();
            let existing = data
                .events
                .iter_mut()
                .find(|e| e.id_event == event.id_event)
                .ok_or_else(|| AppError::NotFound(format!("event {}", event.id_event)))?;
            let fields = event_changes(existing, event);
            *existing = event.clone();
            if fields.is_empty() {
                None
            } else {
                Some(StoreChange::EventChanged {
                    id: event.id_event.clone(),
                    fields,
                })
            }
        };
        if let Some(change) = change {
            self.emit(change);
        }
        Ok(())
    }

    async fn remove_event(&self, id: &str) -> Result<(), AppError> {
        let removed = {
            let mut data = self.data.write().unwrap();
            let Some(index) = data.events.iter().position(|e| e.id_event == id) else {
                return Ok(());
            };
            if data.events[index].added_manually {
                data.events.remove(index);
                true
            } else if !data.events[index].deleted {
                // Generated slots are soft-deleted: a hard removal would be
                // undone by the next reconcile pass.
                data.events[index].deleted = true;
                true
            } else {
                false
            }
        };
        if removed {
            self.emit(StoreChange::EventRemoved { id: id.to_string() });
        }
        Ok(())
    }

    async fn replace_events(&self, events: Vec<Event>) -> Result<(), AppError> {
        let changes = {
            let mut data = self.data.write().unwrap();
            let old: HashMap<String, Event> = data
                .events
                .drain(..)
                .map(|e| (e.id_event.clone(), e))
                .collect();

            let mut changes = Vec::new();
            for event in &events {
                match old.get(&event.id_event) {
                    None => changes.push(StoreChange::EventAdded {
                        id: event.id_event.clone(),
                    }),
                    Some(previous) => {
                        let fields = event_changes(previous, event);
                        if !fields.is_empty() {
                            changes.push(StoreChange::EventChanged {
                                id: event.id_event.clone(),
                                fields,
                            });
                        }
                    }
                }
            }
            for id in old.keys() {
                if !events.iter().any(|e| &e.id_event == id) {
                    changes.push(StoreChange::EventRemoved { id: id.clone() });
                }
            }

            data.events = events;
            changes
        };
        debug!(changes = changes.len(), "event collection replaced");
        self.emit_all(changes);
        Ok(())
    }

    async fn config(&self) -> Result<GlobalConfig, AppError> {
        Ok(self.data.read().unwrap().config.clone())
    }

    async fn update_config(&self, config: &GlobalConfig) -> Result<(), AppError> {
        let fields = {
            let mut data = self.data.write().unwrap();
            let fields = config_changes(&data.config, config);
            data.config = config.clone();
            fields
        };
        if !fields.is_empty() {
            self.emit(StoreChange::ConfigChanged { fields });
        }
        Ok(())
    }

    fn new_event(&self) -> Event {
        Event::new()
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<StoreChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }
}
