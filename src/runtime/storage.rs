use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use crate::error::StoreError;
use crate::runtime::task::{Task, TaskState, TaskSummary};

// --- Interfaces ---

/// Durable keyed storage of task records.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create(&self, task: &Task) -> Result<(), StoreError>;
    async fn get(&self, id: &str) -> Result<Task, StoreError>;
    /// Summaries in creation order.
    async fn list(&self) -> Result<Vec<TaskSummary>, StoreError>;
    async fn update_state(&self, id: &str, state: TaskState) -> Result<(), StoreError>;
    async fn update_end_time(&self, id: &str, end_time: DateTime<Utc>) -> Result<(), StoreError>;
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

// --- In-Memory Implementation ---

struct StoredTask {
    seq: u64,
    task: Task,
}

pub struct InMemoryTaskStore {
    tasks: DashMap<String, StoredTask>,
    next_seq: AtomicU64,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            tasks: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn modify(&self, id: &str, f: impl FnOnce(&mut Task)) -> Result<(), StoreError> {
        let mut entry = self.tasks.get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        f(&mut entry.task);
        Ok(())
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, task: &Task) -> Result<(), StoreError> {
        match self.tasks.entry(task.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(task.id.clone())),
            Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
                slot.insert(StoredTask { seq, task: task.clone() });
                Ok(())
            }
        }
    }

    async fn get(&self, id: &str) -> Result<Task, StoreError> {
        self.tasks.get(id)
            .map(|e| e.task.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list(&self) -> Result<Vec<TaskSummary>, StoreError> {
        let mut entries: Vec<(u64, TaskSummary)> = self.tasks.iter()
            .map(|e| (e.seq, e.task.summary()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        Ok(entries.into_iter().map(|(_, summary)| summary).collect())
    }

    async fn update_state(&self, id: &str, state: TaskState) -> Result<(), StoreError> {
        self.modify(id, |task| task.state = state)
    }

    async fn update_end_time(&self, id: &str, end_time: DateTime<Utc>) -> Result<(), StoreError> {
        self.modify(id, |task| task.end_time = Some(end_time))
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.tasks.remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}
