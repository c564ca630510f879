//! Task store seam.
//!
//! Durable storage is an external collaborator; the hub only needs
//! create/get/update. [`MemoryTaskStore`] is the in-process implementation
//! used by the shipped binary and the tests. No crash-safety guarantee is
//! made here.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use synapse_core::{TaskId, TaskRecord};

/// Task store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Task store unavailable: {0}")]
    Unavailable(String),
}

/// Storage for task records.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist a new record and return its id.
    async fn create(&self, record: TaskRecord) -> Result<TaskId, StoreError>;

    /// Fetch a record by id.
    async fn get(&self, id: &TaskId) -> Result<Option<TaskRecord>, StoreError>;

    /// Persist the current state of a record.
    async fn update(&self, record: &TaskRecord) -> Result<(), StoreError>;
}

/// In-memory task store.
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<TaskId, TaskRecord>>,
}

impl MemoryTaskStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Returns true when no records are held.
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn create(&self, record: TaskRecord) -> Result<TaskId, StoreError> {
        let id = record.id.clone();
        self.tasks.write().await.insert(id.clone(), record);
        Ok(id)
    }

    async fn get(&self, id: &TaskId) -> Result<Option<TaskRecord>, StoreError> {
        Ok(self.tasks.read().await.get(id).cloned())
    }

    async fn update(&self, record: &TaskRecord) -> Result<(), StoreError> {
        self.tasks
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }
}
