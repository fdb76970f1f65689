use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::model::{Task, TaskChanges, TaskKey};
use super::service::RecordStore;
use crate::error::TaskError;

/// In-process record store for tests and local runs.
///
/// Mirrors the table's behaviour where it matters to callers: list results
/// are ordered by `createdAt` ascending, delete-of-absent succeeds, and
/// updates against a missing key create a record holding only the key and
/// the written attributes (as `update_item` does).
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<TaskKey, Task>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let records = tasks.into_iter().map(|t| (t.key(), t)).collect();
        Self {
            records: Mutex::new(records),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, key: &TaskKey) -> Result<Option<Task>, TaskError> {
        Ok(self.records.lock().await.get(key).cloned())
    }

    async fn put(&self, task: &Task) -> Result<(), TaskError> {
        self.records.lock().await.insert(task.key(), task.clone());
        Ok(())
    }

    async fn update(&self, key: &TaskKey, changes: &TaskChanges) -> Result<Task, TaskError> {
        let mut records = self.records.lock().await;
        let task = records.entry(key.clone()).or_insert_with(|| keyed_only(key));
        changes.apply_to(task);
        Ok(task.clone())
    }

    async fn set_labels(&self, key: &TaskKey, labels: &[String]) -> Result<Task, TaskError> {
        let mut records = self.records.lock().await;
        let task = records.entry(key.clone()).or_insert_with(|| keyed_only(key));
        task.image_labels = labels.to_vec();
        Ok(task.clone())
    }

    async fn delete(&self, key: &TaskKey) -> Result<(), TaskError> {
        self.records.lock().await.remove(key);
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Task>, TaskError> {
        let records = self.records.lock().await;
        let mut tasks: Vec<Task> = records
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(tasks)
    }
}

/// What an upsert leaves behind when no record existed: the key, with every
/// other attribute decoded as missing.
fn keyed_only(key: &TaskKey) -> Task {
    Task {
        task_id: key.task_id.clone(),
        user_id: key.user_id.clone(),
        title: String::new(),
        description: String::new(),
        status: Default::default(),
        due_date: None,
        created_at: String::new(),
        updated_at: String::new(),
        image_key: None,
        image_labels: Vec::new(),
    }
}
