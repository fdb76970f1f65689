use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task lifecycle state. Stored and sent as `pending` | `in-progress` | `completed`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(format!("unknown task status: {}", other)),
        }
    }
}

/// Composite primary key. The only key used for point lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskKey {
    pub task_id: String,
    pub user_id: String,
}

impl TaskKey {
    pub fn new(task_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// Task record as persisted in the record store.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    pub due_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub image_key: Option<String>,
    #[serde(default)]
    pub image_labels: Vec<String>,
}

impl Task {
    pub fn key(&self) -> TaskKey {
        TaskKey::new(self.task_id.clone(), self.user_id.clone())
    }
}

/// Mutable attributes written by a full update. `createdAt` and the key
/// are never part of an update.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskChanges {
    pub title: String,
    pub description: String,
    pub due_date: Option<String>,
    pub status: TaskStatus,
    pub updated_at: String,
    pub image_key: Option<String>,
    pub image_labels: Vec<String>,
}

impl TaskChanges {
    pub fn apply_to(&self, task: &mut Task) {
        task.title = self.title.clone();
        task.description = self.description.clone();
        task.due_date = self.due_date.clone();
        task.status = self.status;
        task.updated_at = self.updated_at.clone();
        task.image_key = self.image_key.clone();
        task.image_labels = self.image_labels.clone();
    }
}

/// A task as returned over HTTP: the stored record plus any signed URLs
/// issued for this response.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,

    /// Short-lived download link for the attachment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Short-lived upload link, present only when an upload was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_upload_url: Option<String>,
}

impl From<Task> for TaskView {
    fn from(task: Task) -> Self {
        Self {
            task,
            image_url: None,
            image_upload_url: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    #[serde(default)]
    pub has_image: bool,
    pub filename: Option<String>,
    pub file_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub has_new_image: bool,
    pub filename: Option<String>,
    pub file_type: Option<String>,
}
