use thiserror::Error;

/// Failures surfaced by the task operations and the adapters beneath them.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task not found")]
    NotFound,

    /// Record missing, or present without an attachment.
    #[error("Task or image not found")]
    ImageNotFound,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("record store error: {0}")]
    Store(String),

    #[error("blob store error: {0}")]
    Blob(String),

    #[error("label detection error: {0}")]
    Detector(String),
}

impl TaskError {
    /// True for the errors that map to a 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TaskError::NotFound | TaskError::ImageNotFound)
    }
}

impl From<serde_json::Error> for TaskError {
    fn from(e: serde_json::Error) -> Self {
        TaskError::InvalidRequest(format!("Invalid request body: {}", e))
    }
}
