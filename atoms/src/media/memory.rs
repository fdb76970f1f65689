use async_trait::async_trait;
use tokio::sync::Mutex;

use super::service::BlobStore;
use crate::error::TaskError;

/// Signed URL requests seen by [`MemoryBlobStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignedUrl {
    Upload { key: String, content_type: String },
    Download { key: String },
}

/// In-process blob store. Issues `memory://` URLs and records every call so
/// tests can assert on what the operations asked for.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    issued: Mutex<Vec<SignedUrl>>,
    deleted: Mutex<Vec<String>>,
    fail_deletes: bool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose deletes always fail.
    pub fn failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Self::default()
        }
    }

    pub async fn issued(&self) -> Vec<SignedUrl> {
        self.issued.lock().await.clone()
    }

    pub async fn deleted(&self) -> Vec<String> {
        self.deleted.lock().await.clone()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload_url(&self, key: &str, content_type: &str) -> Result<String, TaskError> {
        self.issued.lock().await.push(SignedUrl::Upload {
            key: key.to_string(),
            content_type: content_type.to_string(),
        });
        Ok(format!("memory://upload/{}", key))
    }

    async fn download_url(&self, key: &str) -> Result<String, TaskError> {
        self.issued.lock().await.push(SignedUrl::Download {
            key: key.to_string(),
        });
        Ok(format!("memory://download/{}", key))
    }

    async fn delete(&self, key: &str) -> Result<(), TaskError> {
        if self.fail_deletes {
            return Err(TaskError::Blob(format!("delete refused for {}", key)));
        }
        self.deleted.lock().await.push(key.to_string());
        Ok(())
    }
}
