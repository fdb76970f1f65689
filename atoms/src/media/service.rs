use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client as S3Client;
use std::time::Duration;

use crate::error::TaskError;

/// Object storage for task attachments. Clients move bytes directly via
/// the signed URLs; the handler never sees file contents.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Time-limited PUT URL scoped to `key` and the declared content type.
    async fn upload_url(&self, key: &str, content_type: &str) -> Result<String, TaskError>;

    /// Time-limited GET URL. Issued fresh on every read; never cached.
    async fn download_url(&self, key: &str) -> Result<String, TaskError>;

    async fn delete(&self, key: &str) -> Result<(), TaskError>;
}

/// S3-backed blob store issuing presigned URLs.
#[derive(Clone, Debug)]
pub struct S3BlobStore {
    client: S3Client,
    bucket_name: String,
    url_expiry: Duration,
}

impl S3BlobStore {
    pub fn new(client: S3Client, bucket_name: impl Into<String>, url_expiry: Duration) -> Self {
        Self {
            client,
            bucket_name: bucket_name.into(),
            url_expiry,
        }
    }

    fn presigning_config(&self) -> Result<PresigningConfig, TaskError> {
        PresigningConfig::expires_in(self.url_expiry)
            .map_err(|e| TaskError::Blob(format!("S3 presigning config error: {}", e)))
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload_url(&self, key: &str, content_type: &str) -> Result<String, TaskError> {
        tracing::debug!("Generating signed URL for putObject on key: {}", key);

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .presigned(self.presigning_config()?)
            .await
            .map_err(|e| TaskError::Blob(format!("S3 presign put_object error: {}", e)))?;

        Ok(request.uri().to_string())
    }

    async fn download_url(&self, key: &str) -> Result<String, TaskError> {
        tracing::debug!("Generating signed URL for getObject on key: {}", key);

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .presigned(self.presigning_config()?)
            .await
            .map_err(|e| TaskError::Blob(format!("S3 presign get_object error: {}", e)))?;

        Ok(request.uri().to_string())
    }

    async fn delete(&self, key: &str) -> Result<(), TaskError> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| TaskError::Blob(format!("S3 delete_object error: {}", e)))?;

        Ok(())
    }
}
