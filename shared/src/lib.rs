pub mod config;
pub mod identity;

pub use config::{Config, ConfigError};
pub use identity::{HeaderIdentity, IdentityProvider};

use std::sync::Arc;
use taskup_atoms::labels::{LabelDetector, RekognitionLabelDetector};
use taskup_atoms::media::{BlobStore, S3BlobStore};
use taskup_atoms::tasks::{DynamoRecordStore, RecordStore};

/// Long-lived adapters, built once per process and reused across
/// invocations. Holds no per-request state.
#[derive(Clone)]
pub struct AppState {
    pub records: Arc<dyn RecordStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub labels: Arc<dyn LabelDetector>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        labels: Arc<dyn LabelDetector>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            records,
            blobs,
            labels,
            identity,
        }
    }

    /// AWS-backed state. Credentials and region come from the default chain.
    pub async fn from_config(config: &Config) -> Self {
        let aws_config = aws_config::load_from_env().await;

        let dynamo_client = aws_sdk_dynamodb::Client::new(&aws_config);
        let s3_client = aws_sdk_s3::Client::new(&aws_config);
        let rekognition_client = aws_sdk_rekognition::Client::new(&aws_config);

        tracing::info!(
            "Initialised AWS clients: table={}, bucket={}, index={}",
            config.table_name,
            config.bucket_name,
            config.user_id_index
        );

        Self::new(
            Arc::new(DynamoRecordStore::new(
                dynamo_client,
                &config.table_name,
                &config.user_id_index,
            )),
            Arc::new(S3BlobStore::new(s3_client, &config.bucket_name, config.url_expiry)),
            Arc::new(
                RekognitionLabelDetector::new(rekognition_client, &config.bucket_name)
                    .with_limits(config.max_labels, config.min_confidence),
            ),
            Arc::new(HeaderIdentity::new(
                &config.identity_header,
                config.default_user_id.clone(),
            )),
        )
    }
}
