use async_trait::async_trait;
use aws_sdk_rekognition::types::{Image, S3Object};
use aws_sdk_rekognition::Client as RekognitionClient;

use crate::error::TaskError;

pub const DEFAULT_MAX_LABELS: i32 = 10;
pub const DEFAULT_MIN_CONFIDENCE: f32 = 70.0;

/// Image-analysis capability: text labels describing a stored image.
#[async_trait]
pub trait LabelDetector: Send + Sync {
    /// Confidence-filtered labels for the object at `key`, in service order.
    async fn detect_labels(&self, key: &str) -> Result<Vec<String>, TaskError>;
}

/// Rekognition DetectLabels against objects in the attachment bucket.
#[derive(Clone, Debug)]
pub struct RekognitionLabelDetector {
    client: RekognitionClient,
    bucket_name: String,
    max_labels: i32,
    min_confidence: f32,
}

impl RekognitionLabelDetector {
    pub fn new(client: RekognitionClient, bucket_name: impl Into<String>) -> Self {
        Self {
            client,
            bucket_name: bucket_name.into(),
            max_labels: DEFAULT_MAX_LABELS,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }

    pub fn with_limits(mut self, max_labels: i32, min_confidence: f32) -> Self {
        self.max_labels = max_labels;
        self.min_confidence = min_confidence;
        self
    }
}

#[async_trait]
impl LabelDetector for RekognitionLabelDetector {
    async fn detect_labels(&self, key: &str) -> Result<Vec<String>, TaskError> {
        tracing::info!("Analyzing image with Rekognition: {}", key);

        let image = Image::builder()
            .s3_object(
                S3Object::builder()
                    .bucket(&self.bucket_name)
                    .name(key)
                    .build(),
            )
            .build();

        let output = self
            .client
            .detect_labels()
            .image(image)
            .max_labels(self.max_labels)
            .min_confidence(self.min_confidence)
            .send()
            .await
            .map_err(|e| TaskError::Detector(format!("Rekognition detect_labels error: {}", e)))?;

        let labels: Vec<String> = output
            .labels()
            .iter()
            .filter_map(|label| label.name().map(|n| n.to_string()))
            .collect();

        tracing::info!("Rekognition results: {:?}", labels);
        Ok(labels)
    }
}
