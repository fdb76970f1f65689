use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::service::LabelDetector;
use crate::error::TaskError;

/// Canned detector: returns fixed labels per key, or fails on request.
#[derive(Debug, Default)]
pub struct MemoryLabelDetector {
    labels: HashMap<String, Vec<String>>,
    fallback: Vec<String>,
    fail: bool,
    calls: Mutex<Vec<String>>,
}

impl MemoryLabelDetector {
    /// Every key yields `labels`.
    pub fn returning(labels: &[&str]) -> Self {
        Self {
            fallback: labels.iter().map(|l| l.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Every call fails, as if the object were missing or the service down.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_key(mut self, key: &str, labels: &[&str]) -> Self {
        self.labels
            .insert(key.to_string(), labels.iter().map(|l| l.to_string()).collect());
        self
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl LabelDetector for MemoryLabelDetector {
    async fn detect_labels(&self, key: &str) -> Result<Vec<String>, TaskError> {
        self.calls.lock().await.push(key.to_string());
        if self.fail {
            return Err(TaskError::Detector(format!("no image at {}", key)));
        }
        Ok(self
            .labels
            .get(key)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone()))
    }
}
