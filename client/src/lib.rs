//! HTTP client for the task API.
//!
//! Covers the six endpoints plus the direct-to-storage upload: the API hands
//! out a signed URL and the bytes go straight to the blob store, never
//! through the handler.

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use taskup_atoms::labels::LabelPolicy;
use taskup_atoms::tasks::{CreateTaskPayload, Task, TaskView, UpdateTaskPayload};
use taskup_atoms::TaskError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("{0}")]
    Task(#[from] TaskError),
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

#[derive(Debug, Clone)]
pub struct TaskClient {
    http: reqwest::Client,
    base_url: String,
    identity: String,
    identity_header: String,
    label_policy: LabelPolicy,
}

impl TaskClient {
    /// Client acting as `identity`. Label detection after an upload is
    /// best-effort by default (`LabelPolicy::Tolerant`).
    pub fn new(base_url: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            identity: identity.into(),
            identity_header: "Authorization".to_string(),
            label_policy: LabelPolicy::Tolerant,
        }
    }

    pub fn with_identity_header(mut self, header: impl Into<String>) -> Self {
        self.identity_header = header.into();
        self
    }

    pub fn with_label_policy(mut self, policy: LabelPolicy) -> Self {
        self.label_policy = policy;
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header(self.identity_header.as_str(), self.identity.as_str())
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<MessageBody>(&text)
            .map(|b| b.message)
            .unwrap_or(text);
        Err(ClientError::Status { status, message })
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        Ok(self.execute(request).await?.json().await?)
    }

    pub async fn list_tasks(&self) -> Result<Vec<TaskView>, ClientError> {
        self.json(self.request(reqwest::Method::GET, "/tasks")).await
    }

    pub async fn get_task(&self, task_id: &str) -> Result<TaskView, ClientError> {
        self.json(self.request(reqwest::Method::GET, &format!("/tasks/{}", task_id)))
            .await
    }

    pub async fn create_task(&self, payload: &CreateTaskPayload) -> Result<TaskView, ClientError> {
        self.json(self.request(reqwest::Method::POST, "/tasks").json(payload))
            .await
    }

    pub async fn update_task(
        &self,
        task_id: &str,
        payload: &UpdateTaskPayload,
    ) -> Result<TaskView, ClientError> {
        self.json(
            self.request(reqwest::Method::PUT, &format!("/tasks/{}", task_id))
                .json(payload),
        )
        .await
    }

    pub async fn delete_task(&self, task_id: &str) -> Result<(), ClientError> {
        self.execute(self.request(reqwest::Method::DELETE, &format!("/tasks/{}", task_id)))
            .await?;
        Ok(())
    }

    pub async fn process_image(&self, task_id: &str) -> Result<Task, ClientError> {
        self.json(self.request(
            reqwest::Method::POST,
            &format!("/tasks/{}/process-image", task_id),
        ))
        .await
    }

    /// PUT the bytes to a signed upload URL. The identity header is not
    /// sent; the URL carries its own authorisation.
    pub async fn upload_image(
        &self,
        upload_url: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ClientError> {
        tracing::debug!("Uploading {} bytes ({}) to signed URL", bytes.len(), content_type);
        self.execute(
            self.http
                .put(upload_url)
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(bytes),
        )
        .await?;
        Ok(())
    }

    /// Create a task with an attachment: create, upload, then label.
    ///
    /// `payload.filename` names the attachment; `hasImage` is set here.
    pub async fn create_task_with_image(
        &self,
        mut payload: CreateTaskPayload,
        bytes: Vec<u8>,
    ) -> Result<TaskView, ClientError> {
        payload.has_image = true;
        let content_type = content_type_of(&payload.file_type);
        let view = self.create_task(&payload).await?;
        self.upload_and_label(view, bytes, &content_type).await
    }

    /// Replace a task's attachment: update, upload, then label.
    pub async fn update_task_with_image(
        &self,
        task_id: &str,
        mut payload: UpdateTaskPayload,
        bytes: Vec<u8>,
    ) -> Result<TaskView, ClientError> {
        payload.has_new_image = true;
        let content_type = content_type_of(&payload.file_type);
        let view = self.update_task(task_id, &payload).await?;
        self.upload_and_label(view, bytes, &content_type).await
    }

    async fn upload_and_label(
        &self,
        mut view: TaskView,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<TaskView, ClientError> {
        let Some(upload_url) = view.image_upload_url.clone() else {
            return Ok(view);
        };
        self.upload_image(&upload_url, bytes, content_type).await?;

        let task_id = view.task.task_id.clone();
        tracing::debug!("Uploaded image for task {}, requesting labels", task_id);
        let outcome = self
            .process_image(&task_id)
            .await
            .map(|task| task.image_labels)
            .map_err(|e| TaskError::Detector(e.to_string()));
        view.task.image_labels = self.label_policy.apply(&task_id, outcome)?;
        Ok(view)
    }
}

fn content_type_of(file_type: &Option<String>) -> String {
    file_type
        .clone()
        .unwrap_or_else(|| taskup_atoms::media::DEFAULT_CONTENT_TYPE.to_string())
}
