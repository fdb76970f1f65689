use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Serialize;
use taskup_atoms::labels::{LabelDetector, LabelPolicy};
use taskup_atoms::media::BlobStore;
use taskup_atoms::tasks::{CreateTaskPayload, RecordStore, TaskView, UpdateTaskPayload};
use taskup_atoms::TaskError;

use crate::service;

/// JSON response with the permissive CORS header every endpoint carries.
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(body)?.into())
        .map_err(Box::new)?)
}

pub fn message_response(status: StatusCode, message: &str) -> Result<Response<Body>, Error> {
    json_response(status, &serde_json::json!({ "message": message }))
}

/// Map an operation failure to its response. Internal failures are logged
/// with the original error and answered with a generic body.
pub fn error_response(operation: &str, e: &TaskError) -> Result<Response<Body>, Error> {
    match e {
        e if e.is_not_found() => message_response(StatusCode::NOT_FOUND, &e.to_string()),
        TaskError::InvalidRequest(message) => {
            tracing::warn!("{} rejected: {}", operation, message);
            message_response(StatusCode::BAD_REQUEST, message)
        }
        _ => {
            tracing::error!("❌ {} failed: {}", operation, e);
            message_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

fn respond<T: Serialize>(
    operation: &str,
    status: StatusCode,
    result: Result<T, TaskError>,
) -> Result<Response<Body>, Error> {
    match result {
        Ok(body) => json_response(status, &body),
        Err(e) => error_response(operation, &e),
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, TaskError> {
    Ok(serde_json::from_slice(body)?)
}

/// POST /tasks
pub async fn create_task(
    records: &dyn RecordStore,
    blobs: &dyn BlobStore,
    user_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let result = match parse_body::<CreateTaskPayload>(body) {
        Ok(payload) => service::create_task(records, blobs, user_id, payload).await,
        Err(e) => Err(e),
    };

    if let Ok(view) = &result {
        tracing::info!(
            "✅ created task: task_id={}, user_id={}, has_image={}",
            view.task.task_id,
            user_id,
            view.task.image_key.is_some()
        );
    }

    respond("create_task", StatusCode::CREATED, result)
}

/// GET /tasks
pub async fn list_tasks(
    records: &dyn RecordStore,
    blobs: &dyn BlobStore,
    user_id: &str,
) -> Result<Response<Body>, Error> {
    let result: Result<Vec<TaskView>, TaskError> =
        service::list_tasks(records, blobs, user_id).await;
    respond("list_tasks", StatusCode::OK, result)
}

/// GET /tasks/{taskId}
pub async fn get_task(
    records: &dyn RecordStore,
    blobs: &dyn BlobStore,
    user_id: &str,
    task_id: &str,
) -> Result<Response<Body>, Error> {
    let result = service::get_task(records, blobs, user_id, task_id).await;
    respond("get_task", StatusCode::OK, result)
}

/// PUT /tasks/{taskId}
pub async fn update_task(
    records: &dyn RecordStore,
    blobs: &dyn BlobStore,
    user_id: &str,
    task_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let result = match parse_body::<UpdateTaskPayload>(body) {
        Ok(payload) => service::update_task(records, blobs, user_id, task_id, payload).await,
        Err(e) => Err(e),
    };
    respond("update_task", StatusCode::OK, result)
}

/// DELETE /tasks/{taskId}
pub async fn delete_task(
    records: &dyn RecordStore,
    blobs: &dyn BlobStore,
    user_id: &str,
    task_id: &str,
) -> Result<Response<Body>, Error> {
    match service::delete_task(records, blobs, user_id, task_id).await {
        Ok(()) => Ok(Response::builder()
            .status(StatusCode::NO_CONTENT)
            .header("Access-Control-Allow-Origin", "*")
            .body(Body::Empty)
            .map_err(Box::new)?),
        Err(e) => error_response("delete_task", &e),
    }
}

/// POST /tasks/{taskId}/process-image
pub async fn process_image(
    records: &dyn RecordStore,
    detector: &dyn LabelDetector,
    user_id: &str,
    task_id: &str,
) -> Result<Response<Body>, Error> {
    let result =
        service::process_image(records, detector, user_id, task_id, LabelPolicy::Strict).await;
    respond("process_image", StatusCode::OK, result)
}
