use board_block::http as board;
use lambda_http::{
    http::{header::HeaderValue, Method, StatusCode},
    Body, Error, Request, RequestExt, Response,
};
use std::sync::Arc;
use taskup_shared::AppState;

fn with_cors_headers(mut resp: Response<Body>) -> Response<Body> {
    let headers = resp.headers_mut();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,PUT,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,Authorization"),
    );
    resp
}

/// Main Lambda handler - resolves the caller and routes to one of the six
/// task operations.
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    // REST API events carry the stage in the URI (`/prod/tasks`); route on the
    // stage-free path when the gateway supplied one.
    let path = match event.raw_http_path() {
        "" => event.uri().path(),
        raw => raw,
    };
    let body = event.body();
    tracing::info!("🚀 Task API invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if method == Method::OPTIONS {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp));
    }

    let user_id = match state.identity.caller_identity(event.headers()).await {
        Some(user_id) => user_id,
        None => {
            tracing::warn!("Rejected request without caller identity: {} {}", method, path);
            return board::message_response(StatusCode::UNAUTHORIZED, "Unauthorized");
        }
    };

    let records = state.records.as_ref();
    let blobs = state.blobs.as_ref();
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (method, parts.as_slice()) {
        // GET /tasks - list caller's tasks
        (&Method::GET, ["tasks"]) => board::list_tasks(records, blobs, &user_id).await,
        // POST /tasks - create task
        (&Method::POST, ["tasks"]) => board::create_task(records, blobs, &user_id, body).await,
        // GET /tasks/{taskId} - get task
        (&Method::GET, ["tasks", task_id]) => {
            board::get_task(records, blobs, &user_id, task_id).await
        }
        // PUT /tasks/{taskId} - full update
        (&Method::PUT, ["tasks", task_id]) => {
            board::update_task(records, blobs, &user_id, task_id, body).await
        }
        // DELETE /tasks/{taskId} - delete task and attachment
        (&Method::DELETE, ["tasks", task_id]) => {
            board::delete_task(records, blobs, &user_id, task_id).await
        }
        // POST /tasks/{taskId}/process-image - label the uploaded image
        (&Method::POST, ["tasks", task_id, "process-image"]) => {
            board::process_image(records, state.labels.as_ref(), &user_id, task_id).await
        }
        _ => {
            tracing::warn!("⚠️ No route matched - Method: {} Path: {}", method, path);
            board::message_response(StatusCode::BAD_REQUEST, "Invalid request")
        }
    }
}
