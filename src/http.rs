use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::ipc::{self, AppState, Request};

type Shared = Arc<Mutex<AppState>>;

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub struct ApiError {
    status: StatusCode,
    message: String,
    details: Value,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: Value::Null,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({ "error": self.message });
        if !self.details.is_null() {
            body["details"] = self.details;
        }
        (self.status, Json(body)).into_response()
    }
}

pub fn status_for_code(code: &str) -> StatusCode {
    match code {
        "bad_params" | "bad_json" => StatusCode::BAD_REQUEST,
        "not_found" => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Unwraps a method-call envelope into the HTTP result.
pub fn envelope_to_result(resp: Value) -> Result<Value, ApiError> {
    if resp.get("ok").and_then(|v| v.as_bool()) == Some(true) {
        return Ok(resp.get("result").cloned().unwrap_or(Value::Null));
    }
    let error = resp.get("error").cloned().unwrap_or(Value::Null);
    let code = error.get("code").and_then(|v| v.as_str()).unwrap_or("internal");
    Err(ApiError {
        status: status_for_code(code),
        message: error
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("request failed")
            .to_string(),
        details: error.get("details").cloned().unwrap_or(Value::Null),
    })
}

/// Malformed or missing JSON bodies get the same error shape as handler errors.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(v)| v)
        .map_err(|e| ApiError::new(status_for_code("bad_json"), e.body_text()))
}

/// Runs one method on the blocking pool; store calls are synchronous.
async fn call(shared: Shared, method: &'static str, params: Value) -> Result<Value, ApiError> {
    let resp = tokio::task::spawn_blocking(move || {
        let mut state = shared.lock();
        ipc::handle_request(&mut state, Request::new("http", method, params))
    })
    .await
    .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    envelope_to_result(resp)
}

async fn health(State(shared): State<Shared>) -> Result<Json<Value>, ApiError> {
    call(shared, "health", json!({})).await.map(Json)
}

async fn students_list(State(shared): State<Shared>) -> Result<Json<Value>, ApiError> {
    call(shared, "students.list", json!({})).await.map(Json)
}

async fn students_create(
    State(shared): State<Shared>,
    mut form: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut params = json!({});
    let bad_form = |e: axum::extract::multipart::MultipartError| {
        ApiError::new(StatusCode::BAD_REQUEST, format!("invalid form data: {}", e))
    };
    while let Some(field) = form.next_field().await.map_err(bad_form)? {
        let Some(name) = field.name().map(|s| s.to_string()) else {
            continue;
        };
        match name.as_str() {
            "name" | "className" => {
                params[name.as_str()] = Value::String(field.text().await.map_err(bad_form)?);
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let mime_type = field.content_type().unwrap_or("image/jpeg").to_string();
                let bytes = field.bytes().await.map_err(bad_form)?;
                if !bytes.is_empty() {
                    params["photo"] = json!({
                        "fileName": file_name,
                        "mimeType": mime_type,
                        "dataBase64": base64::engine::general_purpose::STANDARD.encode(&bytes),
                    });
                }
            }
            _ => {}
        }
    }
    call(shared, "students.create", params).await.map(Json)
}

async fn students_delete(
    State(shared): State<Shared>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    call(shared, "students.delete", json_body(body)?).await.map(Json)
}

async fn attendance_list(State(shared): State<Shared>) -> Result<Json<Value>, ApiError> {
    call(shared, "attendance.list", json!({})).await.map(Json)
}

async fn attendance_record(
    State(shared): State<Shared>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    call(shared, "attendance.record", json_body(body)?).await.map(Json)
}

async fn attendance_today(State(shared): State<Shared>) -> Result<Json<Value>, ApiError> {
    call(shared, "attendance.today", json!({})).await.map(Json)
}

async fn admin_unlock(
    State(shared): State<Shared>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    call(shared, "admin.unlock", json_body(body)?).await.map(Json)
}

async fn image_proxy(
    State(shared): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let Some(url) = query.get("url").filter(|u| !u.trim().is_empty()).cloned() else {
        return (StatusCode::BAD_REQUEST, "Missing URL parameter").into_response();
    };
    let result = match call(shared, "photos.fetch", json!({ "url": url })).await {
        Ok(v) => v,
        // Behave like a failed proxy.
        Err(_) => return Redirect::temporary(&url).into_response(),
    };
    if let Some(target) = result.get("redirect").and_then(|v| v.as_str()) {
        return Redirect::temporary(target).into_response();
    }

    let bytes = match result
        .get("dataBase64")
        .and_then(|v| v.as_str())
        .map(|s| base64::engine::general_purpose::STANDARD.decode(s))
    {
        Some(Ok(b)) => b,
        _ => return Redirect::temporary(&url).into_response(),
    };
    let content_type = result
        .get("contentType")
        .and_then(|v| v.as_str())
        .unwrap_or("image/jpeg")
        .to_string();
    let cache_control = result
        .get("cacheControl")
        .and_then(|v| v.as_str())
        .unwrap_or("no-cache")
        .to_string();
    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, cache_control),
        ],
        bytes,
    )
        .into_response()
}

pub fn router(shared: Shared) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/students",
            get(students_list).post(students_create).delete(students_delete),
        )
        .route("/api/attendance", get(attendance_list).post(attendance_record))
        .route("/api/attendance/today", get(attendance_today))
        .route("/api/admin/unlock", post(admin_unlock))
        .route("/api/image", get(image_proxy))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(shared)
}

pub fn serve(state: AppState, listen: SocketAddr) -> anyhow::Result<()> {
    let shared: Shared = Arc::new(Mutex::new(state));
    let app = router(shared.clone());

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(listen)
            .await
            .with_context(|| format!("failed to bind {}", listen))?;
        tracing::info!("http start on {}", listen);
        axum::serve(listener, app).await.context("http server failed")
    })?;
    drop(shared);
    Ok(())
}
