use crate::drive_url;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{backend, required_str};
use crate::ipc::types::{AppState, Request};
use base64::Engine;
use serde_json::json;

pub const CACHE_CONTROL: &str = "public, max-age=31536000, immutable";
const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// Resolves a stored photo URL to image bytes. Anything that cannot be served
/// from the file store falls back to a redirect to the URL itself.
fn photos_fetch(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let url = required_str(params, "url").map_err(|_| HandlerErr::bad_params("Missing URL parameter"))?;

    let Some(file_id) = drive_url::extract_file_id(&url) else {
        return Ok(json!({ "redirect": url }));
    };
    let Ok(backend) = backend(state) else {
        tracing::warn!(file_id = %file_id, "no file store connected, redirecting");
        return Ok(json!({ "redirect": url }));
    };

    match backend.photos.fetch(&file_id) {
        Ok(photo) => Ok(json!({
            "fileId": file_id,
            "contentType": photo.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE),
            "cacheControl": CACHE_CONTROL,
            "dataBase64": base64::engine::general_purpose::STANDARD.encode(&photo.bytes),
        })),
        Err(e) => {
            tracing::warn!(file_id = %file_id, error = %format!("{e:#}"), "photo proxy failed, redirecting");
            Ok(json!({ "redirect": url }))
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "photos.fetch" => Some(respond(&req.id, photos_fetch(state, &req.params))),
        _ => None,
    }
}
