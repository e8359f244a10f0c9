use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{backend, optional_str, required_str};
use crate::ipc::types::{AppState, Request};
use crate::roster::{self, Student};
use crate::store::ROSTER;
use base64::Engine;
use serde_json::json;

struct PhotoUpload {
    mime_type: String,
    bytes: Vec<u8>,
}

fn parse_photo(params: &serde_json::Value) -> Result<Option<PhotoUpload>, HandlerErr> {
    let Some(photo) = params.get("photo").filter(|v| !v.is_null()) else {
        return Ok(None);
    };
    let data = photo
        .get("dataBase64")
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params("photo.dataBase64 must be a string"))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| HandlerErr::bad_params(format!("photo.dataBase64 is not base64: {}", e)))?;
    if bytes.is_empty() {
        return Ok(None);
    }
    let mime_type = optional_str(photo, "mimeType")
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| "image/jpeg".to_string());
    Ok(Some(PhotoUpload { mime_type, bytes }))
}

fn students_list(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let backend = backend(state)?;
    let rows = backend
        .sheets
        .read_rows(&ROSTER, 2)
        .map_err(|e| HandlerErr::store("fetch data", e))?;
    let students: Vec<Student> = rows.iter().map(|r| roster::student_from_row(r)).collect();
    Ok(json!({ "students": students }))
}

fn students_create(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let name = required_str(params, "name")
        .map_err(|_| HandlerErr::bad_params("Name and Class are required"))?;
    let class_name = required_str(params, "className")
        .map_err(|_| HandlerErr::bad_params("Name and Class are required"))?;
    let photo = parse_photo(params)?;
    let backend = backend(state)?;

    let now_ms = chrono::Utc::now().timestamp_millis();
    let photo_url = match photo {
        Some(p) => backend
            .photos
            .upload(&format!("{}_{}.jpg", name, now_ms), &p.mime_type, p.bytes)
            .map_err(|e| HandlerErr::store("add student", e))?,
        None => String::new(),
    };

    let student = Student {
        id: now_ms.to_string(),
        name,
        class_name,
        photo_url,
    };
    backend
        .sheets
        .append_row(&ROSTER, &roster::student_to_cells(&student))
        .map_err(|e| HandlerErr::store("add student", e))?;

    tracing::info!(name = %student.name, class = %student.class_name, "student added");
    Ok(json!({ "success": true, "student": student }))
}

fn students_delete(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let name = required_str(params, "name").map_err(|_| HandlerErr::bad_params("Name is required"))?;
    let class_name = optional_str(params, "className");
    let backend = backend(state)?;

    // Header row included, so indexes line up with 0-based sheet rows.
    let rows = backend
        .sheets
        .read_rows(&ROSTER, 1)
        .map_err(|e| HandlerErr::store("delete student", e))?;
    if rows.is_empty() {
        return Err(HandlerErr::new("not_found", "No data found"));
    }
    let Some(index) = roster::find_student_row(&rows, &name, class_name.as_deref()) else {
        return Err(HandlerErr::new("not_found", "Student not found")
            .with_details(json!({ "name": name, "className": class_name })));
    };

    backend
        .sheets
        .delete_row(&ROSTER, index)
        .map_err(|e| HandlerErr::store("delete student", e))?;

    tracing::info!(name = %name, row = index + 1, "student removed");
    Ok(json!({ "success": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "students.list" => students_list(state),
        "students.create" => students_create(state, &req.params),
        "students.delete" => students_delete(state, &req.params),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
