use crate::ipc::error::{err, ok};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use crate::store::{Backend, GoogleConfig};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "backend": state.backend.as_ref().map(|b| b.kind.as_str()),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match Backend::local(&path) {
        Ok(backend) => {
            tracing::info!(workspace = %path.to_string_lossy(), "local workspace opened");
            state.workspace = Some(path.clone());
            state.backend = Some(backend);
            ok(&req.id, json!({ "workspacePath": path.to_string_lossy() }))
        }
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

fn handle_workspace_connect_google(state: &mut AppState, req: &Request) -> serde_json::Value {
    let spreadsheet_id = match required_str(&req.params, "spreadsheetId") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let access_token = match required_str(&req.params, "accessToken") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    match Backend::google(GoogleConfig {
        spreadsheet_id: spreadsheet_id.clone(),
        access_token,
    }) {
        Ok(backend) => {
            tracing::info!(spreadsheet_id = %spreadsheet_id, "google backend connected");
            state.workspace = None;
            state.backend = Some(backend);
            ok(&req.id, json!({ "spreadsheetId": spreadsheet_id }))
        }
        Err(e) => err(&req.id, "connect_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "workspace.connectGoogle" => Some(handle_workspace_connect_google(state, req)),
        _ => None,
    }
}
