use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

// A UI gate for the dashboard, not authentication.
fn handle_admin_unlock(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(pin) = req.params.get("pin").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing pin", None);
    };
    let unlocked = pin.trim() == state.admin_pin;
    if !unlocked {
        tracing::info!("admin unlock rejected");
    }
    ok(&req.id, json!({ "unlocked": unlocked }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "admin.unlock" => Some(handle_admin_unlock(state, req)),
        _ => None,
    }
}
