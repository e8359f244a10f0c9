use std::path::PathBuf;

use serde::Deserialize;

use crate::store::Backend;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl Request {
    pub fn new(id: impl Into<String>, method: &str, params: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            method: method.to_string(),
            params,
        }
    }
}

pub struct AppState {
    /// Set when the local backend is in use.
    pub workspace: Option<PathBuf>,
    pub backend: Option<Backend>,
    pub admin_pin: String,
}

impl AppState {
    pub fn new(admin_pin: impl Into<String>) -> Self {
        Self {
            workspace: None,
            backend: None,
            admin_pin: admin_pin.into(),
        }
    }
}
