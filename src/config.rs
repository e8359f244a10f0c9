use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Parser, Subcommand};

use crate::store::{Backend, GoogleConfig};

/// Attendance sidecar for the church school front desk.
///
/// Without a subcommand it speaks line-delimited JSON on stdin/stdout.
#[derive(Debug, Parser)]
#[command(name = "rollcalld", version)]
pub struct Cli {
    /// Local workspace directory (SQLite sheets + photo files).
    #[arg(long, env = "ROLLCALL_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Spreadsheet id; selects the Google backend.
    #[arg(long, env = "GOOGLE_SHEET_ID")]
    pub google_sheet_id: Option<String>,

    #[arg(long, env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
    pub google_access_token: Option<String>,

    #[arg(long, env = "ROLLCALL_ADMIN_PIN", default_value = "0000", hide_env_values = true)]
    pub admin_pin: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the REST API over HTTP.
    Serve {
        #[arg(long, env = "ROLLCALL_LISTEN", default_value = "127.0.0.1:8080")]
        listen: SocketAddr,
    },
}

/// Backend to connect at startup, if any. The Google backend wins when both are configured.
pub fn initial_backend(cli: &Cli) -> anyhow::Result<Option<(Backend, Option<PathBuf>)>> {
    if let Some(sheet_id) = cli.google_sheet_id.as_ref().filter(|s| !s.trim().is_empty()) {
        let token = cli
            .google_access_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| anyhow!("GOOGLE_SHEET_ID is set but GOOGLE_ACCESS_TOKEN is not"))?;
        if cli.workspace.is_some() {
            tracing::warn!("both a workspace and a spreadsheet are configured; using the spreadsheet");
        }
        let backend = Backend::google(GoogleConfig {
            spreadsheet_id: sheet_id.trim().to_string(),
            access_token: token,
        })?;
        return Ok(Some((backend, None)));
    }
    if let Some(path) = cli.workspace.as_ref() {
        let backend = Backend::local(path)?;
        return Ok(Some((backend, Some(path.clone()))));
    }
    Ok(None)
}
