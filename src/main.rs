mod backup;
mod config;
mod db;
mod drive_url;
mod http;
mod ipc;
mod kst;
mod roster;
mod store;

use std::io::{self, BufRead, Write};

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    // stdout carries the protocol; logs go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn run_stdio(mut state: ipc::AppState) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                tracing::warn!(error = %e, "unparseable request line");
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}

fn main() {
    let cli = config::Cli::parse();
    init_tracing();

    let mut state = ipc::AppState::new(cli.admin_pin.clone());
    match config::initial_backend(&cli) {
        Ok(Some((backend, workspace))) => {
            tracing::info!(backend = backend.kind.as_str(), "backend connected at startup");
            state.backend = Some(backend);
            state.workspace = workspace;
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "failed to connect configured backend");
            std::process::exit(2);
        }
    }

    match cli.command {
        Some(config::Command::Serve { listen }) => {
            if let Err(e) = http::serve(state, listen) {
                tracing::error!(error = %format!("{e:#}"), "http server stopped");
                std::process::exit(1);
            }
        }
        None => run_stdio(state),
    }
}
