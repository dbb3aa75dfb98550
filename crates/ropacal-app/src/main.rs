// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ropacal: dual-surface navigation host
//
// Entry point. Loads configuration, initialises logging, brings up the
// navigation host and replays a recorded session (a file argument, or stdin)
// through the UI-thread event loop. Each outcome is printed as one JSON line.

mod services;

use std::io::Write;
use std::process::ExitCode;

use ropacal_bridge::NavigationHost;
use ropacal_core::config::API_KEY_ENV;
use ropacal_core::{HostConfig, RopacalError};

use services::script::Script;
use services::ui_loop;

fn main() -> ExitCode {
    let config = match HostConfig::from_env_or_default() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ropacal-host: configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    tracing::info!("Ropacal navigation host starting");

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(RopacalError::MissingCredential) => {
            tracing::error!("no maps API key configured");
            eprintln!("ropacal-host: set {API_KEY_ENV} or maps_api_key in the config file");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "host failed");
            ExitCode::FAILURE
        }
    }
}

fn run(config: HostConfig) -> ropacal_core::error::Result<()> {
    let script = match std::env::args().nth(1) {
        Some(path) => {
            tracing::info!(%path, "replaying session script");
            Script::load(path)?
        }
        None => Script::from_reader(std::io::stdin().lock())?,
    };

    let host = NavigationHost::new(config, ropacal_bridge::desktop_sdk())?;

    // One thread: the host is only ever touched from the UI loop.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(ui_loop::replay(host, script));

    let mut out = std::io::stdout().lock();
    for record in &report.outcomes {
        serde_json::to_writer(&mut out, record)?;
        writeln!(out)?;
    }
    tracing::info!(
        outcomes = report.outcomes.len(),
        engine = ?report.engine_state,
        attached = ?report.attached_surface,
        diagnostics = report.diagnostics,
        "session finished"
    );
    Ok(())
}
