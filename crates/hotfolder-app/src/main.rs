// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Hotfolder: prints every document dropped into `<root>/upload/`.
//
// Entry point. Initialises logging, reads configuration from the environment,
// and runs the intake pipeline until ctrl-c.

mod daemon;

use std::process::ExitCode;

use hotfolder_core::DaemonConfig;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Hotfolder starting");

    let config = match DaemonConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        printer = %config.printer_uri(),
        root = %config.file_root.display(),
        strategy = ?config.strategy,
        "configuration loaded"
    );

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("interrupt received, shutting down"),
                Err(e) => tracing::error!(error = %e, "cannot listen for ctrl-c, shutting down"),
            }
            cancel.cancel();
        }
    });

    match daemon::run(config, cancel).await {
        Ok(()) => {
            tracing::info!("Hotfolder stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Hotfolder failed");
            ExitCode::FAILURE
        }
    }
}
