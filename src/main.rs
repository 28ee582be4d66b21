// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use accord_vault::{
    api::router,
    config::{LogFormat, VaultConfig, DEFAULT_LOG_FILTER},
    state::AppState,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal(token: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
    token.cancel();
}

#[tokio::main]
async fn main() {
    let config = VaultConfig::from_env().expect("Invalid configuration");
    init_tracing(config.log_format);

    let state = AppState::from_config(&config)
        .await
        .expect("Failed to initialize vault state");

    let shutdown = CancellationToken::new();
    let listener_task = tokio::spawn(state.list.clone().run(shutdown.clone()));

    let app = router(state);
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listen address");

    info!(
        %addr,
        chain_id = config.target_chain_id,
        "Accord Vault listening (docs at /docs)"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .expect("HTTP server failed");

    if let Err(e) = listener_task.await {
        error!(error = %e, "Vault list listener panicked");
    }
    info!("Accord Vault stopped");
}
