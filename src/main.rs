// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Inquiry Gateway Service
//!
//! Serves the public contact and RFP notification endpoints plus the
//! authenticated sitemap trigger.
//!
//! ## Configuration
//!
//! Values come from `.env`, an optional file named by `GATEWAY_CONFIG`,
//! and `GATEWAY_*` environment variables (nested keys joined by `__`):
//!
//! - `GATEWAY_BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `GATEWAY_RATE_LIMIT__MAX_REQUESTS`: Requests per window (default: 50)
//! - `GATEWAY_RATE_LIMIT__WINDOW_SECS`: Window length (default: 60)
//! - `GATEWAY_NOTIFY__STAFF_RECIPIENTS`: Comma-separated staff mailboxes
//! - `GATEWAY_EMAIL__PROVIDER` / `GATEWAY_EMAIL__API_KEY`: Email provider
//! - `GATEWAY_STORE__BACKEND` / `GATEWAY_STORE__URL` / `GATEWAY_STORE__SERVICE_KEY`
//! - `GATEWAY_SITEMAP__TOKENS`: Comma-separated bearer tokens

use inquiry_gateway::{handlers::router, AppState, Config};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::load()?;
    info!(
        bind_addr = %config.bind_addr,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        email_provider = ?config.email.provider,
        store_backend = ?config.store.backend,
        "Starting inquiry gateway"
    );

    let addr: SocketAddr = config.bind_addr.parse()?;
    let state = Arc::new(AppState::from_config(config)?);
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
