// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use embed_vec_server::{
    api::{start_server, AppState},
    config::ServerArgs,
    version,
};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads env fallbacks
    dotenv::dotenv().ok();

    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let args = ServerArgs::parse();

    tracing::info!("Starting {}", version::get_version_string());
    tracing::info!("Backend: {:?}", args.backend);

    let addr = args.socket_addr()?;
    let backend = args.build_backend().await?;
    tracing::info!(
        "Backend {} ready, serving {}",
        backend.name(),
        version::ENDPOINTS.join(", ")
    );

    start_server(addr, AppState::new(backend)).await
}
