// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use embed_vec_server::cli::{execute, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is loaded before clap reads env fallbacks
    let cli = Cli::load_from(std::env::args_os(), None).unwrap_or_else(|e| e.exit());

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "warn");
    }
    tracing_subscriber::fmt::init();

    match execute(cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
