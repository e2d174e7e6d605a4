// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::ffi::OsString;
use std::path::Path;

use crate::client::{ClientEmbedding, EmbedClient};

/// Embedding server CLI
#[derive(Parser, Debug)]
#[command(name = "embed-cli")]
#[command(version)]
#[command(about = "Query a running embedding vector server", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Loads `env_file` (or `.env` from the working directory) into the
    /// environment, then parses `args` so the env fallbacks can see it
    pub fn load_from<I, T>(args: I, env_file: Option<&Path>) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match env_file {
            Some(path) => {
                dotenv::from_path(path).ok();
            }
            None => {
                dotenv::dotenv().ok();
            }
        }
        Self::try_parse_from(args)
    }
}

#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// Base URL of the server
    #[arg(long, global = true, env = "EMBED_SERVER_URL", default_value = "http://127.0.0.1:8010")]
    pub server: String,

    /// API key forwarded to the remote backend
    #[arg(long, global = true, env = "DASHSCOPE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Print only the dimension instead of the full vector
    #[arg(long, global = true)]
    pub dimension_only: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Embed a piece of text
    Text {
        /// Text to embed
        data: String,
    },

    /// Embed an image given by URL or server-local path
    Image {
        /// Image URL or path on the server
        url: String,
    },
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let client = EmbedClient::new(&cli.connection.server)?;
    let api_key = cli.connection.api_key.as_deref();

    let embedding = match &cli.command {
        Commands::Text { data } => client.text_vector(data, api_key).await?,
        Commands::Image { url } => client.image_vector(url, api_key).await?,
    };

    println!("{}", render_output(&embedding, cli.connection.dimension_only));
    Ok(())
}

fn render_output(embedding: &ClientEmbedding, dimension_only: bool) -> String {
    if dimension_only {
        embedding.values.len().to_string()
    } else {
        format!("dimension: {}\n{}", embedding.values.len(), embedding.raw)
    }
}
