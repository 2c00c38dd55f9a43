//! gallery: command-line front-end for the R2 gallery uploader.
//!
//! Uploads images, lists and deletes stored files, reorders the gallery,
//! and manages categories against the upload API. Output is JSON on stdout;
//! logs go to stderr.

mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use gallery_client::HttpDirectoryClient;

use crate::commands::Session;
use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "gallery")]
#[command(author, version, about = "Upload and arrange images in the R2 gallery")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the upload API is reachable
    Health,

    /// List the gallery in display order
    List,

    /// Upload image files
    Upload {
        /// Files to upload (non-images are skipped)
        #[arg(required = true, num_args = 1..)]
        paths: Vec<PathBuf>,

        /// Category to tag the uploads with (repeatable; default: Library)
        #[arg(short = 'c', long = "category")]
        categories: Vec<String>,
    },

    /// Delete a stored file by key
    Delete {
        key: String,
    },

    /// Move a gallery item and save the new order (positions start at 1)
    Move {
        from: usize,
        to: usize,
    },

    /// Manage categories
    #[command(subcommand)]
    Categories(CategoryCommands),
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// List categories
    List,

    /// Create a category
    Add {
        title: String,
    },

    /// Delete a category by id
    Remove {
        id: String,
    },

    /// Move a category and save the new order (positions start at 1)
    Move {
        from: usize,
        to: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => {
            match serde_json::to_string_pretty(&output) {
                Ok(text) => println!("{}", text),
                Err(_) => println!("{}", output),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging.
///
///   LOG_FORMAT - "json" or "text" (default: "text")
///   RUST_LOG   - standard env filter (default: "gallery=info")
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gallery=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    if log_format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<serde_json::Value> {
    let config = AppConfig::from_env()?;
    info!(
        url = %config.client.base_url,
        configured = config.client.is_configured(),
        static_entries = config.static_entries.len(),
        "Configuration loaded"
    );

    let directory = Arc::new(HttpDirectoryClient::new(config.client)?);
    let session = Session::new(directory, config.static_entries);

    match cli.command {
        Commands::Health => session.health().await,
        Commands::List => session.list().await,
        Commands::Upload { paths, categories } => session.upload(&paths, &categories).await,
        Commands::Delete { key } => session.delete(&key).await,
        Commands::Move { from, to } => session.move_item(from, to).await,
        Commands::Categories(cmd) => match cmd {
            CategoryCommands::List => session.categories().await,
            CategoryCommands::Add { title } => session.add_category(&title).await,
            CategoryCommands::Remove { id } => session.remove_category(&id).await,
            CategoryCommands::Move { from, to } => session.move_category(from, to).await,
        },
    }
}
