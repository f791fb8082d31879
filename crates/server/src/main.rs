use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod api;
mod collect;
mod config;

use config::{AppState, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "mosaiq")]
#[command(about = "Multi-source metrics gateway for dashboarding tools", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "mosaiq.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP gateway
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,
    },
    /// Collect one cycle from every source and dump it as JSON
    Collect {
        /// Output file for the snapshot
        #[arg(short, long, default_value = "multi_source_data.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mosaiq=info,tower_http=debug".into()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let config = ServerConfig::load(&args.config)?;
    let state = AppState::new(&config).await?;

    match args.command {
        Command::Serve { host, port } => {
            let addr = format!("{host}:{port}");
            tracing::info!("Starting gateway on {}", addr);
            api::serve(&addr, state).await?;
        }
        Command::Collect { output } => {
            collect::run(&state, &output).await?;
        }
    }

    Ok(())
}
