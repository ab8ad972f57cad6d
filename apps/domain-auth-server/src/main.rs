#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod authn;
mod config;
mod logging;
mod routes;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::AppConfig;
use std::path::{Path, PathBuf};

/// Domain Auth Server - domain-scoped authorization demo
#[derive(Parser)]
#[command(name = "domain-auth-server")]
#[command(about = "Domain Auth Server - domain-scoped authorization demo")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(ref path) = cli.config
        && !Path::new(path).is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.to_string_lossy());
    }

    // Layered config:
    // 1) defaults -> 2) YAML (if provided) -> 3) env (APP__*) -> 4) CLI overrides
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(cli.port, cli.verbose);

    logging::init_logging(&config.logging)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
    }
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    domain_auth::build_domain_auth(&config.domain_auth)?;
    config.socket_addr()?;
    println!("Configuration is valid");
    println!("tenants: {}", config.domain_auth.tenants.len());
    println!(
        "directory: {}",
        if config.domain_auth.directory.is_some() {
            "configured"
        } else {
            "disabled"
        }
    );
    Ok(())
}

async fn run_server(config: AppConfig) -> Result<()> {
    let auth = domain_auth::build_domain_auth(&config.domain_auth)?;
    let app = routes::router(&auth);

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Domain Auth Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Domain Auth Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
