//! Consulta CLI entry point.

use anyhow::Result;
use clap::Parser;
use consulta::cli::{commands, Cli, Commands};
use consulta::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_ref().map(std::path::PathBuf::from);
    let mut settings = Settings::load_from(config_path.as_ref())?;
    settings.apply_env_overrides()?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("consulta={},tower_http={}", log_level, log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Execute command
    match &cli.command {
        Commands::Doctor => {
            commands::run_doctor(&settings, cli.config.as_deref())?;
        }

        Commands::Ingest => {
            commands::run_ingest(settings).await?;
        }

        Commands::Ask { question, top_k } => {
            commands::run_ask(question, *top_k, settings).await?;
        }

        Commands::Search { query, top_k } => {
            commands::run_search(query, *top_k, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, cli.config.as_deref(), settings)?;
        }
    }

    Ok(())
}
