//! Elysia concierge HTTP server
//!
//! Loads configuration, selects a generation backend and serves the
//! concierge API.

use clap::Parser;
use concierge::{
    backend,
    cli::{Cli, Command, generate_config_template},
    config::Config,
    handlers::AppState,
    telemetry,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        let template = generate_config_template();
        match output {
            Some(path) => {
                std::fs::write(&path, template)?;
                eprintln!("Wrote configuration template to {}", path);
            }
            None => print!("{}", template),
        }
        return Ok(());
    }

    let config = Config::from_file(&cli.config)?.with_process_env()?;

    telemetry::init(&config.observability.log_level);

    tracing::info!(
        config = %cli.config,
        property = %config.property.name,
        "Starting Elysia concierge on {}:{}",
        config.server.host,
        config.server.port
    );

    let selected = backend::select_backend(&config).await;
    let config = Arc::new(config);
    let state = AppState::new(Arc::clone(&config), selected)?;
    let app = concierge::app(state);

    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .unwrap_or_else(|_| std::net::IpAddr::from([0, 0, 0, 0])),
        config.server.port,
    ));

    tracing::info!("Listening on {}", addr);
    tracing::info!("Health check available at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
