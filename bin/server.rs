// Finance Flow - Web Server
// REST API + single-page dashboard with Axum

use anyhow::{Context, Result};
use finance_flow::{server, Config, Controller, SqliteStore};
use tracing::info;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config, _rest) = Config::from_env_and_args(args)?;

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    println!("🌐 Finance Flow - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Open database
    config.ensure_db_dir()?;
    let store = SqliteStore::open(&config.db_path)
        .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?;
    info!("Database opened: {}", config.db_path.display());

    let app = server::router(Controller::new(store));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    println!("\n🚀 Server running on http://{}", config.bind);
    println!("   API: http://{}/api/dashboard", config.bind);
    println!("   UI:  http://{}", config.bind);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
    }
}
