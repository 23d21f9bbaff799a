// Silk Progress - Web Server
// Server-rendered dashboard with Axum

use anyhow::{Context, Result};
use silk_progress::web::{router, AppState};
use silk_progress::{Config, Database};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.default_log_filter())),
        )
        .init();

    println!("🌐 Silk Progress - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Open database (created on first run)
    let db = Database::open(&config.database_path)?;
    println!("✓ Database opened: {:?}", config.database_path);
    tracing::info!(environment = %config.environment, "configuration loaded");

    let addr = config.bind_addr.clone();
    let app = router(AppState::new(db, config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   Dashboard: http://{}/dashboard", addr);
    println!("   Login:     http://{}/login", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
