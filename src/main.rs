// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use rusqlite::Connection;
use silk_progress::{fetch_progress, seed_database, setup_database, Config};
use silk_progress::entities::format_percentage;
use std::env;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let conn = open_database(&config)?;

    match env::args().nth(1).as_deref() {
        Some("seed") => run_seed(conn)?,
        Some("status") => run_status(&conn)?,
        Some(other) => {
            eprintln!("❌ Unknown command: {}", other);
            eprintln!("   Usage: silk-progress [seed|status]");
            std::process::exit(2);
        }
        // UI mode (default)
        None => run_ui_mode(conn)?,
    }

    Ok(())
}

fn open_database(config: &Config) -> Result<Connection> {
    let conn = Connection::open(&config.database_path)
        .with_context(|| format!("Failed to open database at {}", config.database_path.display()))?;
    setup_database(&conn).context("Failed to initialize schema")?;
    Ok(conn)
}

fn run_seed(mut conn: Connection) -> Result<()> {
    println!("🌱 Seeding Silk Progress database");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let report = seed_database(&mut conn)?;

    println!("✓ Users:     {}", report.users);
    println!("✓ Customers: {}", report.customers);
    println!("✓ Invoices:  {}", report.invoices);
    println!("✓ Revenue:   {}", report.revenue);
    println!("\n📦 Collectibles");
    for (category, rows) in &report.collectibles {
        println!("   {:<16} {}", category.label(), rows);
    }
    println!("\n✅ {} collectible rows written", report.collectible_rows());

    Ok(())
}

fn run_status(conn: &Connection) -> Result<()> {
    let summary = fetch_progress(conn)?;

    println!("🧵 Collection Progress");
    println!("━━━━━━━━━━━━━━━━━━━━━━");
    for progress in &summary.categories {
        println!(
            "   {:<16} {:>3} / {:<3} {:>3}%   +{}%",
            progress.category.label(),
            progress.counts.collected,
            progress.counts.total,
            progress.counts.percentage(),
            format_percentage(progress.collected_percentage),
        );
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━");
    println!("🎯 Total completion: {}%", format_percentage(summary.total_percentage()));

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(conn: Connection) -> Result<()> {
    println!("🖥️  Loading Silk Progress dashboard...\n");

    let mut app = ui::App::new(conn)?;
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_conn: Connection) -> Result<()> {
    eprintln!("❌ TUI feature not enabled!");
    eprintln!("   Run: silk-progress status");
    eprintln!("   or build with: cargo build --features tui");
    std::process::exit(1);
}
