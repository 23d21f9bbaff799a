// Silk Progress - Core Library
// Exposes all modules for use in the CLI, the web server, and tests

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod pagination;
pub mod progress;
pub mod schema;     // Form validation
pub mod seed;

#[cfg(feature = "server")]
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError, Environment};
pub use db::{count_rows, setup_database, Database};
pub use entities::{
    Category, Collectible, CollectibleCounts, CollectibleStatus, NewCollectible,
    Customer, InvoiceStatus, NewInvoice, User,
};
pub use error::{DbError, DbResult};
pub use progress::{fetch_progress, CategoryProgress, ProgressSummary};
pub use schema::{validate_collectible, validate_invoice, CollectibleForm, FormAction, FormState};
pub use seed::{seed_database, SeedReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
