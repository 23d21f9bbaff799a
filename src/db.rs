// 🗄️ Storage - SQLite connection, schema, shared handle

use crate::entities::Category;
use crate::error::{DbError, DbResult};
use anyhow::{Context, Result};
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Name of the SQL function used by every search query.
///
/// `contains_ci(haystack, needle)` is a Unicode-aware, case-insensitive
/// substring test. SQLite's own LIKE only folds ASCII, so "brújula" would
/// never match "BRÚJULA" without it.
pub const CONTAINS_CI: &str = "contains_ci";

/// Generate a new opaque row identity
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ============================================================================
// SHARED HANDLE
// ============================================================================

/// One connection shared by every request.
///
/// Callers get the connection only inside `with_conn`, so a lock is never
/// held across an `.await`.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file and make sure the schema exists
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        setup_database(&conn).context("Failed to initialize schema")?;
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Database {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    pub fn with_conn<T, F>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&mut Connection) -> DbResult<T>,
    {
        let mut guard = self.conn.lock().map_err(|_| DbError::Unavailable)?;
        f(&mut guard)
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

/// Connection-level setup plus `CREATE TABLE IF NOT EXISTS` for every table.
///
/// Must run on every new connection: it also registers `contains_ci`.
pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    register_functions(conn)?;

    // ==========================================================================
    // Demonstration schema: users, customers, invoices, revenue
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY NOT NULL,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            expires_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS customers (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            image_url TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS invoices (
            id TEXT PRIMARY KEY NOT NULL,
            customer_id TEXT NOT NULL REFERENCES customers(id),
            amount INTEGER NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('pending', 'paid')),
            date TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS revenue (
            month TEXT NOT NULL UNIQUE,
            revenue INTEGER NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Collectibles: one identically-shaped table per category
    // ==========================================================================
    for category in Category::ALL {
        create_collectible_table(conn, category)?;
    }

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_invoices_customer ON invoices(customer_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_invoices_date ON invoices(date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)",
        [],
    )?;

    Ok(())
}

/// Create one collectible table (and its name index) if it is missing
pub fn create_collectible_table(conn: &Connection, category: Category) -> rusqlite::Result<()> {
    let table = category.table();

    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id TEXT PRIMARY KEY NOT NULL,
                name TEXT NOT NULL CHECK (length(trim(name)) > 0),
                status TEXT NOT NULL CHECK (status IN ('pending', 'collected')),
                notes TEXT NOT NULL DEFAULT '',
                percentage REAL NOT NULL DEFAULT {default} CHECK (percentage > 0)
            )",
            default = category.default_percentage(),
        ),
        [],
    )?;

    conn.execute(
        &format!("CREATE INDEX IF NOT EXISTS idx_{table}_name ON {table}(name)"),
        [],
    )?;

    Ok(())
}

fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        CONTAINS_CI,
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let haystack: Option<String> = ctx.get(0)?;
            let needle: Option<String> = ctx.get(1)?;

            Ok(match (haystack, needle) {
                (_, None) => true,
                (None, Some(needle)) => needle.is_empty(),
                (Some(haystack), Some(needle)) => {
                    haystack.to_lowercase().contains(&needle.to_lowercase())
                }
            })
        },
    )
}

/// Count rows in a table (used by seeding reports and tests)
pub fn count_rows(conn: &Connection, table: &str) -> DbResult<i64> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .map_err(DbError::query(format!("count {table}")))
}
