// 🔑 User Entity - credentials and login sessions

use crate::db::new_id;
use crate::error::{DbError, DbResult};
use chrono::{Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// How long a login stays valid
pub const SESSION_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// bcrypt hash, never serialized
    #[serde(skip)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub expires_at: String,
}

// ============================================================================
// PASSWORDS
// ============================================================================

/// bcrypt work factor (cheap in unit tests)
const HASH_COST: u32 = if cfg!(test) { 4 } else { 10 };

/// bcrypt hash of a password, salt and cost included
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, HASH_COST)
}

/// False for a wrong password and for a stored value that is not a bcrypt hash
pub fn verify_password(password: &str, stored: &str) -> bool {
    bcrypt::verify(password, stored).unwrap_or(false)
}

/// Session tokens are stored as their SHA-256 digest; the cookie carries the raw token
fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// USERS
// ============================================================================

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
    })
}

/// Insert a user with an already-hashed password. Existing ids or emails are left alone.
pub fn insert_user(conn: &Connection, user: &User) -> DbResult<usize> {
    conn.execute(
        "INSERT OR IGNORE INTO users (id, name, email, password) VALUES (?1, ?2, ?3, ?4)",
        params![user.id, user.name, user.email, user.password],
    )
    .map_err(DbError::query("Create User"))
}

pub fn find_by_email(conn: &Connection, email: &str) -> DbResult<Option<User>> {
    conn.query_row(
        "SELECT id, name, email, password FROM users WHERE email = ?1",
        params![email],
        user_from_row,
    )
    .optional()
    .map_err(DbError::query("fetch user"))
}

/// The user, when the email exists and the password matches
pub fn authenticate(conn: &Connection, email: &str, password: &str) -> DbResult<Option<User>> {
    let user = find_by_email(conn, email.trim())?;
    Ok(user.filter(|u| verify_password(password, &u.password)))
}

// ============================================================================
// SESSIONS
// ============================================================================

fn timestamp(at: chrono::DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub fn create_session(conn: &Connection, user_id: &str) -> DbResult<Session> {
    let session = Session {
        token: format!("{}{}", new_id().replace('-', ""), new_id().replace('-', "")),
        user_id: user_id.to_string(),
        expires_at: timestamp(Utc::now() + Duration::days(SESSION_DAYS)),
    };

    conn.execute(
        "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
        params![token_digest(&session.token), session.user_id, session.expires_at],
    )
    .map_err(DbError::query("create session"))?;

    tracing::debug!(user_id, "session created");
    Ok(session)
}

/// User behind a session token; expired sessions count as missing
pub fn find_session_user(conn: &Connection, token: &str) -> DbResult<Option<User>> {
    conn.query_row(
        "SELECT users.id, users.name, users.email, users.password
         FROM sessions
         JOIN users ON sessions.user_id = users.id
         WHERE sessions.token = ?1 AND sessions.expires_at > ?2",
        params![token_digest(token), timestamp(Utc::now())],
        user_from_row,
    )
    .optional()
    .map_err(DbError::query("fetch session"))
}

pub fn delete_session(conn: &Connection, token: &str) -> DbResult<usize> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token_digest(token)])
        .map_err(DbError::query("delete session"))
}
