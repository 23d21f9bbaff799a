// 🚨 Database failure type
// Every call site maps rusqlite errors to a generic, user-facing action message.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// Display text is safe to show to users; the source is for logs only.
    #[error("Database Error: Failed to {action}.")]
    Query {
        action: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("Database Error: connection unavailable.")]
    Unavailable,
}

impl DbError {
    /// Adapter for `map_err`: `stmt.execute(..).map_err(DbError::query("Create Tool"))`
    pub fn query(action: impl Into<String>) -> impl FnOnce(rusqlite::Error) -> DbError {
        let action = action.into();
        move |source| DbError::Query { action, source }
    }

    /// Underlying database error, when there is one.
    pub fn detail(&self) -> Option<&rusqlite::Error> {
        match self {
            DbError::Query { source, .. } => Some(source),
            DbError::Unavailable => None,
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_message_hides_source() {
        let err = DbError::query("Create Tool")(rusqlite::Error::InvalidQuery);
        assert_eq!(err.to_string(), "Database Error: Failed to Create Tool.");
        assert!(err.detail().is_some());
        assert!(DbError::Unavailable.detail().is_none());
    }
}
