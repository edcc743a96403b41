//! # Order History Store Errors
//!
//! ```text
//! sqlx::Error / MigrateError
//!        │
//!        ▼
//!     DbError ──► HistoryError (session): logged, the free item is allowed
//!        │
//!        └──────► ApiError (session): startup and seeding paths
//! ```

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} '{id}' does not exist")]
    NotFound { entity: String, id: String },

    /// A row with the same key is already stored, e.g. an order id imported twice.
    #[error("{field} '{value}' is already stored")]
    Duplicate { field: String, value: String },

    /// An order line pointing at a missing order, or a CHECK constraint.
    #[error("Constraint violated: {0}")]
    Constraint(String),

    #[error("Cannot open order history database: {0}")]
    Connection(String),

    #[error("Schema migration failed: {0}")]
    Migration(String),

    #[error("Order history query failed: {0}")]
    Query(String),

    /// A stored value could not be turned back into a domain value.
    #[error("Unreadable value in column {column}: {reason}")]
    CorruptRow { column: String, reason: String },

    /// No connection became free within the acquire timeout.
    #[error("Timed out waiting for a database connection")]
    PoolTimeout,

    #[error("Unexpected database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::Duplicate {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// SQLite reports constraint failures only in the message text, e.g.
/// `UNIQUE constraint failed: orders.id` or `FOREIGN KEY constraint failed`.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Row", "?"),
            sqlx::Error::Database(db_err) => {
                let text = db_err.message();
                match text.strip_prefix("UNIQUE constraint failed: ") {
                    Some(column) => DbError::duplicate(column, "?"),
                    None if text.contains("constraint failed") => {
                        DbError::Constraint(text.to_string())
                    }
                    None => DbError::Query(text.to_string()),
                }
            }
            sqlx::Error::ColumnDecode { index, source } => DbError::CorruptRow {
                column: index,
                reason: source.to_string(),
            },
            sqlx::Error::PoolTimedOut => DbError::PoolTimeout,
            sqlx::Error::PoolClosed => DbError::Connection("pool has been closed".into()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::Migration(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
