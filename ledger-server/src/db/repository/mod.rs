//! Repository Module
//!
//! Free async functions over `&SqlitePool` or an open connection/transaction.
//! Money columns are integer cents here; conversion to `Decimal` happens in
//! the record → model `From` impls.

pub mod attachment;
pub mod order;
pub mod payment;
pub mod reference;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// SQLITE_BUSY after busy_timeout: another writer held the lock
    #[error("Database busy: {0}")]
    Busy(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepoError::NotFound(err.to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepoError::Duplicate(db_err.message().to_string())
            }
            sqlx::Error::Database(db_err) if is_busy(db_err.code().as_deref()) => {
                RepoError::Busy(db_err.message().to_string())
            }
            _ => RepoError::Database(err.to_string()),
        }
    }
}

impl From<RepoError> for shared::error::AppError {
    fn from(err: RepoError) -> Self {
        use shared::error::{AppError, ErrorCode};
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::AlreadyExists, msg),
            RepoError::Database(msg) => AppError::database(msg),
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Busy(msg) => AppError::database(msg),
        }
    }
}

/// Primary result code 5 (SQLITE_BUSY) and its extended codes
fn is_busy(code: Option<&str>) -> bool {
    code.and_then(|c| c.parse::<i32>().ok())
        .is_some_and(|c| c & 0xff == 5)
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
