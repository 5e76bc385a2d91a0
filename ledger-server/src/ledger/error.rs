use thiserror::Error;

use crate::db::repository::RepoError;
use crate::utils::{AppError, ErrorCode};

/// Domain errors of the ledger and its read paths
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Order not found: {0}")]
    NotFound(i64),

    /// Order or filter outside the caller's branch scope
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Role may not perform the operation at all
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Administrator required: {0}")]
    AdminRequired(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid payment state: {0}")]
    InvalidState(String),

    /// Lost the write lock to a concurrent writer. Never retried here.
    #[error("Conflicting write in progress, try again")]
    ConflictLost,

    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for LedgerError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Busy(_) => LedgerError::ConflictLost,
            other => LedgerError::Repo(other),
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::from(RepoError::from(err))
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, format!("Order {id} not found"))
                    .with_detail("order_id", id)
            }
            LedgerError::Forbidden(msg) => AppError::with_message(ErrorCode::BranchScopeDenied, msg),
            LedgerError::PermissionDenied(msg) => {
                AppError::with_message(ErrorCode::PermissionDenied, msg)
            }
            LedgerError::AdminRequired(msg) => AppError::with_message(ErrorCode::AdminRequired, msg),
            LedgerError::InvalidAmount(msg) => {
                AppError::with_message(ErrorCode::PaymentInvalidAmount, msg)
            }
            LedgerError::InvalidState(value) => AppError::with_message(
                ErrorCode::PaymentStateInvalid,
                format!("Invalid payment state: {value}"),
            )
            .with_detail("allowed", "UNPAID, PARTIAL, PAID"),
            LedgerError::ConflictLost => AppError::new(ErrorCode::PaymentConflictLost),
            LedgerError::Repo(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err: AppError = LedgerError::NotFound(7).into();
        assert_eq!(err.code, ErrorCode::OrderNotFound);
        assert_eq!(err.http_status(), http::StatusCode::NOT_FOUND);

        let err: AppError = LedgerError::InvalidAmount("0".into()).into();
        assert_eq!(err.code, ErrorCode::PaymentInvalidAmount);

        let err: AppError = LedgerError::Forbidden("no".into()).into();
        assert_eq!(err.code, ErrorCode::BranchScopeDenied);
        assert_eq!(err.http_status(), http::StatusCode::FORBIDDEN);

        let err: AppError = LedgerError::PermissionDenied("viewer".into()).into();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert_eq!(err.http_status(), http::StatusCode::FORBIDDEN);

        let err: AppError = LedgerError::AdminRequired("reconcile".into()).into();
        assert_eq!(err.code, ErrorCode::AdminRequired);
        assert_eq!(err.http_status(), http::StatusCode::FORBIDDEN);

        let err: AppError = LedgerError::from(RepoError::Busy("locked".into())).into();
        assert_eq!(err.code, ErrorCode::PaymentConflictLost);
        assert_eq!(err.http_status(), http::StatusCode::CONFLICT);
    }
}
