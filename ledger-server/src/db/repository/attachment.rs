//! Attachment Repository
//!
//! Attachments belong to the document collaborator; the ledger only counts
//! them by review status.

use super::RepoResult;
use shared::models::{AttachmentCounts, AttachmentStatus};
use sqlx::{SqliteExecutor, SqlitePool};

pub async fn counts_for_order(
    db: impl SqliteExecutor<'_>,
    order_id: i64,
) -> RepoResult<AttachmentCounts> {
    let (pending_review, approved, rejected): (i64, i64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(status = 'pending_review'), 0), COALESCE(SUM(status = 'approved'), 0), COALESCE(SUM(status = 'rejected'), 0) FROM attachment WHERE order_id = ?",
    )
    .bind(order_id)
    .fetch_one(db)
    .await?;

    Ok(AttachmentCounts {
        pending_review,
        approved,
        rejected,
    })
}

pub async fn create(
    pool: &SqlitePool,
    order_id: i64,
    file_name: &str,
    status: AttachmentStatus,
    now: i64,
) -> RepoResult<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO attachment (order_id, file_name, status, created_at) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(order_id)
    .bind(file_name)
    .bind(status)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(id)
}
