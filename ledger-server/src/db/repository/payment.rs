//! Payment Repository (append-only)

use super::{RepoError, RepoResult};
use crate::money::from_cents;
use chrono::NaiveDate;
use shared::models::{PayMethod, Payment};
use sqlx::{SqliteConnection, SqliteExecutor};

const PAYMENT_COLUMNS: &str = "id, order_id, amount, method, paid_at, note, created_by, created_at";

#[derive(Debug, sqlx::FromRow)]
struct PaymentRecord {
    id: i64,
    order_id: i64,
    amount: i64,
    method: PayMethod,
    paid_at: NaiveDate,
    note: Option<String>,
    created_by: Option<i64>,
    created_at: i64,
}

impl From<PaymentRecord> for Payment {
    fn from(r: PaymentRecord) -> Self {
        Payment {
            id: r.id,
            order_id: r.order_id,
            amount: from_cents(r.amount),
            method: r.method,
            paid_at: r.paid_at,
            note: r.note,
            created_by: r.created_by,
            created_at: r.created_at,
        }
    }
}

/// New ledger entry, amount already validated and in cents
#[derive(Debug, Clone)]
pub struct NewPayment<'a> {
    pub order_id: i64,
    pub amount_cents: i64,
    pub method: PayMethod,
    pub paid_at: NaiveDate,
    pub note: Option<&'a str>,
    pub created_by: Option<i64>,
}

pub async fn insert(
    conn: &mut SqliteConnection,
    data: &NewPayment<'_>,
    now: i64,
) -> RepoResult<Payment> {
    let row = sqlx::query_as::<_, PaymentRecord>(&format!(
        "INSERT INTO payment (order_id, amount, method, paid_at, note, created_by, created_at) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {PAYMENT_COLUMNS}"
    ))
    .bind(data.order_id)
    .bind(data.amount_cents)
    .bind(data.method)
    .bind(data.paid_at)
    .bind(data.note)
    .bind(data.created_by)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(Payment::from)
        .ok_or_else(|| RepoError::Database("Failed to insert payment".into()))
}

/// Σ amount (cents) over every payment of an order
pub async fn sum_for_order(db: impl SqliteExecutor<'_>, order_id: i64) -> RepoResult<i64> {
    let sum: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0) FROM payment WHERE order_id = ?")
            .bind(order_id)
            .fetch_one(db)
            .await?;
    Ok(sum)
}

/// Ledger of an order, oldest first
pub async fn find_by_order(db: impl SqliteExecutor<'_>, order_id: i64) -> RepoResult<Vec<Payment>> {
    let rows = sqlx::query_as::<_, PaymentRecord>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payment WHERE order_id = ? ORDER BY paid_at, id"
    ))
    .bind(order_id)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(Payment::from).collect())
}
