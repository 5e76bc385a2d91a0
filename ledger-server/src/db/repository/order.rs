//! Order Repository
//!
//! Only the columns the ledger cares about are written here; `total_amount`
//! is set on creation and otherwise owned by order CRUD.

use super::{RepoError, RepoResult};
use crate::money::{from_cents, to_cents};
use crate::reconcile::opening_state;
use chrono::NaiveDate;
use shared::models::{
    CustomerType, Order, OrderCreate, OrderStatus, PaymentState, StoredPaymentState,
};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

const ORDER_COLUMNS: &str = "id, client_id, branch_id, manager_id, status, customer_type, doc_type, country, payment_method, deadline, total_amount, paid_amount, payment_state, notes, created_at, updated_at, deleted_at";

#[derive(Debug, sqlx::FromRow)]
struct OrderRecord {
    id: i64,
    client_id: i64,
    branch_id: Option<i64>,
    manager_id: Option<i64>,
    status: OrderStatus,
    customer_type: Option<CustomerType>,
    doc_type: Option<String>,
    country: Option<String>,
    payment_method: Option<String>,
    deadline: Option<NaiveDate>,
    total_amount: i64,
    paid_amount: i64,
    payment_state: Option<String>,
    notes: Option<String>,
    created_at: i64,
    updated_at: i64,
    deleted_at: Option<i64>,
}

impl From<OrderRecord> for Order {
    fn from(r: OrderRecord) -> Self {
        Order {
            id: r.id,
            client_id: r.client_id,
            branch_id: r.branch_id,
            manager_id: r.manager_id,
            status: r.status,
            customer_type: r.customer_type,
            doc_type: r.doc_type,
            country: r.country,
            payment_method: r.payment_method,
            deadline: r.deadline,
            total_amount: from_cents(r.total_amount),
            paid_amount: from_cents(r.paid_amount),
            payment_state: StoredPaymentState::from_column(r.payment_state.as_deref()),
            notes: r.notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
            deleted_at: r.deleted_at,
        }
    }
}

/// Find an order, soft-deleted or not
pub async fn find_by_id(db: impl SqliteExecutor<'_>, id: i64) -> RepoResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRecord>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row.map(Order::from))
}

/// Find an order that is not soft-deleted
pub async fn find_active(db: impl SqliteExecutor<'_>, id: i64) -> RepoResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRecord>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ? AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row.map(Order::from))
}

/// Insert a new order with an empty ledger (`paid_amount = 0`).
///
/// The stored state is UNPAID, or PAID for a zero total.
pub async fn create(pool: &SqlitePool, data: &OrderCreate, now: i64) -> RepoResult<Order> {
    let total = to_cents(data.total_amount)
        .filter(|cents| *cents >= 0)
        .ok_or_else(|| {
            RepoError::Validation(format!("Invalid total_amount: {}", data.total_amount))
        })?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO orders (client_id, branch_id, manager_id, status, customer_type, doc_type, country, payment_method, deadline, total_amount, paid_amount, payment_state, notes, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?) RETURNING id",
    )
    .bind(data.client_id)
    .bind(data.branch_id)
    .bind(data.manager_id)
    .bind(data.status)
    .bind(data.customer_type)
    .bind(&data.doc_type)
    .bind(&data.country)
    .bind(&data.payment_method)
    .bind(data.deadline)
    .bind(total)
    .bind(opening_state(data.total_amount).as_str())
    .bind(&data.notes)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create order".into()))
}

/// First write of a ledger transaction: bumps `updated_at` on a live order.
///
/// Taking the write lock before any read serializes concurrent writers on
/// SQLite. Returns `false` when the order is missing or soft-deleted.
pub async fn lock_for_update(conn: &mut SqliteConnection, id: i64, now: i64) -> RepoResult<bool> {
    let result = sqlx::query("UPDATE orders SET updated_at = ? WHERE id = ? AND deleted_at IS NULL")
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Write the ledger-derived cache
pub async fn update_payment_cache(
    conn: &mut SqliteConnection,
    id: i64,
    paid_cents: i64,
    state: PaymentState,
    now: i64,
) -> RepoResult<()> {
    sqlx::query("UPDATE orders SET paid_amount = ?, payment_state = ?, updated_at = ? WHERE id = ?")
        .bind(paid_cents)
        .bind(state.as_str())
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Administrative override of the stored state
pub async fn set_payment_state(
    conn: &mut SqliteConnection,
    id: i64,
    state: PaymentState,
    now: i64,
) -> RepoResult<()> {
    sqlx::query("UPDATE orders SET payment_state = ?, updated_at = ? WHERE id = ?")
        .bind(state.as_str())
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn update_status(
    conn: &mut SqliteConnection,
    id: i64,
    status: OrderStatus,
    now: i64,
) -> RepoResult<()> {
    sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn soft_delete(conn: &mut SqliteConnection, id: i64, now: i64) -> RepoResult<()> {
    sqlx::query("UPDATE orders SET deleted_at = ?, updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
