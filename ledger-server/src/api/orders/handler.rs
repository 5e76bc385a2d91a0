//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::models::{
    OrderDetail, OrderPage, OrderStatusUpdate, OrderView, Payment, PaymentCreate, PaymentReceipt,
    PaymentStateUpdate,
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::ledger::{ReconcileOutcome, StateOverride};
use crate::listing::{DateMode, OrderListQuery};
use crate::utils::AppResult;
use crate::utils::time::parse_date;

/// GET /api/orders - 分页订单列表
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<OrderPage>> {
    let page = state.listing.list_orders(&user, &query).await?;
    Ok(Json(page))
}

/// Query params for the by-date view
#[derive(Debug, Deserialize)]
pub struct ByDateQuery {
    pub date: String,
    /// created (default) | deadline
    pub mode: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrdersByDate {
    pub date: NaiveDate,
    pub total: usize,
    pub rows: Vec<OrderView>,
}

/// GET /api/orders/by-date?date=YYYY-MM-DD&mode=created|deadline
pub async fn by_date(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ByDateQuery>,
) -> AppResult<Json<OrdersByDate>> {
    let date = parse_date(query.date.trim())?;
    let mode = DateMode::parse(query.mode.as_deref());
    let rows = state.listing.orders_by_date(&user, date, mode).await?;
    Ok(Json(OrdersByDate {
        date,
        total: rows.len(),
        rows,
    }))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    let detail = state.listing.get_order(&user, id).await?;
    Ok(Json(detail))
}

/// DELETE /api/orders/{id} - 软删除
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    state.ledger.soft_delete_order(&user, id).await?;
    Ok(Json(true))
}

/// PATCH /api/orders/{id}/status
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<OrderStatusUpdate>,
) -> AppResult<Json<bool>> {
    state.ledger.update_status(&user, id, payload.status).await?;
    Ok(Json(true))
}

/// PATCH /api/orders/{id}/payment-state - 手动覆盖支付状态
pub async fn set_payment_state(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<PaymentStateUpdate>,
) -> AppResult<Json<StateOverride>> {
    let result = state
        .ledger
        .set_payment_state(&user, id, &payload.payment_state)
        .await?;
    Ok(Json(result))
}

/// POST /api/orders/{id}/reconcile - 重新汇总账本 (管理员)
pub async fn reconcile(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ReconcileOutcome>> {
    let outcome = state.ledger.reconcile_order(&user, id).await?;
    Ok(Json(outcome))
}

/// GET /api/orders/{id}/payments
pub async fn list_payments(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Payment>>> {
    let payments = state.ledger.list_payments(&user, id).await?;
    Ok(Json(payments))
}

/// POST /api/orders/{id}/payments - 登记收款
pub async fn record_payment(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<PaymentCreate>,
) -> AppResult<(StatusCode, Json<PaymentReceipt>)> {
    let receipt = state.ledger.record_payment(&user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
