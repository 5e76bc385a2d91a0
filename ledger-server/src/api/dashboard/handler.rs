//! Dashboard API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::aggregation::{
    DashboardQuery, DashboardSummary, FilterOptions, PaymentStats, TimelinePoint, TopReport,
};
use crate::audit::AuditEntry;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppResult;

/// Entries returned by the activity feed
const ACTIVITY_LIMIT: i64 = 10;

/// GET /api/dashboard/summary
pub async fn summary(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<DashboardSummary>> {
    Ok(Json(state.aggregation.summary(&user, &query).await?))
}

/// GET /api/dashboard/timeline?group_by=day|week|month
pub async fn timeline(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<Vec<TimelinePoint>>> {
    Ok(Json(state.aggregation.timeline(&user, &query).await?))
}

/// GET /api/dashboard/top
pub async fn top(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<TopReport>> {
    Ok(Json(state.aggregation.top(&user, &query).await?))
}

/// GET /api/dashboard/payment-stats?granularity=daily|weekly|monthly
pub async fn payment_stats(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<PaymentStats>> {
    Ok(Json(state.aggregation.payment_stats(&user, &query).await?))
}

/// GET /api/dashboard/filters
pub async fn filters(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<FilterOptions>> {
    Ok(Json(state.aggregation.filter_options(&user).await?))
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
}

/// GET /api/dashboard/activity - 最近操作
pub async fn activity(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ActivityQuery>,
) -> AppResult<Json<Vec<AuditEntry>>> {
    let limit = query.limit.unwrap_or(ACTIVITY_LIMIT).clamp(1, 100);
    Ok(Json(state.audit.recent(&user, limit).await?))
}
