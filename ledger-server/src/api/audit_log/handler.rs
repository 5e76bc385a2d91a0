//! Audit Log API Handlers

use axum::{
    Json,
    extract::{Query, State},
};

use crate::audit::{AuditListResponse, AuditQuery};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppResult;

/// GET /api/audit-log - 查询审计日志
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<AuditListResponse>> {
    Ok(Json(state.audit.query(&user, &query).await?))
}
