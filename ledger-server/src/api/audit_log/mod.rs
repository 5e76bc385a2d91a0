//! Audit Log API 模块 (审计日志查询, 仅管理员)

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/audit-log", routes())
}

fn routes() -> Router<ServerState> {
    Router::new().route("/", get(handler::list))
}
