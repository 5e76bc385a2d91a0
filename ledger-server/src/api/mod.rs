//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`orders`] - 订单列表、收款、对账
//! - [`dashboard`] - 仪表盘统计
//! - [`audit_log`] - 审计日志查询
//!
//! 除健康检查外，所有处理器都通过 `CurrentUser` 提取器校验 JWT。

pub mod audit_log;
pub mod dashboard;
pub mod health;
pub mod orders;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};

/// Build a router with all routes registered (no middleware, no state)
pub fn build_routes() -> Router<ServerState> {
    Router::new()
        // Health API - public route
        .merge(health::router())
        .merge(orders::router())
        .merge(dashboard::router())
        .merge(audit_log::router())
}

/// Build the fully configured application, used by the server and by tests
pub fn build_router(state: ServerState) -> Router {
    build_routes()
        .with_state(state)
        // CORS - Handle cross-origin requests
        .layer(CorsLayer::permissive())
        // Trace - Request tracing
        .layer(TraceLayer::new_for_http())
}
