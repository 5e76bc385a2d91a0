//! Dashboard API Module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

/// Dashboard router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/dashboard", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/summary", get(handler::summary))
        .route("/timeline", get(handler::timeline))
        .route("/top", get(handler::top))
        .route("/payment-stats", get(handler::payment_stats))
        .route("/filters", get(handler::filters))
        .route("/activity", get(handler::activity))
}
