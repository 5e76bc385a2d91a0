//! Order API Module
//!
//! Scoped order reads plus the ledger write paths. Order CRUD itself lives
//! with another service; only soft delete and status moves are exposed here.

mod handler;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/by-date", get(handler::by_date))
        .route("/{id}", get(handler::get_by_id).delete(handler::delete))
        .route("/{id}/status", patch(handler::update_status))
        .route("/{id}/payment-state", patch(handler::set_payment_state))
        .route("/{id}/reconcile", post(handler::reconcile))
        .route(
            "/{id}/payments",
            get(handler::list_payments).post(handler::record_payment),
        )
}
