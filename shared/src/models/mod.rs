//! Data models
//!
//! Shared between ledger-server and API clients.
//! Enum columns use `#[cfg_attr(feature = "db", derive(sqlx::Type))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).
//! Money is `rust_decimal::Decimal` in the API and integer cents in storage.

pub mod attachment;
pub mod order;
pub mod payment;
pub mod role;

// Re-exports
pub use attachment::*;
pub use order::*;
pub use payment::*;
pub use role::*;
