//! Ledger Core
//!
//! The only writer of `payment` rows and of the order's payment cache
//! (`paid_amount`, `payment_state`). Every write is one SQLite transaction:
//!
//! ```text
//! BEGIN
//!   UPDATE orders SET updated_at   -- write lock, NotFound if missing/deleted
//!   authorize caller for order.branch_id
//!   INSERT payment
//!   paid = Σ payment.amount         -- full re-sum, order independent
//!   UPDATE orders SET paid_amount, payment_state
//!   SAVEPOINT audit … RELEASE       -- best effort
//! COMMIT
//! ```

mod error;
mod service;

pub use error::LedgerError;
pub use service::{LedgerService, ReconcileOutcome, StateOverride};
