//! Reconciliation Resolver
//!
//! Decides which payment state is shown for an order when the stored state
//! may be present, stale or missing. Pure functions, no I/O.
//!
//! ```text
//! stored = Canonical(s) ──▶ s
//! stored = Unknown      ──▶ auto(total, paid)
//!
//! auto: paid <= 0                        → UNPAID
//!       total <= 0 || paid + 0.01 >= total → PAID
//!       otherwise                          → PARTIAL
//! ```

use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{PaymentState, StoredPaymentState};

use crate::money::MONEY_TOLERANCE;

/// Resolved payment state with its display label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub state: PaymentState,
    pub label: &'static str,
}

/// Computed state used when nothing canonical is stored.
///
/// Tolerates one cent of shortfall when deciding "fully paid".
pub fn auto_state(total: Decimal, paid: Decimal) -> PaymentState {
    if paid <= Decimal::ZERO {
        PaymentState::Unpaid
    } else if total <= Decimal::ZERO || paid + MONEY_TOLERANCE >= total {
        PaymentState::Paid
    } else {
        PaymentState::Partial
    }
}

/// State written by the ledger after re-summing payments (exact comparison).
pub fn ledger_state(total: Decimal, paid: Decimal) -> PaymentState {
    if paid <= Decimal::ZERO {
        PaymentState::Unpaid
    } else if total <= Decimal::ZERO || paid >= total {
        PaymentState::Paid
    } else {
        PaymentState::Partial
    }
}

/// State written for an order with no payments: a zero total is vacuously paid.
pub fn opening_state(total: Decimal) -> PaymentState {
    if total <= Decimal::ZERO {
        PaymentState::Paid
    } else {
        PaymentState::Unpaid
    }
}

/// Resolve the state to display. A canonical stored state always wins.
pub fn resolve_state(total: Decimal, paid: Decimal, stored: StoredPaymentState) -> Resolution {
    let state = match stored {
        StoredPaymentState::Canonical(state) => state,
        StoredPaymentState::Unknown => auto_state(total, paid),
    };
    Resolution {
        state,
        label: state.label(),
    }
}

/// `total - paid`, clamped to exactly zero inside the tolerance band.
pub fn balance(total: Decimal, paid: Decimal) -> Decimal {
    let diff = total - paid;
    if diff.abs() < MONEY_TOLERANCE {
        Decimal::ZERO
    } else {
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[test]
    fn test_auto_state_table() {
        assert_eq!(auto_state(d("500"), d("0")), PaymentState::Unpaid);
        assert_eq!(auto_state(d("500"), d("100")), PaymentState::Partial);
        assert_eq!(auto_state(d("500"), d("500")), PaymentState::Paid);
        assert_eq!(auto_state(d("500"), d("600")), PaymentState::Paid);
        assert_eq!(auto_state(d("0"), d("10")), PaymentState::Paid);
        // 1 cent short still counts as paid
        assert_eq!(auto_state(d("100.00"), d("99.99")), PaymentState::Paid);
        assert_eq!(auto_state(d("100.00"), d("99.98")), PaymentState::Partial);
    }

    #[test]
    fn test_zero_total_no_payments_is_paid_for_display() {
        let r = resolve_state(d("0"), d("0"), StoredPaymentState::Canonical(PaymentState::Paid));
        assert_eq!(r.state, PaymentState::Paid);
        assert_eq!(balance(d("0"), d("0")), Decimal::ZERO);
    }

    #[test]
    fn test_ledger_state_is_exact() {
        assert_eq!(ledger_state(d("100.00"), d("99.99")), PaymentState::Partial);
        assert_eq!(ledger_state(d("100.00"), d("100.00")), PaymentState::Paid);
        assert_eq!(ledger_state(d("0"), d("0")), PaymentState::Unpaid);
        assert_eq!(ledger_state(d("0"), d("5")), PaymentState::Paid);
    }

    #[test]
    fn test_opening_state() {
        assert_eq!(opening_state(d("0")), PaymentState::Paid);
        assert_eq!(opening_state(d("0.01")), PaymentState::Unpaid);
    }

    #[test]
    fn test_stored_state_wins() {
        // disagreeing canonical state is authoritative
        let r = resolve_state(
            d("500"),
            d("500"),
            StoredPaymentState::Canonical(PaymentState::Partial),
        );
        assert_eq!(r.state, PaymentState::Partial);
        assert_eq!(r.label, "partially paid");
    }

    #[test]
    fn test_unknown_falls_back_to_auto() {
        let r = resolve_state(d("500"), d("100"), StoredPaymentState::Unknown);
        assert_eq!(r.state, PaymentState::Partial);
        let r = resolve_state(d("500"), d("0"), StoredPaymentState::Unknown);
        assert_eq!(r, Resolution { state: PaymentState::Unpaid, label: "unpaid" });
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let inputs = [
            (d("500"), d("200"), StoredPaymentState::Unknown),
            (d("0"), d("0"), StoredPaymentState::Unknown),
            (d("100"), d("99.995"), StoredPaymentState::Unknown),
            (d("10"), d("1"), StoredPaymentState::Canonical(PaymentState::Paid)),
        ];
        for (total, paid, stored) in inputs {
            let first = resolve_state(total, paid, stored);
            let again = resolve_state(total, paid, StoredPaymentState::Canonical(first.state));
            assert_eq!(first, again);
            assert_eq!(first, resolve_state(total, paid, stored));
        }
    }

    #[test]
    fn test_balance_clamp() {
        assert_eq!(balance(d("100.00"), d("99.995")), Decimal::ZERO);
        assert_eq!(
            resolve_state(d("100.00"), d("99.995"), StoredPaymentState::Unknown).state,
            PaymentState::Paid
        );
        assert_eq!(balance(d("500"), d("100")), d("400"));
        assert_eq!(balance(d("500"), d("600")), d("-100"));
        assert_eq!(balance(d("100"), d("100.004")), Decimal::ZERO);
        assert_eq!(balance(d("100.00"), d("99.99")), d("0.01"));
    }
}
