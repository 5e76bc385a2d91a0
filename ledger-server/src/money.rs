//! Money utilities using rust_decimal for precision
//!
//! Amounts are stored in SQLite as integer minor units (cents). Everything
//! above the repository layer works in `Decimal`, so sums and comparisons
//! never go through `f64`.

use rust_decimal::prelude::*;

/// Monetary scale (2 decimal places)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Decimal → cents. `None` if the value has more than two decimals or overflows.
pub fn to_cents(value: Decimal) -> Option<i64> {
    if value.normalize().scale() > DECIMAL_PLACES {
        return None;
    }
    value.checked_mul(Decimal::ONE_HUNDRED)?.to_i64()
}

/// Cents → Decimal at scale 2
#[inline]
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, DECIMAL_PLACES)
}

/// Validate a payment amount: strictly positive, at most two decimals.
///
/// Returns the amount in cents.
pub fn validate_payment_amount(amount: Decimal) -> Option<i64> {
    if amount <= Decimal::ZERO {
        return None;
    }
    to_cents(amount).filter(|cents| *cents > 0)
}
