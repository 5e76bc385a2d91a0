//! Payment Model (订单收款流水)

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical payment state of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentState {
    Unpaid,
    Partial,
    Paid,
}

impl PaymentState {
    /// All states, in reporting order
    pub const ALL: [PaymentState; 3] = [Self::Unpaid, Self::Partial, Self::Paid];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "UNPAID",
            Self::Partial => "PARTIAL",
            Self::Paid => "PAID",
        }
    }

    /// Strict parse of the storage/API representation
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "UNPAID" => Some(Self::Unpaid),
            "PARTIAL" => Some(Self::Partial),
            "PAID" => Some(Self::Paid),
            _ => None,
        }
    }

    /// Display label shown next to the state
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Partial => "partially paid",
            Self::Paid => "fully paid",
        }
    }
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment state as persisted on the order row.
///
/// Rows written before the state column existed carry NULL; those and any
/// non-canonical value decode to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StoredPaymentState {
    #[default]
    Unknown,
    Canonical(PaymentState),
}

impl StoredPaymentState {
    pub fn from_column(value: Option<&str>) -> Self {
        match value.and_then(PaymentState::parse) {
            Some(state) => Self::Canonical(state),
            None => Self::Unknown,
        }
    }

    pub fn canonical(&self) -> Option<PaymentState> {
        match self {
            Self::Canonical(state) => Some(*state),
            Self::Unknown => None,
        }
    }
}

impl From<PaymentState> for StoredPaymentState {
    fn from(state: PaymentState) -> Self {
        Self::Canonical(state)
    }
}

impl Serialize for StoredPaymentState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.canonical().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StoredPaymentState {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Self::from_column(raw.as_deref()))
    }
}

/// Payment channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum PayMethod {
    Cash,
    Payme,
    Terminal,
    Bank,
    Transfer,
}

impl PayMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Payme => "payme",
            Self::Terminal => "terminal",
            Self::Bank => "bank",
            Self::Transfer => "transfer",
        }
    }
}

/// Ledger entry. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub amount: Decimal,
    pub method: PayMethod,
    /// Business date of the payment (YYYY-MM-DD)
    pub paid_at: NaiveDate,
    pub note: Option<String>,
    /// Actor who recorded the payment
    pub created_by: Option<i64>,
    pub created_at: i64,
}

/// Record payment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCreate {
    pub amount: Decimal,
    pub method: PayMethod,
    /// Defaults to the current business date
    pub paid_at: Option<NaiveDate>,
    pub note: Option<String>,
}

/// Result of a committed ledger write
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub new_paid_amount: Decimal,
    pub new_payment_state: PaymentState,
}

/// Administrative override of the stored payment state.
///
/// `payment_state` is kept as raw text so a bad value surfaces as an
/// invalid-state error rather than a deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStateUpdate {
    pub payment_state: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_state_from_column() {
        assert_eq!(
            StoredPaymentState::from_column(Some("PAID")),
            StoredPaymentState::Canonical(PaymentState::Paid)
        );
        assert_eq!(StoredPaymentState::from_column(None), StoredPaymentState::Unknown);
        assert_eq!(
            StoredPaymentState::from_column(Some("paid")),
            StoredPaymentState::Unknown
        );
        assert_eq!(
            StoredPaymentState::from_column(Some("")),
            StoredPaymentState::Unknown
        );
    }

    #[test]
    fn test_stored_state_serde() {
        let json = serde_json::to_string(&StoredPaymentState::Canonical(PaymentState::Partial))
            .unwrap();
        assert_eq!(json, "\"PARTIAL\"");
        assert_eq!(
            serde_json::to_string(&StoredPaymentState::Unknown).unwrap(),
            "null"
        );
        let back: StoredPaymentState = serde_json::from_str("\"legacy\"").unwrap();
        assert_eq!(back, StoredPaymentState::Unknown);
    }

    #[test]
    fn test_payment_create_deserialize() {
        let json = r#"{"amount": 199.99, "method": "payme", "paid_at": "2026-03-01"}"#;
        let payload: PaymentCreate = serde_json::from_str(json).unwrap();
        assert_eq!(payload.amount, Decimal::new(19999, 2));
        assert_eq!(payload.method, PayMethod::Payme);
        assert_eq!(
            payload.paid_at,
            NaiveDate::from_ymd_opt(2026, 3, 1)
        );
        assert!(payload.note.is_none());
    }
}
