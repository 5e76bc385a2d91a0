//! Order Model (订单 - 财务视图)

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::attachment::AttachmentCounts;
use super::payment::{Payment, PaymentState, StoredPaymentState};

/// Order workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum OrderStatus {
    #[default]
    NotStarted,
    InProgress,
    Ready,
    Delivered,
}

impl OrderStatus {
    /// Statuses counted as completed in reports
    pub const COMPLETED: [OrderStatus; 2] = [Self::Ready, Self::Delivered];

    pub fn is_completed(&self) -> bool {
        Self::COMPLETED.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Ready => "ready",
            Self::Delivered => "delivered",
        }
    }
}

/// Customer segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum CustomerType {
    Office,
    Sns,
    Consulting,
}

impl CustomerType {
    pub const ALL: [CustomerType; 3] = [Self::Office, Self::Sns, Self::Consulting];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Office => "office",
            Self::Sns => "sns",
            Self::Consulting => "consulting",
        }
    }
}

/// Order entity as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub client_id: i64,
    pub branch_id: Option<i64>,
    pub manager_id: Option<i64>,
    pub status: OrderStatus,
    pub customer_type: Option<CustomerType>,
    pub doc_type: Option<String>,
    pub country: Option<String>,
    pub payment_method: Option<String>,
    pub deadline: Option<NaiveDate>,
    /// Contracted amount, owned by order CRUD
    pub total_amount: Decimal,
    /// Cache of Σ payments, written by the ledger
    pub paid_amount: Decimal,
    /// Cache of the payment state, written by the ledger or an override
    pub payment_state: StoredPaymentState,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub client_id: i64,
    pub branch_id: Option<i64>,
    pub manager_id: Option<i64>,
    #[serde(default)]
    pub status: OrderStatus,
    pub customer_type: Option<CustomerType>,
    pub doc_type: Option<String>,
    pub country: Option<String>,
    pub payment_method: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub total_amount: Decimal,
    pub notes: Option<String>,
}

/// Update order status payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

/// Order row as returned by listings, resolved through the reconciler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub id: i64,
    pub client_id: i64,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub branch_id: Option<i64>,
    pub branch_name: Option<String>,
    pub manager_id: Option<i64>,
    pub manager_name: Option<String>,
    pub status: OrderStatus,
    pub customer_type: Option<CustomerType>,
    pub doc_type: Option<String>,
    pub country: Option<String>,
    pub payment_method: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub created_at: i64,
    pub total_amount: Decimal,
    /// Σ payments from the ledger
    pub paid_amount: Decimal,
    /// Clamped balance (total - paid)
    pub balance: Decimal,
    pub payment_state: PaymentState,
    /// Display label for `payment_state`
    pub payment_status: String,
    pub notes: Option<String>,
}

/// One page of orders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPage {
    pub items: Vec<OrderView>,
    /// Post-filter, pre-pagination row count
    pub total: i64,
    pub page: u32,
    pub size: u32,
}

/// Order with its ledger and document review counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order: OrderView,
    pub payments: Vec<Payment>,
    pub attachments: AttachmentCounts,
}
