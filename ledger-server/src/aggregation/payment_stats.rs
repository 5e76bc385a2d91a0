//! Payment statistics by period and resolved payment state

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{PaymentState, StoredPaymentState};

use super::bucket::{Granularity, bucket_key};
use super::{AggregationService, DashboardQuery};
use crate::auth::CurrentUser;
use crate::ledger::LedgerError;
use crate::money::from_cents;
use crate::reconcile::{balance, resolve_state};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StateBucket {
    pub count: i64,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentStatsRow {
    pub bucket: String,
    pub orders: i64,
    /// Σ paid over the bucket's orders
    pub sum: Decimal,
    pub total_amount: Decimal,
    /// Always carries UNPAID, PARTIAL and PAID
    pub states: BTreeMap<PaymentState, StateBucket>,
}

impl PaymentStatsRow {
    fn empty(bucket: String) -> Self {
        Self {
            bucket,
            orders: 0,
            sum: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            states: PaymentState::ALL
                .into_iter()
                .map(|s| (s, StateBucket::default()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentStats {
    pub granularity: Granularity,
    pub rows: Vec<PaymentStatsRow>,
}

impl AggregationService {
    /// Orders bucketed by `created_at`; each order lands in the bucket of its resolved state.
    pub async fn payment_stats(
        &self,
        caller: &CurrentUser,
        query: &DashboardQuery,
    ) -> Result<PaymentStats, LedgerError> {
        let granularity = Granularity::parse(query.granularity.as_deref());
        let orders = self.scoped_orders(caller, &query.scope_filters()).await?;

        let mut rows: BTreeMap<String, PaymentStatsRow> = BTreeMap::new();
        for order in &orders {
            let key = bucket_key(Some(order.created_at), granularity, self.tz);
            let total = from_cents(order.total_amount);
            let paid = from_cents(order.paid_cents);
            let resolution = resolve_state(
                total,
                paid,
                StoredPaymentState::from_column(order.payment_state.as_deref()),
            );

            let row = rows
                .entry(key)
                .or_insert_with_key(|k| PaymentStatsRow::empty(k.clone()));
            row.orders += 1;
            row.sum += paid;
            row.total_amount += total;

            let state = row.states.entry(resolution.state).or_default();
            state.count += 1;
            state.total_amount += total;
            state.paid_amount += paid;
            state.balance += balance(total, paid);
        }

        tracing::debug!(
            granularity = granularity.as_str(),
            buckets = rows.len(),
            orders = orders.len(),
            "Payment stats computed"
        );
        Ok(PaymentStats {
            granularity,
            rows: rows.into_values().collect(),
        })
    }
}
