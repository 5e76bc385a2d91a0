//! Orders and payments over time

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use super::bucket::{Granularity, UNKNOWN_BUCKET, bucket_key, date_bucket};
use super::{AggregationService, DashboardQuery};
use crate::auth::CurrentUser;
use crate::ledger::LedgerError;
use crate::money::from_cents;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelinePoint {
    pub bucket: String,
    pub orders: i64,
    pub payments: Decimal,
}

#[derive(Default)]
struct Acc {
    orders: i64,
    payments: Decimal,
}

impl AggregationService {
    /// Orders bucketed by `created_at`, payments by their own `paid_at`.
    /// Points come back sorted by bucket key.
    pub async fn timeline(
        &self,
        caller: &CurrentUser,
        query: &DashboardQuery,
    ) -> Result<Vec<TimelinePoint>, LedgerError> {
        let granularity = Granularity::parse(query.group_by.as_deref());
        let filters = query.scope_filters();

        let orders = self.scoped_orders(caller, &filters).await?;
        let payments = self
            .scoped_payments(caller, &filters, query.date_from(), query.date_to())
            .await?;

        let mut buckets: BTreeMap<String, Acc> = BTreeMap::new();
        for order in &orders {
            let key = bucket_key(Some(order.created_at), granularity, self.tz);
            buckets.entry(key).or_default().orders += 1;
        }
        for payment in &payments {
            let key = payment
                .paid_at
                .map(|date| date_bucket(date, granularity))
                .unwrap_or_else(|| UNKNOWN_BUCKET.to_string());
            buckets.entry(key).or_default().payments += from_cents(payment.amount);
        }

        Ok(buckets
            .into_iter()
            .map(|(bucket, acc)| TimelinePoint {
                bucket,
                orders: acc.orders,
                payments: acc.payments,
            })
            .collect())
    }
}
