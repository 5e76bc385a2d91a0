//! Aggregation Engine
//!
//! Dashboard reports over the caller's visible orders:
//!
//! | report | buckets by | money source |
//! |---|---|---|
//! | summary | n/a | ledger SUM, payments by `paid_at` |
//! | timeline | order `created_at`, payment `paid_at` | payment rows |
//! | top-N | doc type, customer type | n/a |
//! | payment stats | order `created_at` | ledger SUM + resolver |
//!
//! Scoped rows are fetched once per report through the Scope Filter and
//! folded in-process; soft-deleted orders never reach a fold.

mod bucket;
mod filters;
mod payment_stats;
mod summary;
mod timeline;
mod top;

pub use bucket::{Granularity, UNKNOWN_BUCKET, bucket_key, date_bucket};
pub use filters::FilterOptions;
pub use payment_stats::{PaymentStats, PaymentStatsRow, StateBucket};
pub use summary::DashboardSummary;
pub use timeline::TimelinePoint;
pub use top::{TOP_LIMIT, TopEntry, TopReport};

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Deserialize;
use shared::models::{CustomerType, OrderStatus};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::auth::CurrentUser;
use crate::ledger::LedgerError;
use crate::scope::{ScopeFilters, apply_scope};
use crate::utils::time::parse_date_opt;

/// Query string shared by all dashboard endpoints. Every value is parsed leniently.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub branch_id: Option<i64>,
    pub manager_id: Option<i64>,
    pub customer_type: Option<String>,
    pub doc_type: Option<String>,
    /// Timeline width: day | week | month
    pub group_by: Option<String>,
    /// Payment stats width: daily | weekly | monthly
    pub granularity: Option<String>,
}

impl DashboardQuery {
    /// Order filters; the date range applies to order `created_at`
    pub fn scope_filters(&self) -> ScopeFilters {
        ScopeFilters {
            branch_id: self.branch_id,
            manager_id: self.manager_id,
            customer_type: ScopeFilters::parse_customer_type(self.customer_type.as_deref()),
            doc_type: self.doc_type.clone(),
            created_from: self.date_from(),
            created_to: self.date_to(),
        }
    }

    pub fn date_from(&self) -> Option<NaiveDate> {
        parse_date_opt(self.date_from.as_deref())
    }

    pub fn date_to(&self) -> Option<NaiveDate> {
        parse_date_opt(self.date_to.as_deref())
    }
}

/// One visible order with its ledger sum
#[derive(Debug, Clone, sqlx::FromRow)]
struct ScopedOrder {
    status: OrderStatus,
    customer_type: Option<CustomerType>,
    doc_type: Option<String>,
    deadline: Option<NaiveDate>,
    created_at: i64,
    total_amount: i64,
    paid_cents: i64,
    payment_state: Option<String>,
}

/// One payment of a visible order
#[derive(Debug, Clone, sqlx::FromRow)]
struct ScopedPayment {
    paid_at: Option<NaiveDate>,
    amount: i64,
}

const ORDERS_SQL: &str = "SELECT o.status, o.customer_type, o.doc_type, o.deadline, o.created_at, o.total_amount, COALESCE(p.paid, 0) AS paid_cents, o.payment_state FROM orders o LEFT JOIN (SELECT order_id, SUM(amount) AS paid FROM payment GROUP BY order_id) p ON p.order_id = o.id WHERE o.deleted_at IS NULL";

const PAYMENTS_SQL: &str = "SELECT pm.paid_at, pm.amount FROM payment pm JOIN orders o ON o.id = pm.order_id WHERE o.deleted_at IS NULL";

/// 仪表盘统计服务
#[derive(Debug, Clone)]
pub struct AggregationService {
    pool: SqlitePool,
    tz: Tz,
}

impl AggregationService {
    pub fn new(pool: SqlitePool, tz: Tz) -> Self {
        Self { pool, tz }
    }

    /// Visible orders in `id` order
    async fn scoped_orders(
        &self,
        caller: &CurrentUser,
        filters: &ScopeFilters,
    ) -> Result<Vec<ScopedOrder>, LedgerError> {
        let mut qb = QueryBuilder::<Sqlite>::new(ORDERS_SQL);
        apply_scope(&mut qb, caller, filters, self.tz)?;
        qb.push(" ORDER BY o.id ASC");
        let rows: Vec<ScopedOrder> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// Payments of visible orders whose `paid_at` lies in `[from, to]`
    async fn scoped_payments(
        &self,
        caller: &CurrentUser,
        filters: &ScopeFilters,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<ScopedPayment>, LedgerError> {
        let mut qb = QueryBuilder::<Sqlite>::new(PAYMENTS_SQL);
        apply_scope(&mut qb, caller, filters, self.tz)?;
        if let Some(from) = from {
            qb.push(" AND pm.paid_at >= ").push_bind(from);
        }
        if let Some(to) = to {
            qb.push(" AND pm.paid_at <= ").push_bind(to);
        }
        qb.push(" ORDER BY pm.id ASC");
        let rows: Vec<ScopedPayment> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_query_is_lenient() {
        let query = DashboardQuery {
            date_from: Some("2026-03-01".into()),
            date_to: Some("yesterday".into()),
            customer_type: Some("SNS".into()),
            doc_type: Some("  ".into()),
            ..Default::default()
        };
        let filters = query.scope_filters();
        assert_eq!(filters.created_from, "2026-03-01".parse().ok());
        assert_eq!(filters.created_to, None);
        assert_eq!(filters.customer_type, Some(CustomerType::Sns));
    }
}
