//! Dashboard summary counters

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::AttachmentStatus;
use sqlx::{QueryBuilder, Sqlite};

use super::{AggregationService, DashboardQuery, ScopedOrder};
use crate::auth::CurrentUser;
use crate::ledger::LedgerError;
use crate::money::from_cents;
use crate::scope::apply_scope;
use crate::utils::time::today;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub orders_total: i64,
    pub orders_in_progress: i64,
    pub orders_completed: i64,
    pub orders_overdue: i64,
    /// Σ payments whose `paid_at` is inside the requested range
    pub payments_sum: Decimal,
    /// Σ positive balances, from the ledger sum
    pub payments_debt: Decimal,
    pub files_pending: i64,
    pub files_rejected: i64,
}

/// Order counters and debt; payments and files are filled in by the caller.
fn count_orders(orders: &[ScopedOrder], today: NaiveDate) -> DashboardSummary {
    let mut summary = DashboardSummary::default();

    for order in orders {
        summary.orders_total += 1;
        let completed = order.status.is_completed();
        if completed {
            summary.orders_completed += 1;
        } else {
            summary.orders_in_progress += 1;
            if order.deadline.is_some_and(|d| d < today) {
                summary.orders_overdue += 1;
            }
        }
        let balance = from_cents(order.total_amount) - from_cents(order.paid_cents);
        if balance > Decimal::ZERO {
            summary.payments_debt += balance;
        }
    }

    summary
}

impl AggregationService {
    pub async fn summary(
        &self,
        caller: &CurrentUser,
        query: &DashboardQuery,
    ) -> Result<DashboardSummary, LedgerError> {
        let filters = query.scope_filters();
        let orders = self.scoped_orders(caller, &filters).await?;
        let mut summary = count_orders(&orders, today(self.tz));

        let payments = self
            .scoped_payments(caller, &filters, query.date_from(), query.date_to())
            .await?;
        summary.payments_sum = payments.iter().map(|p| from_cents(p.amount)).sum();

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COALESCE(SUM(a.status = ");
        qb.push_bind(AttachmentStatus::PendingReview.as_str())
            .push("), 0), COALESCE(SUM(a.status = ")
            .push_bind(AttachmentStatus::Rejected.as_str())
            .push("), 0) FROM attachment a JOIN orders o ON o.id = a.order_id WHERE o.deleted_at IS NULL");
        apply_scope(&mut qb, caller, &filters, self.tz)?;
        let (pending, rejected): (i64, i64) = qb.build_query_as().fetch_one(&self.pool).await?;
        summary.files_pending = pending;
        summary.files_rejected = rejected;

        tracing::debug!(
            orders = summary.orders_total,
            payments_sum = %summary.payments_sum,
            "Dashboard summary computed"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::AggregationService;
    use crate::audit::AuditService;
    use crate::db::DbService;
    use crate::db::repository::attachment;
    use crate::ledger::LedgerService;
    use crate::test_support::{OrderSeed, seed_order};
    use chrono_tz::Tz;
    use shared::models::{OrderStatus, PayMethod, PaymentCreate, Role};

    fn admin() -> CurrentUser {
        CurrentUser::new(1, Role::Admin, None)
    }

    fn d(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    async fn pay(ledger: &LedgerService, order_id: i64, amount: &str, paid_at: &str) {
        ledger
            .record_payment(
                &admin(),
                order_id,
                PaymentCreate {
                    amount: d(amount),
                    method: PayMethod::Cash,
                    paid_at: paid_at.parse().ok(),
                    note: None,
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_summary_counts() {
        let db = DbService::in_memory().await.unwrap();
        let ledger = LedgerService::new(db.pool.clone(), AuditService::new(db.pool.clone()), Tz::UTC);
        let service = AggregationService::new(db.pool.clone(), Tz::UTC);

        let overdue = seed_order(&db.pool, OrderSeed::new("500").deadline("2020-01-01")).await;
        let done = seed_order(
            &db.pool,
            OrderSeed::new("300")
                .status(OrderStatus::Delivered)
                .deadline("2020-01-01"),
        )
        .await;
        let ready = seed_order(&db.pool, OrderSeed::new("100").status(OrderStatus::Ready)).await;

        pay(&ledger, overdue, "200", "2026-02-01").await;
        pay(&ledger, done, "300", "2026-03-01").await;
        attachment::create(&db.pool, overdue, "a.pdf", AttachmentStatus::PendingReview, 0)
            .await
            .unwrap();
        attachment::create(&db.pool, overdue, "b.pdf", AttachmentStatus::Rejected, 0)
            .await
            .unwrap();
        attachment::create(&db.pool, ready, "c.pdf", AttachmentStatus::Approved, 0)
            .await
            .unwrap();

        let summary = service.summary(&admin(), &DashboardQuery::default()).await.unwrap();
        assert_eq!(summary.orders_total, 3);
        assert_eq!(summary.orders_completed, 2);
        assert_eq!(summary.orders_in_progress, 1);
        assert_eq!(summary.orders_overdue, 1);
        assert_eq!(summary.payments_sum, d("500"));
        // 300 on the first order + 100 on the unpaid ready one
        assert_eq!(summary.payments_debt, d("400"));
        assert_eq!(summary.files_pending, 1);
        assert_eq!(summary.files_rejected, 1);
    }

    #[test]
    fn test_debt_beyond_i64_cents() {
        let huge = |created_at| ScopedOrder {
            status: OrderStatus::InProgress,
            customer_type: None,
            doc_type: None,
            deadline: None,
            created_at,
            total_amount: 5_000_000_000_000_000_000,
            paid_cents: 0,
            payment_state: None,
        };
        let today: NaiveDate = "2026-01-01".parse().unwrap();
        let summary = count_orders(&[huge(1), huge(2)], today);
        assert_eq!(summary.orders_total, 2);
        assert_eq!(summary.payments_debt, d("100000000000000000"));
    }

    #[tokio::test]
    async fn test_payments_sum_follows_paid_at_range() {
        let db = DbService::in_memory().await.unwrap();
        let ledger = LedgerService::new(db.pool.clone(), AuditService::new(db.pool.clone()), Tz::UTC);
        let service = AggregationService::new(db.pool.clone(), Tz::UTC);

        let order = seed_order(&db.pool, OrderSeed::new("1000")).await;
        pay(&ledger, order, "100", "2025-12-31").await;
        pay(&ledger, order, "250", "2026-01-10").await;

        let query = DashboardQuery {
            date_from: Some("2026-01-01".into()),
            date_to: Some("2026-01-31".into()),
            ..Default::default()
        };
        let summary = service.summary(&admin(), &query).await.unwrap();
        assert_eq!(summary.orders_total, 1);
        assert_eq!(summary.payments_sum, d("250"));
        assert_eq!(summary.payments_debt, d("650"));
    }

    #[tokio::test]
    async fn test_summary_excludes_soft_deleted() {
        let db = DbService::in_memory().await.unwrap();
        let audit = AuditService::new(db.pool.clone());
        let ledger = LedgerService::new(db.pool.clone(), audit, Tz::UTC);
        let service = AggregationService::new(db.pool.clone(), Tz::UTC);

        seed_order(&db.pool, OrderSeed::new("100")).await;
        let gone = seed_order(&db.pool, OrderSeed::new("900")).await;
        pay(&ledger, gone, "50", "2026-01-02").await;
        ledger.soft_delete_order(&admin(), gone).await.unwrap();

        let summary = service.summary(&admin(), &DashboardQuery::default()).await.unwrap();
        assert_eq!(summary.orders_total, 1);
        assert_eq!(summary.payments_sum, Decimal::ZERO);
        assert_eq!(summary.payments_debt, d("100"));
    }
}
