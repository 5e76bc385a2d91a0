use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use shared::models::{
    Order, OrderStatus, Payment, PaymentCreate, PaymentReceipt, PaymentState, Role,
    StoredPaymentState,
};
use sqlx::{SqliteConnection, SqlitePool};

use super::LedgerError;
use crate::audit::{AuditAction, AuditRecord, AuditService};
use crate::auth::CurrentUser;
use crate::db::repository::{order, payment};
use crate::money::{from_cents, validate_payment_amount};
use crate::reconcile::{ledger_state, opening_state, resolve_state};
use crate::scope::{Scope, authorize_branch};
use crate::utils::time::today;

/// Result of an administrative state override
#[derive(Debug, Clone, Serialize)]
pub struct StateOverride {
    pub order_id: i64,
    pub previous: StoredPaymentState,
    pub payment_state: PaymentState,
    pub payment_status: &'static str,
}

/// Result of re-summing one order's ledger
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutcome {
    pub order_id: i64,
    pub previous_paid_amount: Decimal,
    pub previous_payment_state: StoredPaymentState,
    pub paid_amount: Decimal,
    pub payment_state: PaymentState,
    /// Whether the cache differed from the ledger
    pub changed: bool,
}

/// 账本服务
#[derive(Debug, Clone)]
pub struct LedgerService {
    pool: SqlitePool,
    audit: AuditService,
    tz: Tz,
}

impl LedgerService {
    pub fn new(pool: SqlitePool, audit: AuditService, tz: Tz) -> Self {
        Self { pool, audit, tz }
    }

    /// Lock a live order for writing and load it.
    async fn lock_order(conn: &mut SqliteConnection, order_id: i64, now: i64) -> Result<Order, LedgerError> {
        if !order::lock_for_update(conn, order_id, now).await? {
            return Err(LedgerError::NotFound(order_id));
        }
        order::find_active(&mut *conn, order_id)
            .await?
            .ok_or(LedgerError::NotFound(order_id))
    }

    /// Re-sum the ledger and rewrite the cache. Returns (paid cents, state).
    ///
    /// An empty ledger gets the opening state, same as a new order.
    async fn refresh_cache(
        conn: &mut SqliteConnection,
        order: &Order,
        now: i64,
    ) -> Result<(i64, PaymentState), LedgerError> {
        let paid_cents = payment::sum_for_order(&mut *conn, order.id).await?;
        let state = if paid_cents == 0 {
            opening_state(order.total_amount)
        } else {
            ledger_state(order.total_amount, from_cents(paid_cents))
        };
        order::update_payment_cache(conn, order.id, paid_cents, state, now).await?;
        Ok((paid_cents, state))
    }

    /// 登记一笔收款
    ///
    /// Checks, in order: amount, order exists, caller's branch.
    pub async fn record_payment(
        &self,
        caller: &CurrentUser,
        order_id: i64,
        data: PaymentCreate,
    ) -> Result<PaymentReceipt, LedgerError> {
        let amount_cents = validate_payment_amount(data.amount).ok_or_else(|| {
            LedgerError::InvalidAmount(format!(
                "{} (must be positive with at most two decimals)",
                data.amount
            ))
        })?;

        let now = shared::util::now_millis();
        let mut tx = self.pool.begin().await?;

        let order = Self::lock_order(&mut tx, order_id, now).await?;
        authorize_branch(caller, order.branch_id)?;

        let new_payment = payment::NewPayment {
            order_id,
            amount_cents,
            method: data.method,
            paid_at: data.paid_at.unwrap_or_else(|| today(self.tz)),
            note: data.note.as_deref(),
            created_by: Some(caller.id),
        };
        let payment = payment::insert(&mut tx, &new_payment, now).await?;
        let (paid_cents, state) = Self::refresh_cache(&mut tx, &order, now).await?;

        self.audit
            .record(
                &mut tx,
                AuditRecord::new(AuditAction::PaymentCreate, "order", Some(order_id))
                    .actor(caller)
                    .branch(order.branch_id)
                    .details(json!({
                        "payment_id": payment.id,
                        "amount": payment.amount.to_string(),
                        "method": payment.method.as_str(),
                        "paid_at": payment.paid_at.to_string(),
                    })),
            )
            .await;

        tx.commit().await?;

        let new_paid_amount = from_cents(paid_cents);
        tracing::info!(
            order_id,
            payment_id = payment.id,
            amount = %payment.amount,
            paid = %new_paid_amount,
            state = %state,
            actor = caller.id,
            "Payment recorded"
        );

        Ok(PaymentReceipt {
            payment,
            new_paid_amount,
            new_payment_state: state,
        })
    }

    /// 手动覆盖支付状态
    pub async fn set_payment_state(
        &self,
        caller: &CurrentUser,
        order_id: i64,
        requested: &str,
    ) -> Result<StateOverride, LedgerError> {
        let state = PaymentState::parse(requested.trim().to_ascii_uppercase().as_str())
            .ok_or_else(|| LedgerError::InvalidState(requested.to_string()))?;

        let now = shared::util::now_millis();
        let mut tx = self.pool.begin().await?;

        let order = Self::lock_order(&mut tx, order_id, now).await?;
        authorize_branch(caller, order.branch_id)?;

        order::set_payment_state(&mut tx, order_id, state, now).await?;
        self.audit
            .record(
                &mut tx,
                AuditRecord::new(AuditAction::PaymentStateOverride, "order", Some(order_id))
                    .actor(caller)
                    .branch(order.branch_id)
                    .details(json!({
                        "from": order.payment_state,
                        "to": state,
                    })),
            )
            .await;

        tx.commit().await?;
        tracing::info!(order_id, state = %state, actor = caller.id, "Payment state overridden");

        Ok(StateOverride {
            order_id,
            previous: order.payment_state,
            payment_state: state,
            payment_status: state.label(),
        })
    }

    /// 重新汇总账本并重写缓存 (仅管理员)
    pub async fn reconcile_order(
        &self,
        caller: &CurrentUser,
        order_id: i64,
    ) -> Result<ReconcileOutcome, LedgerError> {
        if !caller.is_admin() {
            return Err(LedgerError::AdminRequired(
                "Reconciliation is restricted to administrators".into(),
            ));
        }

        let now = shared::util::now_millis();
        let mut tx = self.pool.begin().await?;

        let order = Self::lock_order(&mut tx, order_id, now).await?;
        let (paid_cents, state) = Self::refresh_cache(&mut tx, &order, now).await?;
        let paid_amount = from_cents(paid_cents);
        let changed = paid_amount != order.paid_amount
            || order.payment_state != StoredPaymentState::Canonical(state);

        self.audit
            .record(
                &mut tx,
                AuditRecord::new(AuditAction::PaymentReconcile, "order", Some(order_id))
                    .actor(caller)
                    .branch(order.branch_id)
                    .details(json!({
                        "previous_paid_amount": order.paid_amount.to_string(),
                        "paid_amount": paid_amount.to_string(),
                        "previous_payment_state": order.payment_state,
                        "payment_state": state,
                    })),
            )
            .await;

        tx.commit().await?;
        if changed {
            tracing::warn!(
                order_id,
                cached = %order.paid_amount,
                ledger = %paid_amount,
                "Payment cache was stale, rewritten"
            );
        }

        Ok(ReconcileOutcome {
            order_id,
            previous_paid_amount: order.paid_amount,
            previous_payment_state: order.payment_state,
            paid_amount,
            payment_state: state,
            changed,
        })
    }

    /// 软删除订单 (与收款写入共用同一把写锁)
    pub async fn soft_delete_order(&self, caller: &CurrentUser, order_id: i64) -> Result<(), LedgerError> {
        let now = shared::util::now_millis();
        let mut tx = self.pool.begin().await?;

        let order = Self::lock_order(&mut tx, order_id, now).await?;
        authorize_branch(caller, order.branch_id)?;

        order::soft_delete(&mut tx, order_id, now).await?;
        self.audit
            .record(
                &mut tx,
                AuditRecord::new(AuditAction::OrderDelete, "order", Some(order_id))
                    .actor(caller)
                    .branch(order.branch_id)
                    .details(json!({
                        "total_amount": order.total_amount.to_string(),
                        "paid_amount": order.paid_amount.to_string(),
                    })),
            )
            .await;

        tx.commit().await?;
        tracing::info!(order_id, actor = caller.id, "Order soft-deleted");
        Ok(())
    }

    /// 更新订单状态
    ///
    /// Any role that can see the order may move it, except viewers.
    pub async fn update_status(
        &self,
        caller: &CurrentUser,
        order_id: i64,
        status: OrderStatus,
    ) -> Result<(), LedgerError> {
        let now = shared::util::now_millis();
        let mut tx = self.pool.begin().await?;

        let order = Self::lock_order(&mut tx, order_id, now).await?;
        if !Scope::for_caller(caller).allows(order.branch_id, order.manager_id) {
            return Err(LedgerError::NotFound(order_id));
        }
        if caller.role == Role::Viewer {
            return Err(LedgerError::PermissionDenied("Viewers cannot change orders".into()));
        }

        order::update_status(&mut tx, order_id, status, now).await?;
        self.audit
            .record(
                &mut tx,
                AuditRecord::new(AuditAction::OrderStatus, "order", Some(order_id))
                    .actor(caller)
                    .branch(order.branch_id)
                    .details(json!({
                        "from": order.status,
                        "to": status,
                    })),
            )
            .await;

        tx.commit().await?;
        tracing::info!(order_id, status = status.as_str(), actor = caller.id, "Order status updated");
        Ok(())
    }

    /// 订单收款流水 (按 paid_at, id 排序)
    pub async fn list_payments(&self, caller: &CurrentUser, order_id: i64) -> Result<Vec<Payment>, LedgerError> {
        let order = order::find_active(&self.pool, order_id)
            .await?
            .filter(|o| Scope::for_caller(caller).allows(o.branch_id, o.manager_id))
            .ok_or(LedgerError::NotFound(order_id))?;
        Ok(payment::find_by_order(&self.pool, order.id).await?)
    }

    /// Resolved state of an order as currently stored
    pub async fn payment_state(&self, order_id: i64) -> Result<PaymentState, LedgerError> {
        let order = order::find_active(&self.pool, order_id)
            .await?
            .ok_or(LedgerError::NotFound(order_id))?;
        let paid = from_cents(payment::sum_for_order(&self.pool, order_id).await?);
        Ok(resolve_state(order.total_amount, paid, order.payment_state).state)
    }
}
