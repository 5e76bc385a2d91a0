//! Listing Engine
//!
//! Scoped, filtered, sorted, paginated order rows. Paid amounts come from
//! the ledger (SUM over `payment`), never from the order's cached column,
//! and every row is shaped through the Reconciliation Resolver.

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Deserialize;
use shared::models::{
    CustomerType, OrderDetail, OrderPage, OrderStatus, OrderView, PaymentState,
    StoredPaymentState,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::auth::CurrentUser;
use crate::db::repository::{attachment, payment};
use crate::ledger::LedgerError;
use crate::money::from_cents;
use crate::reconcile::{balance, resolve_state};
use crate::scope::{ScopeFilters, apply_scope};
use crate::utils::time::{day_end_millis, day_start_millis, parse_date_opt};

const SELECT_COLUMNS: &str = "SELECT o.id, o.client_id, c.full_name AS client_name, c.phone AS client_phone, o.branch_id, b.name AS branch_name, o.manager_id, e.display_name AS manager_name, o.status, o.customer_type, o.doc_type, o.country, o.payment_method, o.deadline, o.created_at, o.total_amount, COALESCE(p.paid, 0) AS paid_cents, o.payment_state, o.notes";

const FROM_CLAUSE: &str = " FROM orders o LEFT JOIN client c ON c.id = o.client_id LEFT JOIN branch b ON b.id = o.branch_id LEFT JOIN employee e ON e.id = o.manager_id LEFT JOIN (SELECT order_id, SUM(amount) AS paid FROM payment GROUP BY order_id) p ON p.order_id = o.id WHERE o.deleted_at IS NULL";

/// Ledger sum in cents, as a SQL expression over `FROM_CLAUSE`
const PAID: &str = "COALESCE(p.paid, 0)";

/// Sortable keys → SQL expression
const SORT_KEYS: [(&str, &str); 9] = [
    ("id", "o.id"),
    ("created_at", "o.created_at"),
    ("deadline", "o.deadline"),
    ("total_amount", "o.total_amount"),
    ("paid_amount", PAID),
    ("status", "o.status"),
    ("doc_type", "o.doc_type"),
    ("customer_type", "o.customer_type"),
    ("country", "o.country"),
];

/// Raw query string of `GET /api/orders`. Every value is parsed leniently.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort: Option<String>,
    pub dir: Option<String>,
    /// Client name or phone
    pub q: Option<String>,
    pub payment_state: Option<String>,
    pub debt_only: Option<String>,
    pub deadline_from: Option<String>,
    pub deadline_to: Option<String>,
    pub created_from: Option<String>,
    pub created_to: Option<String>,
    pub branch_id: Option<i64>,
    pub manager_id: Option<i64>,
    pub customer_type: Option<String>,
    pub doc_type: Option<String>,
}

impl OrderListQuery {
    pub fn scope_filters(&self) -> ScopeFilters {
        ScopeFilters {
            branch_id: self.branch_id,
            manager_id: self.manager_id,
            customer_type: ScopeFilters::parse_customer_type(self.customer_type.as_deref()),
            doc_type: self.doc_type.clone(),
            created_from: parse_date_opt(self.created_from.as_deref()),
            created_to: parse_date_opt(self.created_to.as_deref()),
        }
    }
}

/// Parsed listing filters
#[derive(Debug, Clone, Default)]
struct ListingFilters {
    scope: ScopeFilters,
    search: Option<String>,
    payment_state: Option<PaymentState>,
    debt_only: bool,
    deadline_from: Option<NaiveDate>,
    deadline_to: Option<NaiveDate>,
}

impl From<&OrderListQuery> for ListingFilters {
    fn from(q: &OrderListQuery) -> Self {
        Self {
            scope: q.scope_filters(),
            search: q
                .q
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            payment_state: q
                .payment_state
                .as_deref()
                .and_then(|s| PaymentState::parse(s.trim().to_ascii_uppercase().as_str())),
            debt_only: q
                .debt_only
                .as_deref()
                .is_some_and(|v| matches!(v.trim(), "1" | "true" | "yes" | "on")),
            deadline_from: parse_date_opt(q.deadline_from.as_deref()),
            deadline_to: parse_date_opt(q.deadline_to.as_deref()),
        }
    }
}

/// Which date `orders_by_date` matches on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateMode {
    #[default]
    Created,
    Deadline,
}

impl DateMode {
    /// Anything but `deadline` means created
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("deadline") => DateMode::Deadline,
            _ => DateMode::Created,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ListingRow {
    id: i64,
    client_id: i64,
    client_name: Option<String>,
    client_phone: Option<String>,
    branch_id: Option<i64>,
    branch_name: Option<String>,
    manager_id: Option<i64>,
    manager_name: Option<String>,
    status: OrderStatus,
    customer_type: Option<CustomerType>,
    doc_type: Option<String>,
    country: Option<String>,
    payment_method: Option<String>,
    deadline: Option<NaiveDate>,
    created_at: i64,
    total_amount: i64,
    paid_cents: i64,
    payment_state: Option<String>,
    notes: Option<String>,
}

impl From<ListingRow> for OrderView {
    fn from(r: ListingRow) -> Self {
        let total = from_cents(r.total_amount);
        let paid = from_cents(r.paid_cents);
        let resolution = resolve_state(
            total,
            paid,
            StoredPaymentState::from_column(r.payment_state.as_deref()),
        );
        OrderView {
            id: r.id,
            client_id: r.client_id,
            client_name: r.client_name,
            client_phone: r.client_phone,
            branch_id: r.branch_id,
            branch_name: r.branch_name,
            manager_id: r.manager_id,
            manager_name: r.manager_name,
            status: r.status,
            customer_type: r.customer_type,
            doc_type: r.doc_type,
            country: r.country,
            payment_method: r.payment_method,
            deadline: r.deadline,
            created_at: r.created_at,
            total_amount: total,
            paid_amount: paid,
            balance: balance(total, paid),
            payment_state: resolution.state,
            payment_status: resolution.label.to_string(),
            notes: r.notes,
        }
    }
}

/// SQL predicate matching orders whose *resolved* state is `state`:
/// the stored canonical value, or the computed one when nothing canonical is stored.
fn push_payment_state(qb: &mut QueryBuilder<'_, Sqlite>, state: PaymentState) {
    let computed = match state {
        PaymentState::Unpaid => format!("{PAID} <= 0"),
        PaymentState::Paid => {
            format!("{PAID} > 0 AND (o.total_amount <= 0 OR {PAID} + 1 >= o.total_amount)")
        }
        PaymentState::Partial => {
            format!("{PAID} > 0 AND o.total_amount > 0 AND {PAID} + 1 < o.total_amount")
        }
    };
    qb.push(" AND (o.payment_state = ")
        .push_bind(state.as_str())
        .push(" OR ((o.payment_state IS NULL OR o.payment_state NOT IN ('UNPAID', 'PARTIAL', 'PAID')) AND ")
        .push(computed)
        .push("))");
}

fn push_filters(
    qb: &mut QueryBuilder<'_, Sqlite>,
    caller: &CurrentUser,
    filters: &ListingFilters,
    tz: Tz,
) -> Result<(), LedgerError> {
    apply_scope(qb, caller, &filters.scope, tz)?;

    if let Some(search) = &filters.search {
        let pattern = format!("%{search}%");
        // LIKE folds ASCII case only; other scripts match as typed
        qb.push(" AND (c.full_name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR COALESCE(c.phone, '') LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(from) = filters.deadline_from {
        qb.push(" AND o.deadline >= ").push_bind(from);
    }
    if let Some(to) = filters.deadline_to {
        qb.push(" AND o.deadline <= ").push_bind(to);
    }
    if filters.debt_only {
        qb.push(format!(" AND o.total_amount > {PAID}"));
    }
    if let Some(state) = filters.payment_state {
        push_payment_state(qb, state);
    }
    Ok(())
}

/// Whitelisted sort expression and direction; unknown values fall back to `id desc`
fn sort_clause(sort: Option<&str>, dir: Option<&str>) -> String {
    let column = sort
        .map(str::trim)
        .and_then(|key| SORT_KEYS.iter().find(|(k, _)| *k == key))
        .map(|(_, expr)| *expr)
        .unwrap_or("o.id");
    let direction = match dir.map(str::trim) {
        Some(d) if d.eq_ignore_ascii_case("asc") => "ASC",
        _ => "DESC",
    };
    if column == "o.id" {
        format!(" ORDER BY o.id {direction}")
    } else {
        format!(" ORDER BY {column} {direction}, o.id {direction}")
    }
}

/// 订单列表服务
#[derive(Debug, Clone)]
pub struct ListingService {
    pool: SqlitePool,
    tz: Tz,
    default_page_size: u32,
    max_page_size: u32,
}

impl ListingService {
    pub fn new(pool: SqlitePool, tz: Tz, default_page_size: u32, max_page_size: u32) -> Self {
        let max_page_size = max_page_size.max(1);
        Self {
            pool,
            tz,
            default_page_size: default_page_size.clamp(1, max_page_size),
            max_page_size,
        }
    }

    /// 1-based page, size clamped to `1..=max_page_size`
    fn page_bounds(&self, page: Option<i64>, size: Option<i64>) -> (u32, u32) {
        let page = page.unwrap_or(1).clamp(1, u32::MAX as i64) as u32;
        let size = size
            .unwrap_or(self.default_page_size as i64)
            .clamp(1, self.max_page_size as i64) as u32;
        (page, size)
    }

    pub async fn list_orders(
        &self,
        caller: &CurrentUser,
        query: &OrderListQuery,
    ) -> Result<OrderPage, LedgerError> {
        let filters = ListingFilters::from(query);
        let (page, size) = self.page_bounds(query.page, query.size);

        let mut count_qb = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*){FROM_CLAUSE}"));
        push_filters(&mut count_qb, caller, &filters, self.tz)?;
        let total: i64 = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!("{SELECT_COLUMNS}{FROM_CLAUSE}"));
        push_filters(&mut qb, caller, &filters, self.tz)?;
        qb.push(sort_clause(query.sort.as_deref(), query.dir.as_deref()));
        qb.push(" LIMIT ")
            .push_bind(size as i64)
            .push(" OFFSET ")
            .push_bind((page as i64 - 1) * size as i64);

        let rows: Vec<ListingRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        tracing::debug!(total, page, size, returned = rows.len(), "Orders listed");

        Ok(OrderPage {
            items: rows.into_iter().map(OrderView::from).collect(),
            total,
            page,
            size,
        })
    }

    /// Single order with its ledger and attachment summary. Invisible ⇒ NotFound.
    pub async fn get_order(&self, caller: &CurrentUser, order_id: i64) -> Result<OrderDetail, LedgerError> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("{SELECT_COLUMNS}{FROM_CLAUSE}"));
        qb.push(" AND o.id = ").push_bind(order_id);
        apply_scope(&mut qb, caller, &ScopeFilters::default(), self.tz)?;

        let row: ListingRow = qb
            .build_query_as()
            .fetch_optional(&self.pool)
            .await?
            .ok_or(LedgerError::NotFound(order_id))?;

        let payments = payment::find_by_order(&self.pool, order_id).await?;
        let attachments = attachment::counts_for_order(&self.pool, order_id).await?;

        Ok(OrderDetail {
            order: row.into(),
            payments,
            attachments,
        })
    }

    /// All visible orders created on (or due on) one business date
    pub async fn orders_by_date(
        &self,
        caller: &CurrentUser,
        date: NaiveDate,
        mode: DateMode,
    ) -> Result<Vec<OrderView>, LedgerError> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("{SELECT_COLUMNS}{FROM_CLAUSE}"));
        apply_scope(&mut qb, caller, &ScopeFilters::default(), self.tz)?;
        match mode {
            DateMode::Created => {
                qb.push(" AND o.created_at >= ")
                    .push_bind(day_start_millis(date, self.tz))
                    .push(" AND o.created_at < ")
                    .push_bind(day_end_millis(date, self.tz));
            }
            DateMode::Deadline => {
                qb.push(" AND o.deadline = ").push_bind(date);
            }
        }
        qb.push(" ORDER BY o.id ASC");

        let rows: Vec<ListingRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(OrderView::from).collect())
    }
}
