//! Scope Filter
//!
//! Single source of the row-visibility predicate. Every read path (listing,
//! summary, timeline, top-N, payment stats, filter options) pushes its
//! predicate through [`apply_scope`]; the write path uses [`authorize_branch`].
//!
//! | role | visibility |
//! |---|---|
//! | admin | all |
//! | manager / accountant / viewer | own branch (no branch ⇒ all) |
//! | staff | orders they manage |
//! | unknown | nothing |
//!
//! Queries must alias `orders` as `o`.

use chrono::NaiveDate;
use chrono_tz::Tz;
use shared::models::{CustomerType, Role};
use sqlx::{QueryBuilder, Sqlite};

use crate::auth::CurrentUser;
use crate::ledger::LedgerError;
use crate::utils::time::{day_end_millis, day_start_millis};

/// Rows a caller may see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Branch(i64),
    Manager(i64),
    Nothing,
}

impl Scope {
    pub fn for_caller(caller: &CurrentUser) -> Self {
        match caller.role {
            Role::Admin => Scope::All,
            Role::Manager | Role::Accountant | Role::Viewer => match caller.branch_id {
                Some(branch) => Scope::Branch(branch),
                None => Scope::All,
            },
            Role::Staff => Scope::Manager(caller.id),
            Role::Unknown => Scope::Nothing,
        }
    }

    /// In-memory counterpart of the SQL predicate
    pub fn allows(&self, branch_id: Option<i64>, manager_id: Option<i64>) -> bool {
        match self {
            Scope::All => true,
            Scope::Branch(b) => branch_id == Some(*b),
            Scope::Manager(m) => manager_id == Some(*m),
            Scope::Nothing => false,
        }
    }

    /// Branch restriction for reference lists (branches, managers)
    pub fn branch(&self) -> Option<i64> {
        match self {
            Scope::Branch(b) => Some(*b),
            _ => None,
        }
    }
}

/// Filters shared by listing and every aggregate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeFilters {
    pub branch_id: Option<i64>,
    pub manager_id: Option<i64>,
    pub customer_type: Option<CustomerType>,
    pub doc_type: Option<String>,
    /// Created-date range, business timezone, both ends inclusive
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
}

impl ScopeFilters {
    /// Lenient customer type: unknown values are dropped
    pub fn parse_customer_type(value: Option<&str>) -> Option<CustomerType> {
        let value = value?.trim();
        CustomerType::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(value))
    }
}

/// Validate explicit branch/manager filters against the caller's role
pub fn check_filters(caller: &CurrentUser, filters: &ScopeFilters) -> Result<(), LedgerError> {
    if let Some(requested) = filters.branch_id {
        let allowed = match caller.role {
            Role::Admin => true,
            Role::Manager | Role::Accountant => {
                caller.branch_id.is_none() || caller.branch_id == Some(requested)
            }
            _ => false,
        };
        if !allowed {
            return Err(LedgerError::Forbidden(format!(
                "Branch {requested} is outside your scope"
            )));
        }
    }

    if let Some(requested) = filters.manager_id
        && caller.role == Role::Staff
        && requested != caller.id
    {
        return Err(LedgerError::Forbidden(
            "Staff may only filter by their own orders".into(),
        ));
    }

    Ok(())
}

/// Push ` AND ...` clauses for the caller's scope and the shared filters.
///
/// The builder must already contain a `WHERE`.
pub fn apply_scope(
    qb: &mut QueryBuilder<'_, Sqlite>,
    caller: &CurrentUser,
    filters: &ScopeFilters,
    tz: Tz,
) -> Result<(), LedgerError> {
    check_filters(caller, filters)?;

    match Scope::for_caller(caller) {
        Scope::All => {}
        Scope::Branch(branch) => {
            qb.push(" AND o.branch_id = ").push_bind(branch);
        }
        Scope::Manager(manager) => {
            qb.push(" AND o.manager_id = ").push_bind(manager);
        }
        Scope::Nothing => {
            qb.push(" AND 0 = 1");
        }
    }

    if let Some(branch) = filters.branch_id {
        qb.push(" AND o.branch_id = ").push_bind(branch);
    }
    if let Some(manager) = filters.manager_id {
        qb.push(" AND o.manager_id = ").push_bind(manager);
    }
    if let Some(customer_type) = filters.customer_type {
        qb.push(" AND o.customer_type = ")
            .push_bind(customer_type.as_str());
    }
    if let Some(doc_type) = filters.doc_type.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        qb.push(" AND TRIM(o.doc_type) = ")
            .push_bind(doc_type.to_string());
    }
    if let Some(from) = filters.created_from {
        qb.push(" AND o.created_at >= ")
            .push_bind(day_start_millis(from, tz));
    }
    if let Some(to) = filters.created_to {
        qb.push(" AND o.created_at < ").push_bind(day_end_millis(to, tz));
    }

    Ok(())
}

/// Write-side check: may the caller touch an order of `order_branch`?
pub fn authorize_branch(caller: &CurrentUser, order_branch: Option<i64>) -> Result<(), LedgerError> {
    let allowed = match caller.role {
        Role::Admin => true,
        Role::Manager | Role::Accountant => match caller.branch_id {
            None => true,
            Some(own) => order_branch == Some(own),
        },
        _ => {
            return Err(LedgerError::PermissionDenied(format!(
                "Role {} may not modify orders",
                caller.role
            )));
        }
    };

    if allowed {
        Ok(())
    } else {
        Err(LedgerError::Forbidden(
            "Order belongs to another branch".into(),
        ))
    }
}
