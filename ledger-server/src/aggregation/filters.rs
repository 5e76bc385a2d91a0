//! Filter options for the dashboard and order list

use std::collections::BTreeSet;

use serde::Serialize;
use shared::models::{CustomerType, Role};

use super::AggregationService;
use crate::auth::CurrentUser;
use crate::db::repository::reference::{self, BranchRef, ManagerRef};
use crate::ledger::LedgerError;
use crate::scope::{Scope, ScopeFilters};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub branches: Vec<BranchRef>,
    pub managers: Vec<ManagerRef>,
    /// Distinct trimmed doc types among visible orders, sorted
    pub doc_types: Vec<String>,
    pub customer_types: Vec<CustomerType>,
}

impl AggregationService {
    pub async fn filter_options(&self, caller: &CurrentUser) -> Result<FilterOptions, LedgerError> {
        let scope = Scope::for_caller(caller);
        if scope == Scope::Nothing {
            return Ok(FilterOptions {
                customer_types: CustomerType::ALL.to_vec(),
                ..Default::default()
            });
        }

        let own_branch = if caller.role == Role::Admin {
            None
        } else {
            caller.branch_id
        };
        let branches = match (caller.role, own_branch) {
            (Role::Admin, _) => reference::list_branches(&self.pool, None).await?,
            (_, Some(branch)) => reference::list_branches(&self.pool, Some(branch)).await?,
            // Unassigned non-admins only see branches when their scope is unrestricted
            (_, None) if scope == Scope::All => reference::list_branches(&self.pool, None).await?,
            (_, None) => Vec::new(),
        };
        let managers = reference::list_managers(&self.pool, own_branch).await?;

        let orders = self.scoped_orders(caller, &ScopeFilters::default()).await?;
        let doc_types: BTreeSet<String> = orders
            .iter()
            .filter_map(|o| o.doc_type.as_deref().map(str::trim))
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .collect();

        Ok(FilterOptions {
            branches,
            managers,
            doc_types: doc_types.into_iter().collect(),
            customer_types: CustomerType::ALL.to_vec(),
        })
    }
}
