//! Top-N 文书类型 / 客户类型

use serde::Serialize;

use super::bucket::UNKNOWN_BUCKET;
use super::{AggregationService, DashboardQuery};
use crate::auth::CurrentUser;
use crate::ledger::LedgerError;

/// Entries kept per dimension
pub const TOP_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopEntry {
    pub label: String,
    pub value: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopReport {
    pub doc_types: Vec<TopEntry>,
    pub customer_types: Vec<TopEntry>,
}

/// Count labels, highest first; ties keep first-encounter order.
fn most_common<I>(labels: I, limit: usize) -> Vec<TopEntry>
where
    I: IntoIterator<Item = String>,
{
    let mut counts: Vec<TopEntry> = Vec::new();
    for label in labels {
        match counts.iter_mut().find(|e| e.label == label) {
            Some(entry) => entry.value += 1,
            None => counts.push(TopEntry { label, value: 1 }),
        }
    }
    // stable sort keeps encounter order among equal counts
    counts.sort_by(|a, b| b.value.cmp(&a.value));
    counts.truncate(limit);
    counts
}

impl AggregationService {
    pub async fn top(
        &self,
        caller: &CurrentUser,
        query: &DashboardQuery,
    ) -> Result<TopReport, LedgerError> {
        let orders = self.scoped_orders(caller, &query.scope_filters()).await?;

        let doc_types = orders.iter().map(|o| {
            o.doc_type
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .unwrap_or(UNKNOWN_BUCKET)
                .to_string()
        });
        let customer_types = orders.iter().map(|o| {
            o.customer_type
                .map(|c| c.as_str())
                .unwrap_or(UNKNOWN_BUCKET)
                .to_string()
        });

        Ok(TopReport {
            doc_types: most_common(doc_types, TOP_LIMIT),
            customer_types: most_common(customer_types, TOP_LIMIT),
        })
    }
}
