//! The transaction model mirrored from the remote store.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::budget::BudgetId;

/// The ID of a transaction.
pub type TransactionId = i64;

/// An expense or income, i.e. an event where money was either spent or
/// earned.
///
/// Transactions are owned by the remote store. The client appends confirmed
/// pages of them to its local cache and never mutates them optimistically;
/// a transaction only changes through a successful API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The amount of money spent or earned in this transaction.
    ///
    /// Negative amounts record refunds and credits.
    pub amount: f64,
    /// When the transaction happened.
    pub date: Date,
    /// The category the transaction belongs to, e.g. "Groceries".
    pub category: String,
    /// The budget this transaction counts towards, if any.
    #[serde(default)]
    pub budget_id: Option<BudgetId>,
}
