//! The budget model and its derived spend computation.

use serde::{Deserialize, Serialize};

use crate::{money, transaction::Transaction};

/// The ID of a budget.
pub type BudgetId = i64;

/// A monthly spending limit for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// The ID of the budget.
    pub id: BudgetId,
    /// The category this budget covers, e.g. "Groceries".
    pub category: String,
    /// The spending limit for the month.
    pub limit: f64,
    /// The amount spent against the limit so far.
    ///
    /// Derived, never authoritative. The service may send a value, but the
    /// client recomputes it from the transactions it holds via
    /// [Budget::recompute_spent] whenever those transactions change.
    #[serde(default)]
    pub spent: f64,
    /// The month this budget applies to (1-12).
    pub month: u8,
    /// The year this budget applies to.
    pub year: i32,
}

impl Budget {
    /// Recompute `spent` from a set of transactions.
    ///
    /// Only transactions referencing this budget and dated within its month
    /// and year are counted. The sum is accumulated as integer cents so
    /// that repeated additions and subtractions (refunds) cannot build up
    /// floating-point drift.
    pub fn recompute_spent(&mut self, transactions: &[Transaction]) {
        self.spent = money::sum_amounts(
            transactions
                .iter()
                .filter(|transaction| self.covers(transaction))
                .map(|transaction| transaction.amount),
        );
    }

    /// Whether `transaction` counts towards this budget.
    fn covers(&self, transaction: &Transaction) -> bool {
        transaction.budget_id == Some(self.id)
            && u8::from(transaction.date.month()) == self.month
            && transaction.date.year() == self.year
    }

    /// Whether more than the limit has been spent.
    ///
    /// Compared at cent granularity, not as raw floats, so a spend that is
    /// equal to the limit after rounding does not count as over.
    pub fn is_over(&self) -> bool {
        money::to_cents(self.spent) > money::to_cents(self.limit)
    }

    /// How far over the limit the spend is, or `0.0` when within budget.
    pub fn overspend(&self) -> f64 {
        if self.is_over() {
            money::overspend_delta(self.limit, self.spent)
        } else {
            0.0
        }
    }

    /// How much of the limit is left to spend, or `0.0` when over budget.
    pub fn remaining(&self) -> f64 {
        if self.is_over() {
            0.0
        } else {
            money::overspend_delta(self.limit, self.spent)
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::transaction::Transaction;

    use super::Budget;

    fn groceries_budget(limit: f64) -> Budget {
        Budget {
            id: 7,
            category: "Groceries".to_string(),
            limit,
            spent: 0.0,
            month: 3,
            year: 2026,
        }
    }

    fn transaction(id: i64, amount: f64, budget_id: Option<i64>) -> Transaction {
        Transaction {
            id,
            amount,
            date: date!(2026 - 03 - 14),
            category: "Groceries".to_string(),
            budget_id,
        }
    }

    #[test]
    fn recompute_spent_sums_matching_transactions_exactly() {
        let mut budget = groceries_budget(150.10);
        let transactions = [
            transaction(1, 0.1, Some(7)),
            transaction(2, 0.2, Some(7)),
            transaction(3, 0.3, Some(7)),
            transaction(4, 50.10, Some(7)),
        ];

        budget.recompute_spent(&transactions);

        assert_eq!(budget.spent, 50.70);
    }

    #[test]
    fn recompute_spent_ignores_other_budgets_and_months() {
        let mut budget = groceries_budget(100.0);
        let other_month = Transaction {
            date: date!(2026 - 04 - 01),
            ..transaction(3, 40.0, Some(7))
        };
        let transactions = [
            transaction(1, 25.0, Some(7)),
            transaction(2, 60.0, Some(8)),
            other_month,
            transaction(4, 10.0, None),
        ];

        budget.recompute_spent(&transactions);

        assert_eq!(budget.spent, 25.0);
    }

    #[test]
    fn recompute_spent_subtracts_refunds() {
        let mut budget = groceries_budget(100.0);
        let transactions = [
            transaction(1, 80.50, Some(7)),
            transaction(2, -20.25, Some(7)),
        ];

        budget.recompute_spent(&transactions);

        assert_eq!(budget.spent, 60.25);
    }

    #[test]
    fn overspend_is_exact_and_zero_when_under() {
        let mut over = groceries_budget(150.10);
        over.spent = 200.00;
        let mut under = groceries_budget(150.10);
        under.spent = 100.20;

        assert!(over.is_over());
        assert_eq!(over.overspend(), 49.90);
        assert!(!under.is_over());
        assert_eq!(under.overspend(), 0.0);
        assert_eq!(under.remaining(), 49.90);
    }

    #[test]
    fn spend_equal_to_limit_is_not_over() {
        let mut budget = groceries_budget(100.0);
        budget.spent = 100.0;

        assert!(!budget.is_over());
        assert_eq!(budget.remaining(), 0.0);
    }
}
