use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::state::AppState;
use crate::transaction::Transaction;

/// Aggregate pair derived from the transaction list
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct Totals {
    pub income: f64,
    pub spent: f64,
}

/// Single O(n) pass over the ledger, partitioning amounts by kind.
pub fn compute(transactions: &[Transaction]) -> Totals {
    let mut totals = Totals::default();
    for transaction in transactions {
        if transaction.is_income() {
            totals.income += transaction.amount;
        } else {
            totals.spent += transaction.amount;
        }
    }
    totals
}

impl AppState {
    /// Rewrite the derived `total_income` / `total_spent` fields from the
    /// current transaction list.
    pub fn recalculate_totals(&mut self) {
        let totals = compute(&self.transactions);
        self.total_income = totals.income;
        self.total_spent = totals.spent;
    }
}
