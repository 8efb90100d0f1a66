use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Direction of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

/// A single income or expense entry in the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Transaction {
    pub id: i64,

    #[serde(rename = "type")]
    pub kind: TransactionKind,

    pub name: String,
    pub amount: f64,

    /// Pre-formatted local timestamp for display, e.g. "30 ago, 14:20"
    pub date: String,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }
}
