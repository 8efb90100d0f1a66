use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A recurring monthly obligation ("sabueso"), e.g. rent or internet.
///
/// Whether it is still pending this cycle is computed against the
/// transaction list, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct FixedExpense {
    pub id: i64,
    pub name: String,
    pub amount: f64,
}
