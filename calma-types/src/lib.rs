pub mod fixed_expense;
pub mod state;
pub mod totals;
pub mod transaction;

pub use fixed_expense::FixedExpense;
pub use state::{
    AppState, Colchon, ColchonPatch, NormalizeError, StateOverlay, SCHEMA_VERSION,
};
pub use totals::Totals;
pub use transaction::{Transaction, TransactionKind};
