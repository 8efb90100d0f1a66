use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::fixed_expense::FixedExpense;
use crate::transaction::{Transaction, TransactionKind};

/// Current schema version stamped on every persisted blob.
pub const SCHEMA_VERSION: &str = "4.0.0";

/// Savings-goal cushion ("colchón") tracked as current/goal amounts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
pub struct Colchon {
    pub goal: f64,
    pub current: f64,
}

/// The canonical in-memory representation of all user data.
///
/// Wire form is camelCase JSON, compatible with blobs written by the web
/// frontend under the `"state"` and `"calma_data"` keys. `total_income` and
/// `total_spent` are derived aggregates: they are recomputed from the
/// transaction list after every mutation and never set directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    pub version: String,
    pub user_name: String,
    pub dark_mode: bool,
    pub incognito_mode: bool,
    pub total_income: f64,
    pub total_spent: f64,
    /// Newest-first: new entries are prepended.
    pub transactions: Vec<Transaction>,
    pub fixed_expenses: Vec<FixedExpense>,
    pub colchon: Colchon,
    /// Transient UI selector; persisted with the blob but not a business fact.
    pub current_type: TransactionKind,
    pub pin: String,
    pub pin_enabled: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            user_name: "Amigo".to_string(),
            dark_mode: false,
            incognito_mode: false,
            total_income: 0.0,
            total_spent: 0.0,
            transactions: Vec::new(),
            fixed_expenses: Vec::new(),
            colchon: Colchon {
                goal: 1_500_000.0,
                current: 0.0,
            },
            current_type: TransactionKind::Expense,
            pin: String::new(),
            pin_enabled: false,
        }
    }
}

impl AppState {
    /// Sample ledger used only when both storage backends are empty.
    pub fn starter() -> Self {
        Self {
            transactions: vec![
                Transaction {
                    id: 1,
                    kind: TransactionKind::Expense,
                    name: "Supermercado".to_string(),
                    amount: 85_000.0,
                    date: "Hoy, 14:20".to_string(),
                },
                Transaction {
                    id: 2,
                    kind: TransactionKind::Income,
                    name: "Venta Diseño".to_string(),
                    amount: 450_000.0,
                    date: "Ayer, 18:00".to_string(),
                },
            ],
            fixed_expenses: vec![
                FixedExpense {
                    id: 1,
                    name: "Arriendo".to_string(),
                    amount: 500_000.0,
                },
                FixedExpense {
                    id: 2,
                    name: "Internet".to_string(),
                    amount: 30_000.0,
                },
            ],
            colchon: Colchon {
                goal: 1_500_000.0,
                current: 450_000.0,
            },
            ..Self::default()
        }
    }

    /// Normalize a partial blob into a canonical state.
    ///
    /// Shallow field-by-field overlay over the defaults: any field absent in
    /// `partial` keeps its default, any field present overwrites it. The
    /// `colchon` sub-record is itself shallow-merged. The schema version is
    /// always forced to [`SCHEMA_VERSION`] and the derived totals are
    /// recomputed, regardless of what `partial` carried for them.
    pub fn normalize(partial: serde_json::Value) -> Result<Self, NormalizeError> {
        let overlay: StateOverlay = serde_json::from_value(partial)?;
        let mut state = Self::default();
        state.apply_overlay(overlay);
        Ok(state)
    }

    /// Overlay present fields of `overlay` onto `self`, then restamp the
    /// version and recompute totals.
    pub fn apply_overlay(&mut self, overlay: StateOverlay) {
        if let Some(user_name) = overlay.user_name {
            self.user_name = user_name;
        }
        if let Some(dark_mode) = overlay.dark_mode {
            self.dark_mode = dark_mode;
        }
        if let Some(incognito_mode) = overlay.incognito_mode {
            self.incognito_mode = incognito_mode;
        }
        if let Some(transactions) = overlay.transactions {
            self.transactions = transactions;
        }
        if let Some(fixed_expenses) = overlay.fixed_expenses {
            self.fixed_expenses = fixed_expenses;
        }
        if let Some(colchon) = overlay.colchon {
            colchon.apply_to(&mut self.colchon);
        }
        if let Some(current_type) = overlay.current_type {
            self.current_type = current_type;
        }
        if let Some(pin) = overlay.pin {
            self.pin = pin;
        }
        if let Some(pin_enabled) = overlay.pin_enabled {
            self.pin_enabled = pin_enabled;
        }

        self.version = SCHEMA_VERSION.to_string();
        self.recalculate_totals();
    }
}

/// Typed form of a partial state blob, as read from either storage backend
/// or handed to `IMPORT_DATA`.
///
/// A present field with the wrong shape fails deserialization; callers decide
/// whether that degrades (migration chain) or rejects (import).
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateOverlay {
    pub user_name: Option<String>,
    pub dark_mode: Option<bool>,
    pub incognito_mode: Option<bool>,
    pub transactions: Option<Vec<Transaction>>,
    pub fixed_expenses: Option<Vec<FixedExpense>>,
    pub colchon: Option<ColchonPatch>,
    pub current_type: Option<TransactionKind>,
    pub pin: Option<String>,
    pub pin_enabled: Option<bool>,
}

/// Partial update for the savings goal, as sent by `UPDATE_COLCHON`
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, TS)]
pub struct ColchonPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<f64>,
}

impl ColchonPatch {
    pub fn apply_to(&self, colchon: &mut Colchon) {
        if let Some(goal) = self.goal {
            colchon.goal = goal;
        }
        if let Some(current) = self.current {
            colchon.current = current;
        }
    }
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("state payload has an invalid shape: {0}")]
    InvalidShape(#[from] serde_json::Error),
}
