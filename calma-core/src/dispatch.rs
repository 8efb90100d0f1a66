use calma_types::{
    AppState, ColchonPatch, FixedExpense, StateOverlay, Transaction, TransactionKind,
};
use chrono::{DateTime, Datelike, Local, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::{persist_state, SqliteStore};

/// External collaborators that react to state changes: the rendering layer,
/// the theme toggle, the incognito blur and transient notices. Every hook
/// defaults to a no-op so headless hosts and tests only wire what they need.
pub trait ViewSink {
    fn render(&self, _state: &AppState) {}
    fn apply_theme(&self, _dark_mode: bool) {}
    fn set_incognito(&self, _active: bool) {}
    fn notify(&self, _message: &str) {}
}

/// A [`ViewSink`] that ignores every signal.
pub struct NullView;

impl ViewSink for NullView {}

/// Named mutations accepted by the dispatcher.
///
/// The wire form is the `{action, payload}` object the frontend sends, e.g.
/// `{"action": "ADD_TRANSACTION", "payload": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    SetUserName(String),
    ToggleDarkMode(bool),
    ToggleIncognito,
    AddTransaction {
        name: String,
        amount: f64,
        #[serde(rename = "type")]
        kind: TransactionKind,
    },
    DeleteTransaction(i64),
    UpdateColchon(ColchonPatch),
    AddFixed {
        name: String,
        amount: f64,
    },
    DeleteFixed(i64),
    ClearData,
    SetPin(String),
    TogglePin(bool),
    ImportData(serde_json::Value),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::SetUserName(_) => "SET_USER_NAME",
            Action::ToggleDarkMode(_) => "TOGGLE_DARK_MODE",
            Action::ToggleIncognito => "TOGGLE_INCOGNITO",
            Action::AddTransaction { .. } => "ADD_TRANSACTION",
            Action::DeleteTransaction(_) => "DELETE_TRANSACTION",
            Action::UpdateColchon(_) => "UPDATE_COLCHON",
            Action::AddFixed { .. } => "ADD_FIXED",
            Action::DeleteFixed(_) => "DELETE_FIXED",
            Action::ClearData => "CLEAR_DATA",
            Action::SetPin(_) => "SET_PIN",
            Action::TogglePin(_) => "TOGGLE_PIN",
            Action::ImportData(_) => "IMPORT_DATA",
        }
    }
}

enum Outcome {
    /// Mutation applied; persist and render.
    Applied,
    /// Invalid input; the view was notified, state untouched.
    Rejected,
    /// Nothing to do (e.g. deleting an id that does not exist).
    Noop,
}

/// The sole mutation gateway around the canonical state.
///
/// Owns the state, the sqlite store and the view sink. `&mut self` on
/// [`dispatch`](Dispatcher::dispatch) keeps mutation single-writer: a
/// multi-threaded host must funnel all dispatches through the one owner.
pub struct Dispatcher<V: ViewSink> {
    state: AppState,
    db: SqliteStore,
    view: V,
    last_id: i64,
}

impl<V: ViewSink> Dispatcher<V> {
    pub fn new(state: AppState, db: SqliteStore, view: V) -> Self {
        let last_id = last_used_id(&state);
        Self {
            state,
            db,
            view,
            last_id,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Set the transient income/expense selector. Not a dispatched action:
    /// it carries no business meaning and does not persist or render on its
    /// own, it just rides along in the next saved blob.
    pub fn set_current_type(&mut self, kind: TransactionKind) {
        self.state.current_type = kind;
    }

    /// Apply one action. Applied mutations are followed by persistence to the
    /// sqlite store and a render signal; rejected and no-op dispatches skip
    /// both. Persistence failures are logged, never surfaced.
    pub async fn dispatch(&mut self, action: Action) {
        debug!("[dispatch] {}", action.name());

        match self.apply(action) {
            Outcome::Applied => {
                persist_state(&self.db, &self.state).await;
                self.view.render(&self.state);
            }
            Outcome::Rejected | Outcome::Noop => {}
        }
    }

    /// String-keyed entry point for frontends dispatching raw
    /// `{action, payload}` objects. Unrecognized actions are logged and leave
    /// the state unchanged.
    pub async fn dispatch_named(&mut self, message: serde_json::Value) {
        match serde_json::from_value::<Action>(message) {
            Ok(action) => self.dispatch(action).await,
            Err(err) => warn!("Unknown action, ignoring: {}", err),
        }
    }

    fn apply(&mut self, action: Action) -> Outcome {
        match action {
            Action::SetUserName(name) => {
                self.state.user_name = if name.is_empty() {
                    "Amigo".to_string()
                } else {
                    name
                };
                Outcome::Applied
            }
            Action::ToggleDarkMode(enabled) => {
                self.state.dark_mode = enabled;
                self.view.apply_theme(enabled);
                Outcome::Applied
            }
            Action::ToggleIncognito => {
                self.state.incognito_mode = !self.state.incognito_mode;
                self.view.set_incognito(self.state.incognito_mode);
                Outcome::Applied
            }
            Action::AddTransaction { name, amount, kind } => {
                if !amount.is_finite() || amount <= 0.0 {
                    self.view.notify("Monto inválido ⚠️");
                    return Outcome::Rejected;
                }
                let transaction = Transaction {
                    id: self.alloc_id(),
                    kind,
                    name,
                    amount,
                    date: format_display_date(Local::now()),
                };
                self.state.transactions.insert(0, transaction);
                self.state.recalculate_totals();
                Outcome::Applied
            }
            Action::DeleteTransaction(id) => {
                let before = self.state.transactions.len();
                self.state.transactions.retain(|t| t.id != id);
                if self.state.transactions.len() == before {
                    return Outcome::Noop;
                }
                self.state.recalculate_totals();
                Outcome::Applied
            }
            Action::UpdateColchon(patch) => {
                patch.apply_to(&mut self.state.colchon);
                Outcome::Applied
            }
            Action::AddFixed { name, amount } => {
                let id = self.alloc_id();
                self.state.fixed_expenses.push(FixedExpense { id, name, amount });
                Outcome::Applied
            }
            Action::DeleteFixed(id) => {
                let before = self.state.fixed_expenses.len();
                self.state.fixed_expenses.retain(|fe| fe.id != id);
                if self.state.fixed_expenses.len() == before {
                    return Outcome::Noop;
                }
                Outcome::Applied
            }
            Action::ClearData => {
                self.state.transactions.clear();
                self.state.recalculate_totals();
                Outcome::Applied
            }
            Action::SetPin(pin) => {
                self.state.pin = pin;
                Outcome::Applied
            }
            Action::TogglePin(enabled) => {
                self.state.pin_enabled = enabled;
                if !enabled {
                    self.state.pin.clear();
                }
                Outcome::Applied
            }
            Action::ImportData(payload) => {
                let overlay: StateOverlay = match serde_json::from_value(payload) {
                    Ok(overlay) => overlay,
                    Err(err) => {
                        warn!("Import payload has an invalid shape: {}", err);
                        self.view.notify("Archivo de importación inválido ⚠️");
                        return Outcome::Rejected;
                    }
                };
                // apply_overlay restamps the version and recomputes totals
                self.state.apply_overlay(overlay);
                self.last_id = last_used_id(&self.state).max(self.last_id);
                self.view.apply_theme(self.state.dark_mode);
                self.view.notify("Datos importados correctamente. 🔄");
                Outcome::Applied
            }
        }
    }

    /// Timestamp-seeded, strictly monotonic id. Two allocations in the same
    /// millisecond cannot collide, and imported ids are never reissued.
    fn alloc_id(&mut self) -> i64 {
        let now = Utc::now().timestamp_millis();
        self.last_id = now.max(self.last_id + 1);
        self.last_id
    }
}

fn last_used_id(state: &AppState) -> i64 {
    let transactions = state.transactions.iter().map(|t| t.id);
    let fixed = state.fixed_expenses.iter().map(|fe| fe.id);
    transactions.chain(fixed).max().unwrap_or(0)
}

const SPANISH_MONTHS: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sep", "oct", "nov", "dic",
];

/// Display timestamp in the form the web app stored, e.g. "30 ago, 14:20".
pub fn format_display_date(at: DateTime<Local>) -> String {
    format!(
        "{} {}, {:02}:{:02}",
        at.day(),
        SPANISH_MONTHS[at.month0() as usize],
        at.hour(),
        at.minute()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{SqliteStore, STATE_KEY};
    use calma_types::SCHEMA_VERSION;
    use chrono::TimeZone;
    use serde_json::json;
    use std::cell::{Cell, RefCell};
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingView {
        notices: RefCell<Vec<String>>,
        renders: Cell<usize>,
        theme: Cell<Option<bool>>,
        incognito: Cell<Option<bool>>,
    }

    impl ViewSink for RecordingView {
        fn render(&self, _state: &AppState) {
            self.renders.set(self.renders.get() + 1);
        }
        fn apply_theme(&self, dark_mode: bool) {
            self.theme.set(Some(dark_mode));
        }
        fn set_incognito(&self, active: bool) {
            self.incognito.set(Some(active));
        }
        fn notify(&self, message: &str) {
            self.notices.borrow_mut().push(message.to_string());
        }
    }

    fn dispatcher(dir: &TempDir) -> Dispatcher<RecordingView> {
        let db = SqliteStore::open(&dir.path().join("calma.db")).unwrap();
        Dispatcher::new(AppState::default(), db, RecordingView::default())
    }

    fn totals_hold(state: &AppState) -> bool {
        let income: f64 = state
            .transactions
            .iter()
            .filter(|t| t.is_income())
            .map(|t| t.amount)
            .sum();
        let spent: f64 = state
            .transactions
            .iter()
            .filter(|t| t.is_expense())
            .map(|t| t.amount)
            .sum();
        state.total_income == income && state.total_spent == spent
    }

    #[tokio::test]
    async fn test_add_transaction_prepends_and_recomputes() {
        let dir = TempDir::new().unwrap();
        let mut d = dispatcher(&dir);

        d.dispatch(Action::AddTransaction {
            name: "Supermercado".to_string(),
            amount: 85_000.0,
            kind: TransactionKind::Expense,
        })
        .await;
        d.dispatch(Action::AddTransaction {
            name: "Sueldo".to_string(),
            amount: 900_000.0,
            kind: TransactionKind::Income,
        })
        .await;

        // Newest first
        assert_eq!(d.state().transactions[0].name, "Sueldo");
        assert_eq!(d.state().total_income, 900_000.0);
        assert_eq!(d.state().total_spent, 85_000.0);
        assert!(totals_hold(d.state()));
        assert_eq!(d.view().renders.get(), 2);
    }

    #[tokio::test]
    async fn test_invalid_amount_is_rejected_without_persisting() {
        let dir = TempDir::new().unwrap();
        let db = SqliteStore::open(&dir.path().join("calma.db")).unwrap();
        let mut d = Dispatcher::new(AppState::default(), db.clone(), RecordingView::default());

        for amount in [0.0, -50.0, f64::NAN] {
            d.dispatch(Action::AddTransaction {
                name: "Nada".to_string(),
                amount,
                kind: TransactionKind::Expense,
            })
            .await;
        }

        assert!(d.state().transactions.is_empty());
        assert!(totals_hold(d.state()));
        assert_eq!(d.view().notices.borrow().len(), 3);
        assert_eq!(d.view().renders.get(), 0);
        // Rejected dispatches skip persistence entirely
        assert_eq!(db.get(STATE_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_a_silent_noop() {
        let dir = TempDir::new().unwrap();
        let mut d = dispatcher(&dir);

        d.dispatch(Action::AddTransaction {
            name: "Cafe".to_string(),
            amount: 500.0,
            kind: TransactionKind::Expense,
        })
        .await;
        let before = d.state().transactions.clone();

        d.dispatch(Action::DeleteTransaction(999)).await;

        assert_eq!(d.state().transactions, before);
        assert!(totals_hold(d.state()));
        assert_eq!(d.view().renders.get(), 1);
    }

    #[tokio::test]
    async fn test_delete_transaction_recomputes_totals() {
        let dir = TempDir::new().unwrap();
        let mut d = dispatcher(&dir);

        d.dispatch(Action::AddTransaction {
            name: "Cafe".to_string(),
            amount: 500.0,
            kind: TransactionKind::Expense,
        })
        .await;
        let id = d.state().transactions[0].id;
        d.dispatch(Action::DeleteTransaction(id)).await;

        assert!(d.state().transactions.is_empty());
        assert_eq!(d.state().total_spent, 0.0);
        assert!(totals_hold(d.state()));
    }

    #[tokio::test]
    async fn test_clear_data_empties_the_ledger() {
        let dir = TempDir::new().unwrap();
        let db = SqliteStore::open(&dir.path().join("calma.db")).unwrap();
        let mut d = Dispatcher::new(AppState::starter(), db, RecordingView::default());

        d.dispatch(Action::ClearData).await;

        assert!(d.state().transactions.is_empty());
        assert_eq!(d.state().total_income, 0.0);
        assert_eq!(d.state().total_spent, 0.0);
        // Fixed expenses and colchon survive
        assert_eq!(d.state().fixed_expenses.len(), 2);
    }

    #[tokio::test]
    async fn test_update_colchon_merges_partially() {
        let dir = TempDir::new().unwrap();
        let mut d = dispatcher(&dir);

        d.dispatch(Action::UpdateColchon(ColchonPatch {
            goal: Some(1_000.0),
            current: None,
        }))
        .await;
        d.dispatch(Action::UpdateColchon(ColchonPatch {
            goal: None,
            current: Some(300.0),
        }))
        .await;

        assert_eq!(d.state().colchon.goal, 1_000.0);
        assert_eq!(d.state().colchon.current, 300.0);
    }

    #[tokio::test]
    async fn test_falsy_user_name_defaults_to_amigo() {
        let dir = TempDir::new().unwrap();
        let mut d = dispatcher(&dir);

        d.dispatch(Action::SetUserName("Valentina".to_string())).await;
        assert_eq!(d.state().user_name, "Valentina");

        d.dispatch(Action::SetUserName(String::new())).await;
        assert_eq!(d.state().user_name, "Amigo");
    }

    #[tokio::test]
    async fn test_disabling_pin_clears_the_stored_code() {
        let dir = TempDir::new().unwrap();
        let mut d = dispatcher(&dir);

        d.dispatch(Action::SetPin("1234".to_string())).await;
        d.dispatch(Action::TogglePin(true)).await;
        assert!(d.state().pin_enabled);

        d.dispatch(Action::TogglePin(false)).await;
        assert!(!d.state().pin_enabled);
        assert_eq!(d.state().pin, "");
    }

    #[tokio::test]
    async fn test_toggle_incognito_flips_and_signals() {
        let dir = TempDir::new().unwrap();
        let mut d = dispatcher(&dir);

        d.dispatch(Action::ToggleIncognito).await;
        assert!(d.state().incognito_mode);
        assert_eq!(d.view().incognito.get(), Some(true));

        d.dispatch(Action::ToggleIncognito).await;
        assert!(!d.state().incognito_mode);
    }

    #[tokio::test]
    async fn test_toggle_dark_mode_fires_theme_side_effect() {
        let dir = TempDir::new().unwrap();
        let mut d = dispatcher(&dir);

        d.dispatch(Action::ToggleDarkMode(true)).await;
        assert!(d.state().dark_mode);
        assert_eq!(d.view().theme.get(), Some(true));
    }

    #[tokio::test]
    async fn test_import_overlays_restamps_and_reapplies_theme() {
        let dir = TempDir::new().unwrap();
        let mut d = dispatcher(&dir);

        d.dispatch(Action::ImportData(json!({
            "version": "2.2.0",
            "darkMode": true,
            "transactions": [
                { "id": 7, "type": "income", "name": "Freelance", "amount": 120_000.0, "date": "x" }
            ]
        })))
        .await;

        assert_eq!(d.state().version, SCHEMA_VERSION);
        assert_eq!(d.state().total_income, 120_000.0);
        assert_eq!(d.view().theme.get(), Some(true));
        assert!(totals_hold(d.state()));
    }

    #[tokio::test]
    async fn test_malformed_import_is_rejected_with_notice() {
        let dir = TempDir::new().unwrap();
        let mut d = dispatcher(&dir);

        let before = d.state().clone();
        d.dispatch(Action::ImportData(json!({ "transactions": "oops" })))
            .await;

        assert_eq!(d.state(), &before);
        assert_eq!(d.view().notices.borrow().len(), 1);
        assert_eq!(d.view().renders.get(), 0);
    }

    #[tokio::test]
    async fn test_ids_never_collide_even_within_one_millisecond() {
        let dir = TempDir::new().unwrap();
        let mut d = dispatcher(&dir);

        for _ in 0..10 {
            d.dispatch(Action::AddTransaction {
                name: "Rapido".to_string(),
                amount: 1.0,
                kind: TransactionKind::Expense,
            })
            .await;
        }

        let mut ids: Vec<i64> = d.state().transactions.iter().map(|t| t.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }

    #[tokio::test]
    async fn test_ids_stay_above_imported_ones() {
        let dir = TempDir::new().unwrap();
        let mut d = dispatcher(&dir);

        let far_future = i64::MAX - 1000;
        d.dispatch(Action::ImportData(json!({
            "transactions": [
                { "id": far_future, "type": "expense", "name": "X", "amount": 1.0, "date": "x" }
            ]
        })))
        .await;

        d.dispatch(Action::AddTransaction {
            name: "Nueva".to_string(),
            amount: 1.0,
            kind: TransactionKind::Expense,
        })
        .await;

        assert!(d.state().transactions[0].id > far_future);
    }

    #[tokio::test]
    async fn test_applied_dispatch_persists_the_full_state() {
        let dir = TempDir::new().unwrap();
        let db = SqliteStore::open(&dir.path().join("calma.db")).unwrap();
        let mut d = Dispatcher::new(AppState::default(), db.clone(), RecordingView::default());

        d.dispatch(Action::SetUserName("Valentina".to_string())).await;

        let blob = db.get(STATE_KEY).await.unwrap().expect("persisted");
        let stored: AppState = serde_json::from_str(&blob).unwrap();
        assert_eq!(stored.user_name, "Valentina");
    }

    #[tokio::test]
    async fn test_dispatch_named_maps_wire_actions() {
        let dir = TempDir::new().unwrap();
        let mut d = dispatcher(&dir);

        d.dispatch_named(json!({
            "action": "ADD_TRANSACTION",
            "payload": { "name": "Cine", "amount": 8000.0, "type": "expense" }
        }))
        .await;

        assert_eq!(d.state().transactions.len(), 1);
        assert_eq!(d.state().total_spent, 8000.0);
    }

    #[tokio::test]
    async fn test_dispatch_named_ignores_unknown_actions() {
        let dir = TempDir::new().unwrap();
        let mut d = dispatcher(&dir);

        d.dispatch_named(json!({ "action": "DO_THE_THING", "payload": 1 })).await;

        assert_eq!(d.state(), &AppState::default());
        assert_eq!(d.view().renders.get(), 0);
    }

    #[test]
    fn test_display_date_spanish_short_form() {
        let at = Local.with_ymd_and_hms(2026, 8, 30, 14, 20, 0).unwrap();
        assert_eq!(format_display_date(at), "30 ago, 14:20");
    }

    #[test]
    fn test_action_wire_names() {
        let action: Action = serde_json::from_value(json!({
            "action": "TOGGLE_PIN",
            "payload": true
        }))
        .unwrap();
        assert_eq!(action.name(), "TOGGLE_PIN");
    }
}
