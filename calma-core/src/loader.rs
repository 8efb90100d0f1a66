use anyhow::Result;
use calma_types::AppState;
use tracing::{info, warn};

use crate::dispatch::ViewSink;
use crate::storage::{persist_state, LegacyStore, SqliteStore, LEGACY_KEY, STATE_KEY};

/// Load the canonical state at startup, migrating as needed.
///
/// Strict order, first success wins: the sqlite store, then the legacy
/// namespace, then starter data. A legacy blob is migrated with a
/// write-through into sqlite and left in place; it simply stops being
/// authoritative. Storage failures and malformed blobs degrade to "no data"
/// and fall through the chain. Every branch recomputes totals (inside the
/// normalizer) and fires the dark-mode side effect before returning.
pub async fn load_and_migrate(
    db: &SqliteStore,
    legacy: &LegacyStore,
    view: &dyn ViewSink,
) -> AppState {
    match db.get(STATE_KEY).await {
        Ok(Some(blob)) => match parse_blob(&blob) {
            Ok(state) => {
                info!("Loaded state from the sqlite store");
                view.apply_theme(state.dark_mode);
                return state;
            }
            Err(err) => warn!("Stored state is malformed, falling through: {}", err),
        },
        Ok(None) => {}
        Err(err) => warn!("Sqlite read failed, treating as empty: {}", err),
    }

    if let Some(blob) = legacy.get(LEGACY_KEY) {
        match parse_blob(&blob) {
            Ok(state) => {
                info!("Migrating legacy data into the sqlite store");
                persist_state(db, &state).await;
                view.apply_theme(state.dark_mode);
                return state;
            }
            Err(err) => warn!("Legacy data is malformed, ignoring it: {}", err),
        }
    }

    info!("No stored data found, starting with the sample ledger");
    let mut state = AppState::starter();
    state.recalculate_totals();
    persist_state(db, &state).await;
    view.apply_theme(state.dark_mode);
    state
}

/// Parse a serialized blob and normalize it into canonical shape. The
/// normalizer stamps the current schema version and recomputes totals.
fn parse_blob(blob: &str) -> Result<AppState> {
    let value: serde_json::Value = serde_json::from_str(blob)?;
    Ok(AppState::normalize(value)?)
}
