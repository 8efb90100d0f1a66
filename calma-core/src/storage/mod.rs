pub mod legacy;
pub mod sqlite;

pub use legacy::LegacyStore;
pub use sqlite::SqliteStore;

use calma_types::AppState;
use tracing::warn;

/// Logical key for the canonical blob in the sqlite store.
pub const STATE_KEY: &str = "state";

/// Key the old web frontend used in its flat localStorage namespace.
pub const LEGACY_KEY: &str = "calma_data";

/// Best-effort persistence of the canonical state. Failures are logged and
/// dropped; durability is at-most-once with no retries.
pub(crate) async fn persist_state(db: &SqliteStore, state: &AppState) {
    match serde_json::to_string(state) {
        Ok(blob) => {
            if let Err(err) = db.put(STATE_KEY, &blob).await {
                warn!("Saving state failed, skipping: {}", err);
            }
        }
        Err(err) => warn!("Could not serialize state for saving: {}", err),
    }
}
