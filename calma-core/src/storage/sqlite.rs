use anyhow::Result;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Transactional key-value backend.
///
/// Replaces the web frontend's IndexedDB store: opening runs the upgrade step
/// that lazily creates the `app_data` partition, and every read/write happens
/// inside an explicit sqlite transaction scoped to it.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl SqliteStore {
    /// Open the store at `db_path`. Open failures surface as `Err`, never a
    /// panic.
    pub fn open(db_path: &Path) -> Result<Self> {
        // Ensure directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Run the upgrade step on a plain connection before pooling
        let conn = Connection::open(db_path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS app_data (
                key VARCHAR PRIMARY KEY,
                value VARCHAR NOT NULL,
                updated_at BIGINT NOT NULL
            )",
            [],
        )?;
        drop(conn);

        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.busy_timeout(Duration::from_secs(5))?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });

        let pool = Pool::builder().max_size(4).build(manager)?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    async fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Fetch the blob stored under `key`, if any.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn().await?;

        let tx = conn.transaction()?;
        let value = tx
            .query_row(
                "SELECT value FROM app_data WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        tx.commit()?;

        Ok(value)
    }

    /// Store `blob` under `key`, replacing any previous value.
    pub async fn put(&self, key: &str, blob: &str) -> Result<()> {
        let mut conn = self.conn().await?;
        let now = chrono::Utc::now().timestamp();

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO app_data (key, value, updated_at) VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            params![key, blob, now],
        )?;
        tx.commit()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&dir.path().join("calma.db")).unwrap();

        store.put("state", "{\"userName\":\"Amigo\"}").await.unwrap();
        let value = store.get("state").await.unwrap();
        assert_eq!(value.as_deref(), Some("{\"userName\":\"Amigo\"}"));
    }

    #[tokio::test]
    async fn test_get_absent_key_is_none() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&dir.path().join("calma.db")).unwrap();

        assert_eq!(store.get("state").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_replaces_previous_value() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&dir.path().join("calma.db")).unwrap();

        store.put("state", "first").await.unwrap();
        store.put("state", "second").await.unwrap();
        assert_eq!(store.get("state").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("calma.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            store.put("state", "durable").await.unwrap();
        }

        let store = SqliteStore::open(&db_path).unwrap();
        assert_eq!(store.get("state").await.unwrap().as_deref(), Some("durable"));
    }

    #[test]
    fn test_open_failure_is_an_error_not_a_panic() {
        let dir = TempDir::new().unwrap();
        // A directory is not a valid database file
        assert!(SqliteStore::open(dir.path()).is_err());
    }
}
