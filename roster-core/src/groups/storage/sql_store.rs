//! SQLite-based Group Storage
//!
//! Persists each group as one JSON-encoded row keyed by group id. Uses a
//! connection pool and moves the blocking SQLite calls off the async
//! runtime.

use crate::config::StoreConfig;
use crate::groups::errors::{GroupError, GroupResult};
use crate::groups::traits::storage::GroupStorage;
use crate::groups::types::{GroupId, GroupRecord};
use async_trait::async_trait;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQLite-backed group storage
#[derive(Clone)]
pub struct SqlGroupStorage {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl SqlGroupStorage {
    /// Open (or create) the database at `db_path`
    ///
    /// # Arguments
    /// * `db_path` - Path to SQLite database file
    /// * `pool_size` - Maximum pooled connections
    /// * `busy_timeout` - How long a connection waits on a locked database
    pub fn new<P: AsRef<Path>>(db_path: P, pool_size: u32, busy_timeout: Duration) -> GroupResult<Self> {
        let manager = SqliteConnectionManager::file(db_path)
            .with_init(move |conn| conn.busy_timeout(busy_timeout));
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e| GroupError::Storage(format!("Failed to create connection pool: {}", e)))?;

        let storage = Self { pool: Arc::new(pool) };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Open the database described by the store configuration
    pub fn from_config(config: &StoreConfig) -> GroupResult<Self> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    GroupError::Storage(format!("Failed to create database directory: {}", e))
                })?;
            }
        }
        Self::new(&config.db_path, config.pool_size, config.busy_timeout)
    }

    fn init_schema(&self) -> GroupResult<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| GroupError::Storage(format!("Failed to get connection: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS groups (
                group_id TEXT PRIMARY KEY,
                record TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )
        .map_err(|e| GroupError::Storage(format!("Failed to initialize schema: {}", e)))?;

        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, ?2)",
            params![SCHEMA_VERSION, current_timestamp()],
        )
        .map_err(|e| GroupError::Storage(format!("Failed to set schema version: {}", e)))?;

        Ok(())
    }

    /// Run `f` with a pooled connection on the blocking thread pool
    async fn with_connection<F, T>(&self, f: F) -> GroupResult<T>
    where
        F: FnOnce(&Connection) -> GroupResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| GroupError::Storage(format!("Failed to get connection: {}", e)))?;
            f(&conn)
        })
        .await
        .map_err(|e| GroupError::Storage(format!("Task join error: {}", e)))?
    }
}

#[async_trait]
impl GroupStorage for SqlGroupStorage {
    async fn get_group(&self, id: &GroupId) -> GroupResult<Option<GroupRecord>> {
        let key = id.as_str().to_string();
        let raw = self
            .with_connection(move |conn| {
                conn.query_row(
                    "SELECT record FROM groups WHERE group_id = ?1",
                    params![key],
                    |row| row.get::<_, String>(0),
                )
                .optional()
                .map_err(|e| GroupError::Storage(format!("Failed to load group: {}", e)))
            })
            .await?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put_group(&self, id: &GroupId, record: &GroupRecord) -> GroupResult<()> {
        let key = id.as_str().to_string();
        let json = serde_json::to_string(record)?;
        debug!(group_id = %id, bytes = json.len(), "writing group record");

        self.with_connection(move |conn| {
            let now = current_timestamp();
            conn.execute(
                r#"
                INSERT INTO groups (group_id, record, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?3)
                ON CONFLICT(group_id) DO UPDATE SET
                    record = excluded.record,
                    updated_at = excluded.updated_at
                "#,
                params![key, json, now],
            )
            .map_err(|e| GroupError::Storage(format!("Failed to save group: {}", e)))?;
            Ok(())
        })
        .await
    }

    async fn remove_group(&self, id: &GroupId) -> GroupResult<()> {
        let key = id.as_str().to_string();
        self.with_connection(move |conn| {
            conn.execute("DELETE FROM groups WHERE group_id = ?1", params![key])
                .map_err(|e| GroupError::Storage(format!("Failed to delete group: {}", e)))?;
            Ok(())
        })
        .await
    }

    async fn list_groups(&self) -> GroupResult<Vec<GroupId>> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare("SELECT group_id FROM groups ORDER BY group_id")
                .map_err(|e| GroupError::Storage(format!("Failed to prepare query: {}", e)))?;
            let ids = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(|e| GroupError::Storage(format!("Failed to list groups: {}", e)))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| GroupError::Storage(format!("Failed to read group id: {}", e)))?;
            Ok(ids.into_iter().map(GroupId::from).collect())
        })
        .await
    }
}

fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
