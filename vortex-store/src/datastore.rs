//! SQLite connection management
//!
//! One connection behind a mutex, shared by every repository. SQLite
//! serializes writers anyway, and the ledger append relies on
//! `BEGIN IMMEDIATE` for its balance check. Repositories go through
//! [`SqliteDatastore::run`] and [`SqliteDatastore::run_tx`], which take the
//! lock on a blocking worker thread instead of the async runtime.

use crate::error::{StoreError, StoreResult};
use crate::schema;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// In-memory database marker
pub const MEMORY_PATH: &str = "mem://";

/// Default table prefix
pub const DEFAULT_TABLE_PREFIX: &str = "wp_";

/// Storage timestamp format (UTC); sortable and `strftime` friendly
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// SQLite configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteConfig {
    /// File path, or `mem://` for an in-memory database
    pub path: String,
    /// Table name prefix
    pub table_prefix: String,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: MEMORY_PATH.to_string(),
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
        }
    }
}

impl SqliteConfig {
    pub fn new(path: impl Into<String>, table_prefix: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            table_prefix: table_prefix.into(),
        }
    }

    pub fn is_memory(&self) -> bool {
        self.path == MEMORY_PATH || self.path == ":memory:"
    }
}

/// Shared SQLite handle
#[derive(Clone)]
pub struct SqliteDatastore {
    conn: Arc<Mutex<Connection>>,
    prefix: String,
}

impl SqliteDatastore {
    /// Open (or create) the database described by `config`
    pub fn connect(config: &SqliteConfig) -> StoreResult<Self> {
        if !schema::is_valid_prefix(&config.table_prefix) {
            return Err(StoreError::validation(format!(
                "invalid table prefix: {:?}",
                config.table_prefix
            )));
        }

        let conn = if config.is_memory() {
            Connection::open_in_memory()
        } else {
            Connection::open(&config.path)
        }
        .map_err(|e| StoreError::Connection(format!("failed to open {}: {e}", config.path)))?;

        conn.busy_timeout(std::time::Duration::from_secs(5))
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        tracing::debug!(path = %config.path, prefix = %config.table_prefix, "sqlite datastore opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            prefix: config.table_prefix.clone(),
        })
    }

    /// Fresh in-memory database with the default prefix
    pub fn in_memory() -> StoreResult<Self> {
        Self::connect(&SqliteConfig::default())
    }

    /// Prefixed table name for a stem from [`schema`]
    pub fn table(&self, stem: &str) -> String {
        format!("{}{stem}", self.prefix)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Run `f` with the locked connection
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Connection("connection mutex poisoned".to_string()))?;
        f(&conn)
    }

    /// Run `f` inside `BEGIN IMMEDIATE`; commits on `Ok`, rolls back on `Err`
    pub fn with_immediate_tx<T>(
        &self,
        f: impl FnOnce(&Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        self.with_conn(|conn| {
            conn.execute("BEGIN IMMEDIATE", [])
                .map_err(|e| StoreError::Transaction(format!("failed to begin: {e}")))?;

            match f(conn) {
                Ok(value) => {
                    conn.execute("COMMIT", []).map_err(|e| {
                        let _ = conn.execute("ROLLBACK", []);
                        StoreError::Transaction(format!("failed to commit (rolled back): {e}"))
                    })?;
                    Ok(value)
                }
                Err(error) => {
                    let _ = conn.execute("ROLLBACK", []);
                    Err(error)
                }
            }
        })
    }

    /// [`with_conn`](Self::with_conn) on the blocking thread pool
    pub async fn run<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
    {
        let datastore = self.clone();
        tokio::task::spawn_blocking(move || datastore.with_conn(f))
            .await
            .map_err(|e| StoreError::Connection(format!("blocking task failed: {e}")))?
    }

    /// [`with_immediate_tx`](Self::with_immediate_tx) on the blocking thread pool
    pub async fn run_tx<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
    {
        let datastore = self.clone();
        tokio::task::spawn_blocking(move || datastore.with_immediate_tx(f))
            .await
            .map_err(|e| StoreError::Transaction(format!("blocking task failed: {e}")))?
    }

    /// Create every table if missing
    pub async fn init_schema(&self) -> StoreResult<()> {
        let sql = schema::render_schema(&self.prefix);
        self.run(move |conn| {
            conn.execute_batch(&sql)?;
            Ok(())
        })
        .await
    }

    /// `SELECT 1`
    pub async fn ping(&self) -> StoreResult<()> {
        self.run(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map_err(|e| StoreError::Connection(e.to_string()))?;
            Ok(())
        })
        .await
    }
}

// ============================================================
// Column codecs
// ============================================================

/// Timestamp to storage text
pub fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Storage text to timestamp
pub fn parse_ts(table: &str, raw: &str) -> StoreResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| StoreError::corrupt(table, format!("bad timestamp {raw:?}: {e}")))
}

/// Storage text to decimal
pub fn parse_decimal(table: &str, raw: &str) -> StoreResult<Decimal> {
    Decimal::from_str(raw).map_err(|e| StoreError::corrupt(table, format!("bad decimal {raw:?}: {e}")))
}

/// Unsigned user id to SQLite integer
pub fn user_param(user_id: vortex_core::UserId) -> i64 {
    i64::try_from(user_id.0).unwrap_or(i64::MAX)
}

/// SQLite integer to user id
pub fn user_from(raw: i64) -> vortex_core::UserId {
    vortex_core::UserId(u64::try_from(raw).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_schema_and_ping() {
        let ds = SqliteDatastore::in_memory().unwrap();
        ds.init_schema().await.unwrap();
        // idempotent
        ds.init_schema().await.unwrap();
        ds.ping().await.unwrap();

        let count: i64 = ds
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name LIKE 'wp_vortex_%'",
                    [],
                    |row| row.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(count as usize, schema::VORTEX_TABLES.len());
    }

    #[test]
    fn test_invalid_prefix_rejected() {
        let result = SqliteDatastore::connect(&SqliteConfig::new(MEMORY_PATH, "x; --"));
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_immediate_tx_rolls_back_on_error() {
        let ds = SqliteDatastore::in_memory().unwrap();
        ds.init_schema().await.unwrap();
        let table = ds.table(schema::TOLA_POINTS);

        let insert = format!(
            "INSERT INTO {table} (user_id, points, created_at) VALUES (1, '5', '2024-01-01 00:00:00')"
        );
        let result: StoreResult<()> = ds
            .run_tx(move |conn| {
                conn.execute(&insert, [])?;
                Err(StoreError::validation("abort"))
            })
            .await;
        assert!(result.is_err());

        let count: i64 = ds
            .with_conn(|conn| Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_run_leaves_runtime_free() {
        let ds = SqliteDatastore::in_memory().unwrap();
        ds.init_schema().await.unwrap();

        let held = ds.conn.clone();
        let guard = held.lock().unwrap();
        let pending = tokio::spawn({
            let ds = ds.clone();
            async move { ds.ping().await }
        });

        // the runtime keeps scheduling while the connection is busy
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!pending.is_finished());
        drop(guard);
        pending.await.unwrap().unwrap();
    }

    #[test]
    fn test_timestamp_codec() {
        let ts = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 1).unwrap();
        let text = format_ts(&ts);
        assert_eq!(text, "2024-02-29 23:59:01");
        assert_eq!(parse_ts("t", &text).unwrap(), ts);
        assert!(parse_ts("t", "yesterday").is_err());
    }
}
