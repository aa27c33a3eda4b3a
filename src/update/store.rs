//! Persistent update-check state

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::version::error::StoreError;
use crate::version::semver::SemanticVersion;

const KEY_LAST_CHECK_DATE: &str = "AppUpdate.lastCheckDate";
const KEY_SKIP_VERSION: &str = "AppUpdate.skipVersion";
const KEY_VERSION_HISTORY: &str = "AppUpdate.versionHistory";
const KEY_NEVER: &str = "AppUpdate.never";

/// Launch counts per installed version
pub type LaunchHistory = HashMap<SemanticVersion, u32>;

/// Trait for storing the state that survives between check cycles
///
/// Each setter replaces one field as a whole (last write wins).
#[cfg_attr(test, automock)]
pub trait StateStore: Send + Sync + 'static {
    fn last_check_date(&self) -> Result<Option<DateTime<Utc>>, StoreError>;

    fn set_last_check_date(&self, date: DateTime<Utc>) -> Result<(), StoreError>;

    /// Version the user asked not to be prompted about again
    fn skipped_version(&self) -> Result<Option<SemanticVersion>, StoreError>;

    fn set_skipped_version(&self, version: &SemanticVersion) -> Result<(), StoreError>;

    /// Launch history; unreadable history is reported as empty
    fn launch_history(&self) -> Result<LaunchHistory, StoreError>;

    fn set_launch_history(&self, history: &LaunchHistory) -> Result<(), StoreError>;

    fn never_flag(&self) -> Result<bool, StoreError>;

    fn set_never_flag(&self, never: bool) -> Result<(), StoreError>;

    /// Clear all four fields at once
    fn reset_all(&self) -> Result<(), StoreError>;

    /// Increment the launch count for `version` and return the new count
    ///
    /// Implementations shared between callers must make this read-modify-write
    /// atomic.
    fn record_launch(&self, version: &SemanticVersion) -> Result<u32, StoreError> {
        let mut history = self.launch_history()?;
        let count = history.entry(*version).or_insert(0);
        *count = count.saturating_add(1);
        let count = *count;
        self.set_launch_history(&history)?;
        Ok(count)
    }
}

/// SQLite-backed key/value state store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(db_path: &Path) -> Result<Self, StoreError> {
        info!("Initializing state database at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        // Enable WAL mode for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let store = Self {
            conn: Mutex::new(conn),
        };

        store.create_schema()?;
        debug!("State database ready");

        Ok(store)
    }

    /// Acquire database connection lock with proper error handling
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn create_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS app_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        Ok(())
    }

    fn read(conn: &Connection, key: &str) -> Result<Option<String>, StoreError> {
        let value = conn
            .query_row(
                "SELECT value FROM app_state WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(conn: &Connection, key: &str, value: &str) -> Result<(), StoreError> {
        conn.execute(
            r#"
            INSERT INTO app_state (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            (key, value, Utc::now().timestamp_millis()),
        )?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.lock_conn()?;
        Self::read(&conn, key)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.lock_conn()?;
        Self::write(&conn, key, value)
    }

    fn decode_history(raw: &str) -> LaunchHistory {
        let encoded: HashMap<String, u32> = match serde_json::from_str(raw) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!("Discarding unreadable launch history: {}", e);
                return LaunchHistory::new();
            }
        };

        let mut history = LaunchHistory::new();
        for (version, count) in encoded {
            let total = history.entry(SemanticVersion::parse(&version)).or_insert(0);
            *total = total.saturating_add(count);
        }
        history
    }

    fn encode_history(history: &LaunchHistory) -> Result<String, StoreError> {
        // BTreeMap keeps the stored JSON stable
        let encoded: BTreeMap<String, u32> = history
            .iter()
            .map(|(version, count)| (version.to_string(), *count))
            .collect();
        Ok(serde_json::to_string(&encoded)?)
    }
}

impl StateStore for SqliteStore {
    fn last_check_date(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let Some(raw) = self.get(KEY_LAST_CHECK_DATE)? else {
            return Ok(None);
        };

        match DateTime::parse_from_rfc3339(&raw) {
            Ok(date) => Ok(Some(date.with_timezone(&Utc))),
            Err(e) => {
                warn!("Ignoring unreadable last check date {:?}: {}", raw, e);
                Ok(None)
            }
        }
    }

    fn set_last_check_date(&self, date: DateTime<Utc>) -> Result<(), StoreError> {
        self.put(KEY_LAST_CHECK_DATE, &date.to_rfc3339())
    }

    fn skipped_version(&self) -> Result<Option<SemanticVersion>, StoreError> {
        Ok(self
            .get(KEY_SKIP_VERSION)?
            .map(|raw| SemanticVersion::parse(&raw)))
    }

    fn set_skipped_version(&self, version: &SemanticVersion) -> Result<(), StoreError> {
        self.put(KEY_SKIP_VERSION, &version.to_string())
    }

    fn launch_history(&self) -> Result<LaunchHistory, StoreError> {
        Ok(self
            .get(KEY_VERSION_HISTORY)?
            .map(|raw| Self::decode_history(&raw))
            .unwrap_or_default())
    }

    fn set_launch_history(&self, history: &LaunchHistory) -> Result<(), StoreError> {
        let encoded = Self::encode_history(history)?;
        self.put(KEY_VERSION_HISTORY, &encoded)
    }

    fn never_flag(&self) -> Result<bool, StoreError> {
        Ok(self.get(KEY_NEVER)?.is_some_and(|raw| raw == "1"))
    }

    fn set_never_flag(&self, never: bool) -> Result<(), StoreError> {
        self.put(KEY_NEVER, if never { "1" } else { "0" })
    }

    fn reset_all(&self) -> Result<(), StoreError> {
        let conn = self.lock_conn()?;
        let removed = conn.execute(
            "DELETE FROM app_state WHERE key IN (?1, ?2, ?3, ?4)",
            (
                KEY_LAST_CHECK_DATE,
                KEY_SKIP_VERSION,
                KEY_VERSION_HISTORY,
                KEY_NEVER,
            ),
        )?;
        info!("Reset update state ({} keys removed)", removed);
        Ok(())
    }

    fn record_launch(&self, version: &SemanticVersion) -> Result<u32, StoreError> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let mut history = Self::read(&tx, KEY_VERSION_HISTORY)?
            .map(|raw| Self::decode_history(&raw))
            .unwrap_or_default();
        let count = history.entry(*version).or_insert(0);
        *count = count.saturating_add(1);
        let count = *count;

        Self::write(&tx, KEY_VERSION_HISTORY, &Self::encode_history(&history)?)?;
        tx.commit()?;

        debug!("Recorded launch {} of version {}", count, version);
        Ok(count)
    }
}
