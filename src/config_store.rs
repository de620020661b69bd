use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};
use diesel::sqlite::SqliteConnection;
use serde_json::Value;
use tracing::debug;

use crate::error::{ForwardBotError, Result};
use crate::interfaces::store::ConfigStore;

#[derive(QueryableByName)]
struct ConfigRow {
    #[diesel(sql_type = Text)]
    key: String,
    #[diesel(sql_type = Text)]
    value_json: String,
}

pub fn ensure_parent_dir(path: &str) -> Result<()> {
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ForwardBotError::Runtime(e.to_string()))?;
    }
    Ok(())
}

fn open_conn(db_path: &str) -> Result<SqliteConnection> {
    let mut conn = SqliteConnection::establish(db_path)
        .map_err(|e| ForwardBotError::Runtime(e.to_string()))?;
    crate::db::apply_sqlcipher_key_sync(&mut conn)?;
    Ok(conn)
}

fn ensure_table(conn: &mut SqliteConnection) -> Result<()> {
    diesel::sql_query(
        "CREATE TABLE IF NOT EXISTS plugin_config (
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        )",
    )
    .execute(conn)
    .map_err(|e| ForwardBotError::Runtime(e.to_string()))?;
    Ok(())
}

fn lock_poisoned() -> ForwardBotError {
    ForwardBotError::Runtime("config store locked".to_string())
}

/// Plugin configuration backed by a `plugin_config` table.
///
/// Values are read once on open; `set` stages in memory and `persist`
/// upserts every staged key in one transaction.
pub struct SqliteConfigStore {
    db_path: String,
    values: Mutex<HashMap<String, Value>>,
}

impl SqliteConfigStore {
    pub fn open(db_path: &str) -> Result<Self> {
        ensure_parent_dir(db_path)?;
        let mut conn = open_conn(db_path)?;
        ensure_table(&mut conn)?;

        let rows: Vec<ConfigRow> = diesel::sql_query("SELECT key, value_json FROM plugin_config")
            .load(&mut conn)
            .map_err(|e| ForwardBotError::Runtime(e.to_string()))?;

        let mut values = HashMap::new();
        for row in rows {
            let value: Value = serde_json::from_str(&row.value_json)
                .map_err(|e| ForwardBotError::Config(e.to_string()))?;
            values.insert(row.key, value);
        }
        debug!(db_path, keys = values.len(), "opened plugin config store");

        Ok(Self {
            db_path: db_path.to_string(),
            values: Mutex::new(values),
        })
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }
}

impl ConfigStore for SqliteConfigStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let values = self.values.lock().map_err(|_| lock_poisoned())?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self.values.lock().map_err(|_| lock_poisoned())?;
        values.insert(key.to_string(), value);
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        let snapshot: Vec<(String, String)> = {
            let values = self.values.lock().map_err(|_| lock_poisoned())?;
            values
                .iter()
                .map(|(key, value)| {
                    serde_json::to_string(value)
                        .map(|json| (key.clone(), json))
                        .map_err(|e| ForwardBotError::Serialization(e.to_string()))
                })
                .collect::<Result<_>>()?
        };

        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ForwardBotError::Runtime(e.to_string()))?
            .as_secs() as i64;

        let mut conn =
            open_conn(&self.db_path).map_err(|e| ForwardBotError::Persistence(e.to_string()))?;
        ensure_table(&mut conn).map_err(|e| ForwardBotError::Persistence(e.to_string()))?;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            for (key, value_json) in &snapshot {
                diesel::sql_query(
                    "INSERT INTO plugin_config (key, value_json, updated_at)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json, updated_at = excluded.updated_at",
                )
                .bind::<Text, _>(key.clone())
                .bind::<Text, _>(value_json.clone())
                .bind::<BigInt, _>(ts)
                .execute(conn)?;
            }
            Ok(())
        })
        .map_err(|e| ForwardBotError::Persistence(e.to_string()))?;

        Ok(())
    }
}

#[derive(Default)]
struct MemoryState {
    staged: HashMap<String, Value>,
    persisted: HashMap<String, Value>,
    fail_next_persist: bool,
    persist_count: usize,
}

/// In-process store with the same staging semantics as the SQLite store.
#[derive(Default)]
pub struct MemoryConfigStore {
    state: Mutex<MemoryState>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<'a>(values: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        let persisted: HashMap<String, Value> = values
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        Self {
            state: Mutex::new(MemoryState {
                staged: persisted.clone(),
                persisted,
                ..MemoryState::default()
            }),
        }
    }

    pub fn fail_next_persist(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_next_persist = true;
        }
    }

    pub fn persisted(&self, key: &str) -> Option<Value> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.persisted.get(key).cloned())
    }

    pub fn persist_count(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.persist_count)
            .unwrap_or_default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let state = self.state.lock().map_err(|_| lock_poisoned())?;
        Ok(state.staged.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut state = self.state.lock().map_err(|_| lock_poisoned())?;
        state.staged.insert(key.to_string(), value);
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        let mut state = self.state.lock().map_err(|_| lock_poisoned())?;
        if state.fail_next_persist {
            state.fail_next_persist = false;
            return Err(ForwardBotError::Persistence(
                "simulated write failure".to_string(),
            ));
        }
        state.persisted = state.staged.clone();
        state.persist_count += 1;
        Ok(())
    }
}
