// 💾 Persistence Store - durable key/value storage for the app state
//
// Each logical collection lives under its own key as JSON text.
// SqliteStore is the durable backend (WAL mode, survives restarts);
// MemoryStore is an in-process fake for tests and throwaway sessions.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// KEY LAYOUT
// ============================================================================

pub const KEY_EXPENSES: &str = "expenses";
pub const KEY_BUDGETS: &str = "budgets";
pub const KEY_CATEGORY_COLORS: &str = "categoryColorMap";
pub const KEY_PRIMARY_CURRENCY: &str = "primaryCurrencyCode";
pub const KEY_THEME: &str = "theme";

/// Keys wiped by a full data reset. The theme survives a reset.
pub const DATA_KEYS: [&str; 4] = [
    KEY_EXPENSES,
    KEY_BUDGETS,
    KEY_CATEGORY_COLORS,
    KEY_PRIMARY_CURRENCY,
];

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("could not encode value: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stored value under '{key}' is not valid JSON")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Key/value contract consumed by the state engine.
///
/// A `load` after a `save` in the same session must observe that save.
/// A missing key is `Ok(None)`, never an error.
pub trait Store {
    /// Stored text under a key, exactly as written
    fn load_text(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn save(&mut self, key: &str, value: &Value) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.load_text(key)?
            .map(|text| decode(key, &text))
            .transpose()
    }
}

fn decode(key: &str, raw: &str) -> Result<Value, StoreError> {
    serde_json::from_str(raw).map_err(|source| StoreError::Malformed {
        key: key.to_string(),
        source,
    })
}

// ============================================================================
// SQLITE STORE
// ============================================================================

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a store file
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        // WAL for crash recovery
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::setup(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::setup(Connection::open_in_memory()?)
    }

    fn setup(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(SqliteStore { conn })
    }

    /// Write raw text under a key, bypassing JSON encoding
    pub fn save_raw(&mut self, key: &str, raw: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, raw, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

impl Store for SqliteStore {
    fn load_text(&self, key: &str) -> Result<Option<String>, StoreError> {
        let raw = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(raw)
    }

    fn save(&mut self, key: &str, value: &Value) -> Result<(), StoreError> {
        let text = serde_json::to_string(value)?;
        self.save_raw(key, &text)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

// ============================================================================
// MEMORY STORE
// ============================================================================

/// In-memory store holding serialized text, like a browser's local storage
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plant raw text under a key (used to simulate corrupted storage)
    pub fn insert_raw(&mut self, key: &str, raw: &str) {
        self.entries.insert(key.to_string(), raw.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl Store for MemoryStore {
    fn load_text(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &Value) -> Result<(), StoreError> {
        let text = serde_json::to_string(value)?;
        self.entries.insert(key.to_string(), text);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn exercise(store: &mut dyn Store) {
        assert!(store.load("missing").unwrap().is_none(), "missing key loads as None");

        store.save(KEY_BUDGETS, &json!({"2024-03": 100.0})).unwrap();
        assert_eq!(store.load(KEY_BUDGETS).unwrap(), Some(json!({"2024-03": 100.0})));

        // Latest save wins
        store.save(KEY_BUDGETS, &json!({"2024-03": 250.0})).unwrap();
        assert_eq!(store.load(KEY_BUDGETS).unwrap(), Some(json!({"2024-03": 250.0})));

        store.remove(KEY_BUDGETS).unwrap();
        assert!(store.load(KEY_BUDGETS).unwrap().is_none());

        // Removing a missing key is fine
        store.remove(KEY_BUDGETS).unwrap();
    }

    #[test]
    fn test_memory_store_contract() {
        let mut store = MemoryStore::new();
        exercise(&mut store);
    }

    #[test]
    fn test_sqlite_store_contract() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        exercise(&mut store);
    }

    #[test]
    fn test_malformed_text_is_reported() {
        let mut store = MemoryStore::new();
        store.insert_raw(KEY_EXPENSES, "[{not json");

        match store.load(KEY_EXPENSES) {
            Err(StoreError::Malformed { key, .. }) => assert_eq!(key, KEY_EXPENSES),
            other => panic!("expected Malformed, got {:?}", other),
        }

        let mut sqlite = SqliteStore::open_in_memory().unwrap();
        sqlite.save_raw(KEY_THEME, "dark").unwrap();
        assert!(matches!(sqlite.load(KEY_THEME), Err(StoreError::Malformed { .. })));
    }

    #[test]
    fn test_load_text_returns_stored_text_unparsed() {
        let mut sqlite = SqliteStore::open_in_memory().unwrap();
        sqlite.save_raw(KEY_THEME, "dark").unwrap();
        assert_eq!(sqlite.load_text(KEY_THEME).unwrap().as_deref(), Some("dark"));
        assert!(sqlite.load_text("missing").unwrap().is_none());

        let mut memory = MemoryStore::new();
        memory.save(KEY_PRIMARY_CURRENCY, &json!("EUR")).unwrap();
        assert_eq!(memory.load_text(KEY_PRIMARY_CURRENCY).unwrap().as_deref(), Some("\"EUR\""));
    }

    #[test]
    fn test_sqlite_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flow.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.save(KEY_PRIMARY_CURRENCY, &json!("EUR")).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.load(KEY_PRIMARY_CURRENCY).unwrap(), Some(json!("EUR")));
    }
}
