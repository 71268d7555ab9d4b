//! Durable store of administrator-approved translations, backed by SQLite.
//! A translation key is a canonical source phrase; each (key, language) pair
//! holds at most one translation. Rows are soft-deleted via `is_active` so
//! historical lookups stay stable.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use super::{BulkSource, TranslateError};

pub struct TranslationStore {
    conn: Mutex<Connection>,
}

#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    /// The referenced translation key does not exist or is inactive.
    UnknownKey(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Sqlite(e) => write!(f, "store error: {e}"),
            StoreError::UnknownKey(key) => write!(f, "unknown translation key: {key}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Sqlite(e)
    }
}

impl TranslationStore {
    /// Open (or create) the store at the given path.
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        Self::init(conn, &db_path.display().to_string())
    }

    /// In-memory store, used by tests and ephemeral deployments.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, ":memory:")
    }

    fn init(conn: Connection, label: &str) -> Result<Self, StoreError> {
        // WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS translation_keys (
                id INTEGER PRIMARY KEY,
                key TEXT NOT NULL UNIQUE,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS translations (
                id INTEGER PRIMARY KEY,
                key_id INTEGER NOT NULL REFERENCES translation_keys(id),
                language TEXT NOT NULL,
                text TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                UNIQUE(key_id, language)
            );
            CREATE INDEX IF NOT EXISTS idx_translations_language
                ON translations(language);",
        )?;

        info!(path = label, "translation store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Register (or re-activate) a canonical source phrase.
    pub fn upsert_key(&self, key: &str) -> Result<i64, StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO translation_keys (key, is_active, created_at)
             VALUES (?1, 1, ?2)
             ON CONFLICT(key) DO UPDATE SET is_active = 1",
            params![key, now_unix()],
        )?;
        let id: i64 = conn.query_row(
            "SELECT id FROM translation_keys WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Set the translation of a key for one language, replacing any previous
    /// text for that (key, language) pair.
    pub fn upsert_translation(
        &self,
        key: &str,
        language: &str,
        text: &str,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        let key_id: Option<i64> = conn
            .query_row(
                "SELECT id FROM translation_keys WHERE key = ?1 AND is_active = 1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        let key_id = key_id.ok_or_else(|| StoreError::UnknownKey(key.to_string()))?;

        conn.execute(
            "INSERT INTO translations (key_id, language, text, is_active)
             VALUES (?1, ?2, ?3, 1)
             ON CONFLICT(key_id, language) DO UPDATE SET text = ?3, is_active = 1",
            params![key_id, language, text],
        )?;
        debug!(key, language, "translation upserted");
        Ok(())
    }

    /// Soft-delete a key. Its translations stop resolving but stay on disk.
    pub fn deactivate_key(&self, key: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE translation_keys SET is_active = 0 WHERE key = ?1",
            params![key],
        )?;
        Ok(changed > 0)
    }

    /// Soft-delete one (key, language) translation.
    pub fn deactivate_translation(&self, key: &str, language: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE translations SET is_active = 0
             WHERE language = ?2
               AND key_id = (SELECT id FROM translation_keys WHERE key = ?1)",
            params![key, language],
        )?;
        Ok(changed > 0)
    }

    /// All active translations for a language, keyed by source phrase.
    pub fn fetch_language_map(&self, language: &str) -> Result<HashMap<String, String>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT k.key, t.text
             FROM translation_keys k
             JOIN translations t ON t.key_id = k.id
             WHERE k.is_active = 1 AND t.is_active = 1 AND t.language = ?1",
        )?;
        let rows = stmt.query_map(params![language], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut map = HashMap::new();
        for row in rows {
            let (key, text) = row?;
            map.insert(key, text);
        }
        debug!(language, count = map.len(), "language map fetched from store");
        Ok(map)
    }

    pub fn count_language(&self, language: &str) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*)
             FROM translation_keys k
             JOIN translations t ON t.key_id = k.id
             WHERE k.is_active = 1 AND t.is_active = 1 AND t.language = ?1",
            params![language],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[async_trait]
impl BulkSource for TranslationStore {
    async fn fetch_language(
        &self,
        language: &str,
    ) -> Result<HashMap<String, String>, TranslateError> {
        self.fetch_language_map(language).map_err(|e| {
            warn!(language, error = %e, "store fetch failed");
            TranslateError::Api(e.to_string())
        })
    }
}

/// Current time as Unix timestamp (seconds).
fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
