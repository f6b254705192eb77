//! Database module for the store bot
//!
//! Persists the store's key/value layout (accounts, listings, ban and host
//! lists, operator chat) in SQLite. Values are JSON documents.

mod schema;

pub use schema::*;

use crate::telegram::ChatId;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Failed to encode {key}: {source}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Raw key/value access ====================

    /// Read a JSON value. Corrupt documents are logged and read as absent.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        let conn = self.conn.lock().unwrap();
        let raw: Option<String> = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;

        Ok(raw.and_then(|raw| match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(key, error = %e, "Could not parse stored value, ignoring it");
                None
            }
        }))
    }

    fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> DbResult<()> {
        let json = serde_json::to_string(value).map_err(|source| DbError::Encode {
            key: key.to_string(),
            source,
        })?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    // ==================== Accounts ====================

    pub fn load_accounts(&self) -> DbResult<Vec<UserAccount>> {
        Ok(self.get_json(KEY_ACCOUNTS)?.unwrap_or_default())
    }

    pub fn save_accounts(&self, accounts: &[UserAccount]) -> DbResult<()> {
        self.put_json(KEY_ACCOUNTS, accounts)
    }

    pub fn load_current_user(&self) -> DbResult<Option<String>> {
        self.get_json(KEY_CURRENT_USER)
    }

    pub fn save_current_user(&self, nickname: &str) -> DbResult<()> {
        self.put_json(KEY_CURRENT_USER, nickname)
    }

    pub fn clear_current_user(&self) -> DbResult<()> {
        self.remove(KEY_CURRENT_USER)
    }

    pub fn load_banned_users(&self) -> DbResult<Vec<String>> {
        Ok(self.get_json(KEY_BANNED_USERS)?.unwrap_or_default())
    }

    pub fn save_banned_users(&self, banned: &[String]) -> DbResult<()> {
        self.put_json(KEY_BANNED_USERS, banned)
    }

    pub fn load_host_users(&self) -> DbResult<Vec<String>> {
        Ok(self.get_json(KEY_HOST_USERS)?.unwrap_or_default())
    }

    pub fn save_host_users(&self, hosts: &[String]) -> DbResult<()> {
        self.put_json(KEY_HOST_USERS, hosts)
    }

    // ==================== Bot ====================

    pub fn load_admin_chat_id(&self) -> DbResult<Option<ChatId>> {
        self.get_json(KEY_ADMIN_CHAT_ID)
    }

    pub fn save_admin_chat_id(&self, chat_id: ChatId) -> DbResult<()> {
        self.put_json(KEY_ADMIN_CHAT_ID, &chat_id)
    }

    // ==================== Listings ====================

    pub fn load_apps(&self) -> DbResult<Vec<AppRecord>> {
        Ok(self.get_json(KEY_APPS)?.unwrap_or_default())
    }

    pub fn save_apps(&self, apps: &[AppRecord]) -> DbResult<()> {
        self.put_json(KEY_APPS, apps)
    }
}
