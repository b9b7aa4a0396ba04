//! SQLite settings store, the console's only persistence.
//!
//! RULE: Only store.rs talks to the database.
//! Other modules read and write settings through these methods.

use crate::error::ConsoleResult;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

pub struct SettingsStore {
    conn: Connection,
}

impl SettingsStore {
    /// Open (or create) the settings database at `path`.
    pub fn open(path: &str) -> ConsoleResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> ConsoleResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> ConsoleResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_settings.sql"))?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> ConsoleResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM setting WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn put_setting(&self, key: &str, value: &str) -> ConsoleResult<()> {
        self.conn.execute(
            "INSERT INTO setting (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Returns whether a value was removed.
    pub fn remove_setting(&self, key: &str) -> ConsoleResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM setting WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    pub fn keys(&self) -> ConsoleResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM setting ORDER BY key ASC")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> ConsoleResult<Option<T>> {
        match self.get_setting(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> ConsoleResult<()> {
        let raw = serde_json::to_string(value)?;
        self.put_setting(key, &raw)
    }
}
