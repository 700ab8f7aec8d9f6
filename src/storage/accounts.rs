//! Durable account storage backed by SQLite.
//!
//! One table, `accounts`, keyed by an AUTOINCREMENT id so ids stay stable
//! and are never reused after a delete. Secrets arrive here already
//! encrypted; this layer never sees plaintext key material.
//!
//! Locking discipline: a `Mutex` serializes access within the process, and
//! the connection runs in SQLite's exclusive locking mode with the file
//! lock taken eagerly at open, so a second process opening the same
//! database fails fast instead of risking interleaved writes.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, VaultError};

/// One persisted account row. `secret` is the encrypted blob.
#[derive(Debug, Clone, Serialize)]
pub struct StoredAccount {
    pub id: i64,
    pub name: String,
    pub issuer: Option<String>,
    #[serde(skip)]
    pub secret: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// Handle to the on-disk account table.
pub struct CredentialStore {
    conn: Mutex<Connection>,
}

impl CredentialStore {
    /// Open (creating if necessary) the account database at `path` and
    /// take the exclusive file lock.
    ///
    /// # Errors
    /// `StorageUnavailable` if the file cannot be created or read, or if
    /// another process already holds the database.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                VaultError::StorageUnavailable(format!(
                    "cannot create data directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(path)?;

        // Hold the file lock for the lifetime of this handle. BEGIN
        // EXCLUSIVE forces acquisition now, so a concurrent opener gets
        // SQLITE_BUSY here instead of corrupting data later.
        conn.execute_batch("PRAGMA locking_mode=EXCLUSIVE;")?;
        conn.execute_batch("BEGIN EXCLUSIVE; COMMIT;")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;

        info!("Opened account store at {:?}", path);
        Ok(store)
    }

    /// In-memory store for tests.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        self.lock_conn()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS accounts (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                issuer      TEXT,
                secret      BLOB NOT NULL,
                created_at  TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Insert a new account row and return its id.
    pub fn insert(&self, name: &str, issuer: Option<&str>, ciphertext: &[u8]) -> Result<i64> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO accounts (name, issuer, secret, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![name, issuer, ciphertext, Utc::now()],
        )?;
        let id = conn.last_insert_rowid();
        debug!("Inserted account {} ({})", id, name);
        Ok(id)
    }

    /// All rows in insertion order.
    pub fn list_all(&self) -> Result<Vec<StoredAccount>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, issuer, secret, created_at FROM accounts ORDER BY id",
        )?;
        let rows = stmt.query_map([], row_to_account)?;

        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(row?);
        }
        Ok(accounts)
    }

    /// Fetch a single row.
    pub fn get(&self, id: i64) -> Result<StoredAccount> {
        let conn = self.lock_conn()?;
        conn.query_row(
            "SELECT id, name, issuer, secret, created_at FROM accounts WHERE id = ?1",
            params![id],
            row_to_account,
        )
        .optional()?
        .ok_or(VaultError::AccountNotFound(id))
    }

    /// Delete a row permanently.
    ///
    /// # Errors
    /// `AccountNotFound` when no row has this id, so callers can tell
    /// "already gone" apart from a storage fault.
    pub fn delete(&self, id: i64) -> Result<()> {
        let affected = self
            .lock_conn()?
            .execute("DELETE FROM accounts WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(VaultError::AccountNotFound(id));
        }
        debug!("Deleted account {}", id);
        Ok(())
    }

    /// Number of stored accounts.
    pub fn count(&self) -> Result<usize> {
        let count: i64 =
            self.lock_conn()?
                .query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| VaultError::StorageUnavailable("store lock poisoned".into()))
    }
}

fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredAccount> {
    Ok(StoredAccount {
        id: row.get(0)?,
        name: row.get(1)?,
        issuer: row.get(2)?,
        secret: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_assigns_distinct_ids() {
        let store = CredentialStore::open_in_memory().unwrap();
        let a = store.insert("a@example.com", None, b"blob-a").unwrap();
        let b = store.insert("b@example.com", Some("GitHub"), b"blob-b").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let store = CredentialStore::open_in_memory().unwrap();
        for name in ["first", "second", "third"] {
            store.insert(name, None, b"blob").unwrap();
        }
        let names: Vec<String> = store
            .list_all()
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn test_get_returns_row_fields() {
        let store = CredentialStore::open_in_memory().unwrap();
        let id = store
            .insert("me@example.com", Some("Google"), b"ciphertext")
            .unwrap();
        let account = store.get(id).unwrap();
        assert_eq!(account.name, "me@example.com");
        assert_eq!(account.issuer.as_deref(), Some("Google"));
        assert_eq!(account.secret, b"ciphertext");
    }

    #[test]
    fn test_delete_then_get_fails() {
        let store = CredentialStore::open_in_memory().unwrap();
        let id = store.insert("gone", None, b"blob").unwrap();
        store.delete(id).unwrap();
        assert!(matches!(store.get(id), Err(VaultError::AccountNotFound(_))));
        assert!(matches!(
            store.delete(id),
            Err(VaultError::AccountNotFound(_))
        ));
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let store = CredentialStore::open_in_memory().unwrap();
        let first = store.insert("one", None, b"blob").unwrap();
        store.delete(first).unwrap();
        let second = store.insert("two", None, b"blob").unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_hostile_names_are_stored_verbatim() {
        let store = CredentialStore::open_in_memory().unwrap();
        let name = "bobby'); DROP TABLE accounts;--";
        let id = store.insert(name, Some("x\" OR 1=1"), b"blob").unwrap();
        assert_eq!(store.get(id).unwrap().name, name);
        assert_eq!(store.count().unwrap(), 1);
    }
}
