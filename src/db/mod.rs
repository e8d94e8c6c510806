//! SQLite-backed local key-value store.
//!
//! The whole user memory lives in a single JSON document, so the database is a
//! thin `kv_store` table plus `schema_meta` for forward-only migrations.

pub mod migrations;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;

/// Open (or create) the LifeLevels database at the given path with the schema
/// initialized and migrated.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.busy_timeout(std::time::Duration::from_millis(5000))?;

    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&conn).context("failed to run migrations")?;

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Open an in-memory database, fully migrated. Nothing survives the connection.
pub fn open_memory_database() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&conn).context("failed to run migrations")?;
    Ok(conn)
}

/// Read the raw value stored under `key`.
pub fn get_value(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM kv_store WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

/// Insert or replace the value stored under `key`.
pub fn put_value(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, now],
    )?;
    Ok(())
}

/// Remove `key`. Returns `true` if a row was deleted.
pub fn delete_value(conn: &Connection, key: &str) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
    Ok(rows > 0)
}

/// Result of [`check_database_health`].
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub schema_version: u32,
    pub integrity_ok: bool,
    pub integrity_details: String,
    pub key_count: i64,
}

/// Run `PRAGMA integrity_check` and collect basic store facts.
pub fn check_database_health(conn: &Connection) -> Result<HealthReport> {
    let schema_version = migrations::get_schema_version(conn)?;
    let integrity: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
    let key_count: i64 = conn.query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))?;

    Ok(HealthReport {
        schema_version,
        integrity_ok: integrity == "ok",
        integrity_details: integrity,
        key_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_delete_roundtrip() {
        let conn = open_memory_database().unwrap();
        assert_eq!(get_value(&conn, "k").unwrap(), None);

        put_value(&conn, "k", "first").unwrap();
        put_value(&conn, "k", "second").unwrap();
        assert_eq!(get_value(&conn, "k").unwrap().as_deref(), Some("second"));

        assert!(delete_value(&conn, "k").unwrap());
        assert!(!delete_value(&conn, "k").unwrap());
        assert_eq!(get_value(&conn, "k").unwrap(), None);
    }

    #[test]
    fn put_sets_updated_at() {
        let conn = open_memory_database().unwrap();
        put_value(&conn, "k", "v").unwrap();
        let updated_at: Option<String> = conn
            .query_row("SELECT updated_at FROM kv_store WHERE key = 'k'", [], |r| r.get(0))
            .unwrap();
        assert!(updated_at.is_some());
    }
}
