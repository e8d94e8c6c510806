//! Forward-only schema migration framework.
//!
//! Tracks the schema version in `schema_meta` and runs sequential migrations
//! to bring the database up to [`CURRENT_SCHEMA_VERSION`].

use rusqlite::Connection;

/// The schema version that the current binary expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Get the current schema version from the database.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'schema_version'",
        [],
        |row| {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().unwrap_or(0))
        },
    )
}

fn update_schema_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE schema_meta SET value = ?1 WHERE key = 'schema_version'",
        [version.to_string()],
    )?;
    Ok(())
}

/// Run any pending forward-only migrations. Each migration runs in a transaction.
pub fn run_migrations(conn: &Connection) -> rusqlite::Result<()> {
    let mut version = get_schema_version(conn)?;
    tracing::debug!(schema_version = version, target = CURRENT_SCHEMA_VERSION, "checking migrations");

    while version < CURRENT_SCHEMA_VERSION {
        let next = version + 1;
        tracing::info!(from = version, to = next, "running migration");

        conn.execute_batch("BEGIN")?;
        let step = match next {
            2 => migrate_v1_to_v2(conn),
            _ => {
                tracing::error!(version = next, "unknown migration target");
                conn.execute_batch("ROLLBACK")?;
                break;
            }
        };
        if let Err(e) = step.and_then(|_| update_schema_version(conn, next)) {
            conn.execute_batch("ROLLBACK")?;
            return Err(e);
        }
        conn.execute_batch("COMMIT")?;
        version = next;
    }

    Ok(())
}

/// Migration v1 → v2: track when each key was last written.
fn migrate_v1_to_v2(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute("ALTER TABLE kv_store ADD COLUMN updated_at TEXT", [])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::schema::init_schema(&conn).unwrap();
        conn
    }

    fn kv_columns(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM pragma_table_info('kv_store')")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn get_schema_version_returns_1_on_fresh_db() {
        let conn = test_db();
        assert_eq!(get_schema_version(&conn).unwrap(), 1);
    }

    #[test]
    fn run_migrations_upgrades_to_current() {
        let conn = test_db();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn migration_v1_to_v2_adds_updated_at() {
        let conn = test_db();
        assert!(!kv_columns(&conn).contains(&"updated_at".to_string()));

        run_migrations(&conn).unwrap();

        assert!(kv_columns(&conn).contains(&"updated_at".to_string()));
    }

    #[test]
    fn migrations_are_idempotent() {
        let conn = test_db();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap(); // second call should not error
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn v1_rows_survive_migration() {
        let conn = test_db();
        conn.execute(
            "INSERT INTO kv_store (key, value) VALUES ('legacy', '{}')",
            [],
        )
        .unwrap();

        run_migrations(&conn).unwrap();

        let value = crate::db::get_value(&conn, "legacy").unwrap();
        assert_eq!(value.as_deref(), Some("{}"));
    }
}
