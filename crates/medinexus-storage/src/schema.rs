//! Schema versioning
//!
//! The applied version lives in `PRAGMA user_version`. Entry `i` of
//! [`MIGRATIONS`] brings the schema to version `i + 1`.

use rusqlite::Connection;

use crate::error::StorageError;
use crate::Result;

const MIGRATIONS: &[&str] = &[
    // rowid order doubles as enumeration order
    r#"
    CREATE TABLE IF NOT EXISTS kv_entries (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    "#,
];

pub fn version(conn: &Connection) -> Result<usize> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version as usize)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    let current = version(conn)?;
    if current > MIGRATIONS.len() {
        return Err(StorageError::SchemaTooNew {
            found: current,
            supported: MIGRATIONS.len(),
        });
    }

    for (index, sql) in MIGRATIONS.iter().enumerate().skip(current) {
        let next = index + 1;
        tracing::info!(version = next, "Applying storage schema migration");
        conn.execute_batch(sql)?;
        conn.pragma_update(None, "user_version", next as i64)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(version(&conn).unwrap(), 0);

        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(version(&conn).unwrap(), MIGRATIONS.len());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM kv_entries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_rejects_newer_schema() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", 99i64).unwrap();

        let err = migrate(&conn).unwrap_err();
        assert!(matches!(
            err,
            StorageError::SchemaTooNew { found: 99, supported } if supported == MIGRATIONS.len()
        ));
    }
}
