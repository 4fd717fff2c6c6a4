//! Database module
//!
//! Handles SQLite connection and migrations.

pub mod connection;
pub mod migrations;

pub use connection::{Database, DbError, DbResult};

/// In-memory database with foreign keys enabled and the schema applied
#[cfg(test)]
pub(crate) fn test_conn() -> rusqlite::Connection {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    migrations::run_migrations(&conn).unwrap();
    conn
}

/// Pooled shared-cache in-memory database; `name` must be unique per test
#[cfg(test)]
pub(crate) fn test_database(name: &str) -> Database {
    let uri = format!("file:{}?mode=memory&cache=shared", name);
    let db = Database::with_pool_size(uri, 2).unwrap();
    db.with_conn(migrations::run_migrations).unwrap();
    db
}
