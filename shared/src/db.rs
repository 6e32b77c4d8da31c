//! A single SQLite connection opened at startup and shared by every handler.
//!
//! rusqlite is blocking, so each call hops onto tokio's blocking pool and takes
//! the connection lock there.

use crate::config::DatabaseConfig;
use parking_lot::Mutex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params_from_iter};
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(config: &DatabaseConfig) -> Result<Self, DbError> {
        let conn = Connection::open(&config.path)?;
        tracing::info!(path = %config.path, "opened database");
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` against the connection on the blocking pool.
    pub async fn call<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        let result = tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut guard)
        })
        .await??;
        Ok(result)
    }
}

/// `SET column = ?` pairs for a partial update.
#[derive(Debug, Default)]
pub struct Assignments {
    columns: Vec<&'static str>,
    values: Vec<SqlValue>,
}

impl Assignments {
    pub fn set(&mut self, column: &'static str, value: Option<SqlValue>) {
        if let Some(value) = value {
            self.columns.push(column);
            self.values.push(value);
        }
    }

    /// Runs the update against the row with `id`; a no-op when nothing was set.
    pub fn apply(self, conn: &Connection, table: &str, id: &str) -> rusqlite::Result<usize> {
        if self.columns.is_empty() {
            return Ok(0);
        }
        let set_clause = self
            .columns
            .iter()
            .map(|column| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut values = self.values;
        values.push(SqlValue::Text(id.to_string()));
        conn.execute(
            &format!("UPDATE {table} SET {set_clause} WHERE id = ?"),
            params_from_iter(values),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_call_in_memory() {
        let db = Database::open(&DatabaseConfig::in_memory()).unwrap();
        db.call(|conn| conn.execute_batch("CREATE TABLE t (v INTEGER NOT NULL)"))
            .await
            .unwrap();
        db.call(|conn| conn.execute("INSERT INTO t (v) VALUES (?1)", [7]))
            .await
            .unwrap();

        let value: i64 = db
            .call(|conn| conn.query_row("SELECT v FROM t", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("store.sqlite").to_str().unwrap().to_string(),
        };

        let db = Database::open(&config).unwrap();
        db.call(|conn| conn.execute_batch("CREATE TABLE t (v TEXT); INSERT INTO t VALUES ('x')"))
            .await
            .unwrap();
        drop(db);

        let reopened = Database::open(&config).unwrap();
        let value: String = reopened
            .call(|conn| conn.query_row("SELECT v FROM t", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(value, "x");
    }

    #[tokio::test]
    async fn test_sql_errors_surface() {
        let db = Database::open(&DatabaseConfig::in_memory()).unwrap();
        let result = db
            .call(|conn| conn.execute_batch("SELECT * FROM missing"))
            .await;
        assert!(matches!(result, Err(DbError::Sqlite(_))));
    }

    #[tokio::test]
    async fn test_partial_update() {
        let db = Database::open(&DatabaseConfig::in_memory()).unwrap();
        db.call(|conn| {
            conn.execute_batch(
                "CREATE TABLE t (id TEXT PRIMARY KEY, a TEXT, b REAL);
                 INSERT INTO t VALUES ('x', 'old', 1.5)",
            )
        })
        .await
        .unwrap();

        let (updated, row): (usize, (Option<String>, f64)) = db
            .call(|conn| {
                let mut assignments = Assignments::default();
                assignments.set("a", Some(SqlValue::Null));
                assignments.set("b", None);
                let updated = assignments.apply(conn, "t", "x")?;
                let row = conn.query_row("SELECT a, b FROM t WHERE id = 'x'", [], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?;
                Ok((updated, row))
            })
            .await
            .unwrap();
        assert_eq!(updated, 1);
        assert_eq!(row, (None, 1.5));

        let untouched = db
            .call(|conn| Assignments::default().apply(conn, "t", "x"))
            .await
            .unwrap();
        assert_eq!(untouched, 0);
    }
}
