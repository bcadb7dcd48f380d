use anyhow::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;

use super::types::{is_lock_message, DatabaseError};

// ============================================================================
// Database
// ============================================================================

#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

impl Database {
    /// Open a database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InstanceLocked` if another run has the
    /// database locked (SQLITE_BUSY, SQLITE_LOCKED, SQLITE_CANTOPEN).
    /// Returns `DatabaseError::Other` for other database errors.
    pub async fn open(path: &str) -> Result<Self, DatabaseError> {
        let url = format!("sqlite:{}?mode=rwc", path);

        // SEC-010: Pre-create the database file with user-only permissions
        #[cfg(unix)]
        if path != ":memory:" {
            use std::os::unix::fs::OpenOptionsExt;
            let db_path = std::path::Path::new(path);
            if !db_path.exists() && db_path.parent().is_some_and(|p| p.exists()) {
                // If creation fails, SQLite will report the error at connect_with.
                let _file = std::fs::OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .mode(0o600)
                    .open(db_path)
                    .ok();
            }
        }

        // busy_timeout=5000: wait up to 5 seconds for locks before SQLITE_BUSY.
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(DatabaseError::from_sqlx)?
            .pragma("busy_timeout", "5000");
        // Runs are strictly sequential; one writer connection is all we use.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(DatabaseError::from_sqlx)?;
        let db = Self { pool };
        db.migrate().await.map_err(|e| {
            if is_lock_message(&e.to_string()) {
                DatabaseError::InstanceLocked
            } else {
                DatabaseError::Migration(e.to_string())
            }
        })?;
        Ok(db)
    }

    /// Run database migrations atomically within a transaction.
    ///
    /// All statements use `IF NOT EXISTS`, so re-running on an existing
    /// database is a no-op.
    async fn migrate(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // `row` keeps append order; `id` is always bound as TEXT so numeric-
        // or URL-looking identifiers are never coerced.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS seen_ids (
                row INTEGER PRIMARY KEY,
                id TEXT NOT NULL,
                recorded_at INTEGER NOT NULL
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
