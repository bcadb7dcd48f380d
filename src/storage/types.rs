use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another process holds the seen-ID database
    #[error("Another feedrelay run appears to be in progress (seen-ID database is locked)")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_message(&err.to_string()) {
            return DatabaseError::InstanceLocked;
        }
        DatabaseError::Other(err)
    }
}

/// SQLITE_BUSY (5), SQLITE_LOCKED (6) and SQLITE_CANTOPEN (14) all mean
/// another process is in the way.
pub(crate) fn is_lock_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("sqlite_busy")
        || message.contains("sqlite_locked")
        || message.contains("unable to open database file")
}
