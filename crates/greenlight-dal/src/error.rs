use std::time::Duration;

use greenlight_types::ValidationError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Edit conflict on record {id}, version {version} is not current")]
    EditConflict { id: i64, version: i32 },

    #[error("Invalid order by field: {0}")]
    InvalidOrderByField(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl Error {
    /// Backend or infrastructure failure, as opposed to an outcome the caller can act on.
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            Error::DatabaseError(_) | Error::MigrationError(_) | Error::Timeout(_)
        )
    }
}
