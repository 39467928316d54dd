use thiserror::Error;

pub type QaResult<T> = std::result::Result<T, QaError>;

/// Failure kinds surfaced by the stores. All of them are recoverable at the
/// request boundary.
#[derive(Debug, Error)]
pub enum QaError {
    #[error("already exists: {0}")]
    DuplicateEntry(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("{scribe} is already a member of {division}")]
    AlreadyMember { scribe: String, division: String },

    #[error("{scribe} is not a member of {division}")]
    NotMember { scribe: String, division: String },

    #[error("{field} is already finalized for {scribe}")]
    AlreadyFinalized { scribe: String, field: &'static str },

    #[error("division {division} is not associated with {scribe}'s profile")]
    UnassociatedDivision { scribe: String, division: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QaError {
    /// Maps a unique-key violation to `DuplicateEntry`, passing every other
    /// database error through unchanged.
    pub fn from_insert(err: sqlx::Error, what: impl Into<String>) -> Self {
        let duplicate = err
            .as_database_error()
            .map(|db| db.is_unique_violation())
            .unwrap_or(false);

        if duplicate {
            QaError::DuplicateEntry(what.into())
        } else {
            QaError::Database(err)
        }
    }
}
