// Error taxonomy for the todo store

use uuid::Uuid;

/// Errors surfaced by the store and its file import/export paths.
///
/// The store never swallows or retries: storage failures propagate to the
/// caller unmodified, and the only local recovery anywhere is the bulk
/// import rolling back its transaction before re-raising.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A read or update targeted an id with no row.
    #[error("task not found: {0}")]
    NotFound(Uuid),

    /// An explicitly supplied id collided with an existing row on create.
    #[error("duplicate task id: {0}")]
    DuplicateKey(Uuid),

    /// A due date string that is not a valid `YYYY-MM-DD` calendar date.
    #[error("invalid due date: {0:?}")]
    InvalidDate(String),

    /// Malformed import file or content, wrapping the parse or validation
    /// cause. The store is unchanged when this is returned.
    #[error("import failed: {0}")]
    Import(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Engine-level failure from the storage backend.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// I/O failure reading or writing an import/export file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn import(cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Import(Box::new(cause))
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
