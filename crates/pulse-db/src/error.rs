use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Pairing-code collision at insert. The caller generates a fresh code
    /// and retries; the existing row is never overwritten.
    #[error("pairing code already in use")]
    DuplicateCode,

    /// A targeted update or delete matched no row.
    #[error("row not found")]
    RowNotFound,

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database lock poisoned")]
    Poisoned,
}
