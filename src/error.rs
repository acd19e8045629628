use std::io;
use thiserror::Error;

/// Error taxonomy for the storage core (see spec §7).
///
/// Every Pager, B+Tree and Catalog/Executor operation returns
/// `Result<T, DbError>`. Nothing in this crate uses exceptions or panics
/// for control flow; `DuplicateKey` is translated to `DuplicatePrimaryKey`
/// by the executor when the key in question is a user-visible primary key.
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid file header: {0}")]
    Format(String),

    #[error("page {page} out of range (file has {total} pages)")]
    OutOfRange { page: u32, total: u32 },

    #[error("buffer of {got} bytes does not match page size {expected}")]
    SizeMismatch { expected: usize, got: usize },

    #[error("duplicate key {0}")]
    DuplicateKey(u32),

    #[error("duplicate primary key {0}")]
    DuplicatePrimaryKey(i64),

    #[error("table '{0}' already exists")]
    TableExists(String),

    #[error("table '{0}' does not exist")]
    TableNotFound(String),

    #[error("column '{0}' does not exist")]
    ColumnNotFound(String),

    #[error("more than one PRIMARY KEY column declared for table '{0}'")]
    MultiplePrimaryKeys(String),

    #[error("cannot convert value for column '{column}': {reason}")]
    Conversion { column: String, reason: String },

    #[error("NOT NULL constraint violated for column '{0}'")]
    NotNull(String),

    #[error("PRIMARY KEY column '{0}' requires an integer value")]
    PrimaryKeyNotInteger(String),

    #[error("expected {expected} value(s), got {got}")]
    Arity { expected: usize, got: usize },

    #[error("unsupported statement: {0}")]
    Unsupported(String),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type DbResult<T> = Result<T, DbError>;
