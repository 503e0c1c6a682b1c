//! Database error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("question not found: {0}")]
    QuestionNotFound(i64),

    #[error("tag not found: {0}")]
    TagNotFound(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}
