use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RollbookError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for RollbookError {
    fn from(error: sqlx::Error) -> Self {
        RollbookError::Database(error.to_string())
    }
}

impl From<serde_json::Error> for RollbookError {
    fn from(error: serde_json::Error) -> Self {
        RollbookError::Validation(format!("Malformed JSON: {error}"))
    }
}

// Embedding UIs report errors as plain strings.
impl Serialize for RollbookError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}

pub type RollbookResult<T> = Result<T, RollbookError>;

#[cfg(test)]
#[path = "tests/errors_tests.rs"]
mod tests;
