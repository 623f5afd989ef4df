//! Error types for the STAAR progression stack.
//!
//! The engine itself never fails; only storage and configuration can.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StaarError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

impl StaarError {
    pub fn code(&self) -> i32 {
        match self {
            StaarError::Storage(_) => -32001,
            StaarError::Sqlite(_) => -32002,
            StaarError::Io(_) => -32006,
            StaarError::Json(_) => -32700,
            StaarError::Config(_) => -32010,
            StaarError::LockPoisoned(_) => -32603,
        }
    }
}

pub type StaarResult<T> = Result<T, StaarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            StaarError::Storage("x".into()),
            StaarError::Io(std::io::Error::new(std::io::ErrorKind::Other, "x")),
            StaarError::Config("x".into()),
            StaarError::LockPoisoned("users"),
        ];
        let mut codes: Vec<i32> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_error_display() {
        let err = StaarError::Config("points_per_level must be positive".into());
        assert_eq!(
            err.to_string(),
            "Config error: points_per_level must be positive"
        );
    }
}
