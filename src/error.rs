//! Application error types.
//!
//! `StoreError` is raised by the connection pool and the three stores;
//! `AppError` covers everything above them (collaborators, pipeline, CLI).

use thiserror::Error;

/// Errors raised by the storage layer.
///
/// No retry is attempted at this layer; callers decide.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid dependency strength {0}: must be finite and non-negative")]
    InvalidStrength(f64),

    #[error("Invalid search pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Row decode error: {0}")]
    Decode(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(err: tokio_postgres::Error) -> Self {
        StoreError::Database {
            message: describe_pg_error(&err),
        }
    }
}

impl From<deadpool_postgres::PoolError> for StoreError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        StoreError::Pool(format!("Failed to get connection from pool: {}", err))
    }
}

/// Extracts severity, message, SQLSTATE and detail from a PostgreSQL error.
pub(crate) fn describe_pg_error(err: &tokio_postgres::Error) -> String {
    err.as_db_error()
        .map(|db_err| {
            format!(
                "{}: {} [{}] (detail: {:?}, hint: {:?})",
                db_err.severity(),
                db_err.message(),
                db_err.code().code(),
                db_err.detail(),
                db_err.hint()
            )
        })
        .unwrap_or_else(|| err.to_string())
}

/// Application-level errors for migrant.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    // Collaborator errors
    #[error("Source fetch failed: {0}")]
    Fetch(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Completion endpoint error: {0}")]
    Llm(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Legacy database error: {0}")]
    LegacyDatabase(String),

    // Data-integrity errors
    #[error("Invalid path pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Code generation failed: {0}")]
    Generation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl AppError {
    /// Stable machine-readable code, used as the prefix of FAILURE log rows.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Store(StoreError::DimensionMismatch { .. }) => "DIMENSION_MISMATCH",
            AppError::Store(_) => "STORE_ERROR",
            AppError::Fetch(_) => "FETCH_ERROR",
            AppError::Http(_) => "HTTP_ERROR",
            AppError::Llm(_) => "LLM_ERROR",
            AppError::Embedding(_) => "EMBEDDING_ERROR",
            AppError::LegacyDatabase(_) => "LEGACY_DB_ERROR",
            AppError::InvalidPattern { .. } => "INVALID_PATTERN",
            AppError::ComponentNotFound(_) => "COMPONENT_NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Generation(_) => "GENERATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Formats the error as `[CODE] message`.
    pub fn to_log_string(&self) -> String {
        format!("[{}] {}", self.code(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_for_dimension_mismatch() {
        let err = AppError::from(StoreError::DimensionMismatch {
            expected: 4,
            actual: 3,
        });
        assert_eq!(err.code(), "DIMENSION_MISMATCH");
        assert_eq!(
            err.to_log_string(),
            "[DIMENSION_MISMATCH] Embedding dimension mismatch: expected 4, got 3"
        );
    }

    #[test]
    fn test_code_for_generation_error() {
        let err = AppError::Generation("empty class name".into());
        assert_eq!(
            err.to_log_string(),
            "[GENERATION_ERROR] Code generation failed: empty class name"
        );
    }
}
