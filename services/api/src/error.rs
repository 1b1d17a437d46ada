//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service.

use axum::http::StatusCode;
use readquest_core::ports::EngineError;

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core engine ports.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// Maps an `EngineError` onto the HTTP status the handlers respond with.
pub fn engine_error_response(err: EngineError) -> (StatusCode, String) {
    match err {
        EngineError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
        EngineError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
        EngineError::Storage(msg) => {
            tracing::error!("storage failure: {msg}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_errors_map_to_expected_statuses() {
        let (status, _) = engine_error_response(EngineError::Validation("bad".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = engine_error_response(EngineError::NotFound("achievement x".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("not found"));

        let (status, body) = engine_error_response(EngineError::Storage("pool gone".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        // Storage details stay in the logs, not the response body.
        assert!(!body.contains("pool gone"));
    }
}
