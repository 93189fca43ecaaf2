use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LgError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Embedder or vector index could not serve the request.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Graph lookup failed: {0}")]
    GraphLookup(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing required config: {0}")]
    MissingConfig(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

impl From<reqwest::Error> for LgError {
    fn from(err: reqwest::Error) -> Self {
        Self::BackendUnavailable(format!("http: {err}"))
    }
}

impl LgError {
    /// Whether the error came from the semantic path and a retry may succeed.
    #[must_use]
    pub const fn is_backend_unavailable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_) | Self::Timeout(_))
    }

    /// Stable machine-readable error code for robot output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Database(_) => "database",
            Self::Io(_) => "io",
            Self::Json(_) | Self::Serialization(_) => "serialization",
            Self::EmptyInput(_) => "empty_input",
            Self::InvalidInput(_) => "invalid_input",
            Self::BackendUnavailable(_) => "backend_unavailable",
            Self::GraphLookup(_) => "graph_lookup",
            Self::Config(_) | Self::MissingConfig(_) => "config",
            Self::Migration(_) => "migration",
            Self::NotFound(_) => "not_found",
            Self::Timeout(_) => "timeout",
        }
    }
}

pub type Result<T> = std::result::Result<T, LgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_are_retryable() {
        assert!(LgError::BackendUnavailable("down".into()).is_backend_unavailable());
        assert!(LgError::Timeout("slow".into()).is_backend_unavailable());
        assert!(!LgError::EmptyInput("query".into()).is_backend_unavailable());
    }

    #[test]
    fn codes_are_snake_case() {
        assert_eq!(LgError::EmptyInput(String::new()).code(), "empty_input");
        assert_eq!(LgError::MissingConfig(String::new()).code(), "config");
        assert_eq!(LgError::NotFound(String::new()).code(), "not_found");
    }
}
