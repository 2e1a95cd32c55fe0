use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A single backend's failure inside a fanned-out write.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendFailure {
    pub backend: &'static str,
    pub error: StorageError,
}

impl Display for BackendFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.backend, self.error)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    #[error("short key not found: {0}")]
    NotFound(String),
    #[error("short key has been deleted: {0}")]
    Deleted(String),
    #[error("short key already exists: {0}")]
    ConstraintViolation(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage i/o failed: {0}")]
    Io(String),
    #[error("operation not supported by {0} storage")]
    Unsupported(&'static str),
    #[error("every storage backend failed: {}", join_failures(.0))]
    AllBackendsFailed(Vec<BackendFailure>),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, StorageError::Unsupported(_))
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

fn join_failures(failures: &[BackendFailure]) -> String {
    if failures.is_empty() {
        return "no backends configured".to_string();
    }
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors surfaced by the shortener service to its callers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShortenerError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid short key: {0}")]
    InvalidShortKey(String),
    #[error("batch must contain at least one item")]
    EmptyBatch,
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_backends_failed_lists_every_backend() {
        let err = StorageError::AllBackendsFailed(vec![
            BackendFailure {
                backend: "memory",
                error: StorageError::ConstraintViolation("abc".to_string()),
            },
            BackendFailure {
                backend: "file",
                error: StorageError::Io("disk full".to_string()),
            },
        ]);

        assert_eq!(
            err.to_string(),
            "every storage backend failed: memory: short key already exists: abc; \
             file: storage i/o failed: disk full"
        );
    }

    #[test]
    fn all_backends_failed_without_backends() {
        let err = StorageError::AllBackendsFailed(Vec::new());
        assert_eq!(
            err.to_string(),
            "every storage backend failed: no backends configured"
        );
    }

    #[test]
    fn storage_error_converts_into_shortener_error() {
        let err: ShortenerError = StorageError::Deleted("abc".to_string()).into();
        assert!(matches!(err, ShortenerError::Storage(StorageError::Deleted(_))));
    }
}
