use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use burrow_core::{ShortenerError, StorageError};
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error(transparent)]
    Shortener(#[from] ShortenerError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            AppError::Shortener(err) => match err {
                ShortenerError::InvalidUrl(_)
                | ShortenerError::InvalidShortKey(_)
                | ShortenerError::EmptyBatch => StatusCode::BAD_REQUEST,
                ShortenerError::Storage(StorageError::NotFound(_)) => StatusCode::BAD_REQUEST,
                ShortenerError::Storage(StorageError::Deleted(_)) => StatusCode::GONE,
                ShortenerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedBody(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ShortenerError) -> StatusCode {
        AppError::from(err).status()
    }

    #[test]
    fn validation_errors_are_client_errors() {
        assert_eq!(
            status_of(ShortenerError::InvalidUrl("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ShortenerError::InvalidShortKey("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(ShortenerError::EmptyBatch), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::MalformedBody("eof".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn storage_errors_map_by_kind() {
        assert_eq!(
            status_of(StorageError::Deleted("k".into()).into()),
            StatusCode::GONE
        );
        assert_eq!(
            status_of(StorageError::NotFound("k".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(StorageError::AllBackendsFailed(Vec::new()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(StorageError::Unavailable("down".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
