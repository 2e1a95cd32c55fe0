use crate::error::Result;
use crate::model::UserUrl;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use burrow_core::{OwnerId, ShortenerError};
use std::sync::Arc;
use tracing::{debug, warn};

/// `GET /api/user/urls`: the caller's live mappings, or 204 if there are none.
pub async fn list_user_urls_handler(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
) -> Result<Response> {
    let mappings = state.shortener().list_by_owner(&owner).await?;
    if mappings.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let urls: Vec<_> = mappings
        .into_iter()
        .map(|mapping| UserUrl {
            short_url: state.short_url(&mapping.short_key),
            original_url: mapping.original_url,
        })
        .collect();
    Ok(Json(urls).into_response())
}

/// `DELETE /api/user/urls` with a JSON array of keys.
///
/// Answers 202 immediately. The delete runs in a background task bounded
/// by the configured deadline; failures are only logged.
pub async fn delete_user_urls_handler(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    body: Bytes,
) -> Result<StatusCode> {
    let keys: Vec<String> = serde_json::from_slice(&body)?;
    if keys.is_empty() {
        return Err(ShortenerError::EmptyBatch.into());
    }

    let shortener = Arc::clone(state.shortener());
    let deadline = state.delete_timeout();
    tokio::spawn(async move {
        let requested = keys.len();
        match tokio::time::timeout(deadline, shortener.delete_batch(&owner, keys)).await {
            Ok(Ok(())) => debug!(owner = %owner, requested, "background delete finished"),
            Ok(Err(err)) => warn!(owner = %owner, error = %err, "background delete failed"),
            Err(_) => warn!(owner = %owner, ?deadline, "background delete timed out"),
        }
    });

    Ok(StatusCode::ACCEPTED)
}
