use crate::error::Result;
use crate::model::{BatchShortenItem, ShortenRequest, ShortenResponse};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use burrow_core::{BatchItem, OwnerId, Resolution, SaveOutcome, ShortenerError};
use tracing::warn;

fn status_for(outcome: SaveOutcome) -> StatusCode {
    match outcome {
        SaveOutcome::Created => StatusCode::CREATED,
        SaveOutcome::Conflict => StatusCode::CONFLICT,
    }
}

/// `POST /` with the URL as a plain-text body.
pub async fn shorten_text_handler(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    body: String,
) -> Result<Response> {
    let shortened = state.shortener().shorten(&owner, &body).await?;

    Ok((status_for(shortened.outcome), state.short_url(&shortened.key)).into_response())
}

/// `POST /api/shorten` with `{"url": ...}`.
pub async fn shorten_json_handler(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    body: Bytes,
) -> Result<Response> {
    let request: ShortenRequest = serde_json::from_slice(&body)?;
    let shortened = state.shortener().shorten(&owner, &request.url).await?;

    let response = ShortenResponse {
        result: state.short_url(&shortened.key),
    };
    Ok((status_for(shortened.outcome), Json(response)).into_response())
}

/// `POST /api/shorten/batch` with `[{"correlation_id", "original_url"}]`.
///
/// Answers 201 when at least one item produced a new key, 409 otherwise.
pub async fn shorten_batch_handler(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    body: Bytes,
) -> Result<Response> {
    let items: Vec<BatchItem> = serde_json::from_slice(&body)?;
    let entries = state.shortener().shorten_batch(&owner, items).await?;

    let outcome = if entries.iter().any(|e| e.outcome == SaveOutcome::Created) {
        SaveOutcome::Created
    } else {
        SaveOutcome::Conflict
    };
    let response: Vec<_> = entries
        .into_iter()
        .map(|entry| BatchShortenItem {
            short_url: state.short_url(&entry.key),
            correlation_id: entry.correlation_id,
        })
        .collect();

    Ok((status_for(outcome), Json(response)).into_response())
}

/// `GET /{key}`: temporary redirect to the original URL.
pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response> {
    match state.shortener().resolve(&key).await {
        Ok(Resolution::Found(url)) => Ok(Redirect::temporary(&url).into_response()),
        Ok(Resolution::Deleted) => Ok(StatusCode::GONE.into_response()),
        Ok(Resolution::NotFound) => Ok(StatusCode::BAD_REQUEST.into_response()),
        Err(ShortenerError::Storage(err)) => {
            warn!(key = %key, error = %err, "failed to resolve short key");
            Ok(StatusCode::BAD_REQUEST.into_response())
        }
        Err(err) => Err(err.into()),
    }
}
