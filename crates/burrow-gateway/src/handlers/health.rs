use crate::error::Result;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;

/// Succeeds only when every backend that can be probed answers.
pub async fn ping_handler(State(state): State<AppState>) -> Result<StatusCode> {
    state.shortener().health_check().await?;
    Ok(StatusCode::OK)
}
