//! Notification webhook: the event-source side of the expander.

use crate::{errors::AppError, models::event::NotificationEvent, state::AppState};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::debug;

/// `POST /events`
///
/// Runs the expander on an S3-style notification body and answers with the
/// status string (`Ok`, or empty when the event was stopped early) as plain
/// text. Expansion failures become error responses; nothing is retried here.
pub async fn receive_event(
    State(state): State<AppState>,
    Json(event): Json<NotificationEvent>,
) -> Result<impl IntoResponse, AppError> {
    debug!("received notification with {} record(s)", event.records.len());
    let status = state.expander.handle(&event).await?;
    Ok((StatusCode::OK, status.as_str().to_string()))
}
