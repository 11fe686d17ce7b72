use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use pulse_types::api::AddMessageRequest;
use pulse_types::events::StoreChange;
use pulse_types::models::EventMessage;

use crate::accounts::AppState;
use crate::error::ApiError;
use crate::events::ensure_visible;
use crate::session::Session;

/// Append a note to an event's thread. The author tag is relative to the
/// submitting side; threads are append-only.
pub async fn add_message(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(event_id): Path<Uuid>,
    Json(req): Json<AddMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let text = req.text.trim();
    if text.is_empty() {
        return Err(ApiError::Validation("message text must not be empty".into()));
    }

    ensure_visible(&state, event_id, session.user_id)?;

    let message_id = Uuid::new_v4();
    state.db.insert_message(
        &message_id.to_string(),
        &event_id.to_string(),
        text,
        req.author,
        &session.user_id.to_string(),
    )?;

    state.dispatcher.broadcast(StoreChange::EventsChanged);

    Ok((
        StatusCode::CREATED,
        Json(EventMessage {
            id: message_id,
            text: text.to_string(),
            created_at: Utc::now(),
            author: req.author,
        }),
    ))
}
