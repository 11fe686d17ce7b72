use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;
use uuid::Uuid;

use pulse_types::api::{CreateEventRequest, UpdateEventRequest};
use pulse_types::events::StoreChange;
use pulse_types::models::Event;

use crate::accounts::AppState;
use crate::error::ApiError;
use crate::session::Session;

pub async fn create_event(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(ApiError::Validation("title must not be empty".into()));
    }

    let event_id = Uuid::new_v4();
    state.db.insert_event(
        &event_id.to_string(),
        title,
        &req.start_date.to_rfc3339(),
        &session.user_id.to_string(),
    )?;

    state.dispatcher.broadcast(StoreChange::EventsChanged);

    Ok((
        StatusCode::CREATED,
        Json(Event {
            id: event_id,
            title: title.to_string(),
            start_date: req.start_date,
            messages: vec![],
        }),
    ))
}

pub async fn list_events(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    // Run blocking DB work off the async runtime
    let db = state.db.clone();
    let uid = session.user_id.to_string();
    let events = tokio::task::spawn_blocking(move || db.load_events_visible_to(&uid))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })??;

    Ok(Json(events))
}

pub async fn update_event(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(event_id): Path<Uuid>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(ApiError::Validation("title must not be empty".into()));
    }

    ensure_visible(&state, event_id, session.user_id)?;

    state
        .db
        .update_event_title(&event_id.to_string(), title)
        .map_err(|e| match e {
            pulse_db::StoreError::RowNotFound => ApiError::EventNotFound,
            e => e.into(),
        })?;

    state.dispatcher.broadcast(StoreChange::EventsChanged);

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_event(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_visible(&state, event_id, session.user_id)?;

    state
        .db
        .delete_event(&event_id.to_string())
        .map_err(|e| match e {
            pulse_db::StoreError::RowNotFound => ApiError::EventNotFound,
            e => e.into(),
        })?;

    state.dispatcher.broadcast(StoreChange::EventsChanged);

    Ok(StatusCode::NO_CONTENT)
}

/// Either member of the pair may touch an event; anyone else sees 404, not
/// 403 — an invisible event does not exist as far as the caller knows.
pub(crate) fn ensure_visible(
    state: &AppState,
    event_id: Uuid,
    user_id: Uuid,
) -> Result<(), ApiError> {
    state
        .db
        .find_event_visible_to(&event_id.to_string(), &user_id.to_string())?
        .map(|_| ())
        .ok_or(ApiError::EventNotFound)
}
