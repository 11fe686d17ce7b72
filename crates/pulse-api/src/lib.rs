pub mod accounts;
pub mod error;
pub mod events;
pub mod messages;
pub mod session;

pub use accounts::{AppState, AppStateInner};
pub use error::ApiError;

use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};

use crate::session::require_session;

/// The REST surface. The server binary layers CORS/trace and mounts the
/// WebSocket route on top; tests drive this router directly.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/accounts", post(accounts::create_account))
        .route("/accounts/login", post(accounts::login))
        .route("/accounts/resume", post(accounts::resume))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/accounts/me", get(accounts::me))
        .route("/accounts/pair", post(accounts::pair))
        .route("/events", get(events::list_events))
        .route("/events", post(events::create_event))
        .route("/events/{event_id}", patch(events::update_event))
        .route("/events/{event_id}", delete(events::delete_event))
        .route("/events/{event_id}/messages", post(messages::add_message))
        .layer(middleware::from_fn(require_session))
        .with_state(state);

    public.merge(protected)
}
