use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Request-scoped session context, threaded explicitly through every
/// handler. No process-wide session state exists.
#[derive(Debug, Clone, Copy)]
pub struct Session {
    pub user_id: Uuid,
}

/// Header carrying the caller's user id. The name+code pair authenticated
/// this id at login; requests carry only the id.
pub const SESSION_HEADER: &str = "x-pulse-user";

pub async fn require_session(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let user_id: Uuid = req
        .headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(Session { user_id });
    Ok(next.run(req).await)
}
