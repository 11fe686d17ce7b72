use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{info, warn};
use uuid::Uuid;

use pulse_db::models::JoinedUserRow;
use pulse_db::{Database, StoreError};
use pulse_gateway::Dispatcher;
use pulse_session::SessionStore;
use pulse_types::api::{CreateAccountRequest, LoginRequest, PairRequest, ResumeRequest};
use pulse_types::events::StoreChange;
use pulse_types::models::Account;
use pulse_types::pairing::{is_valid_pairing_code, normalize_pairing_code};

use crate::error::ApiError;
use crate::session::Session;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub dispatcher: Dispatcher,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, dispatcher: Dispatcher) -> AppState {
        Arc::new(Self { db, dispatcher })
    }
}

pub async fn create_account(
    State(state): State<AppState>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("name must not be empty".into()));
    }

    let code = normalize_pairing_code(&req.pairing_code);
    if !is_valid_pairing_code(&code) {
        return Err(ApiError::Validation(
            "pairing code must be 8 characters of A-Z and 0-9".into(),
        ));
    }

    let user_id = Uuid::new_v4();
    // A duplicate code surfaces as 409; the caller regenerates and retries.
    state.db.insert_user(&user_id.to_string(), name, &code)?;

    info!("Account created for {}", name);

    let account =
        complete_account(&state, &user_id.to_string())?.ok_or(ApiError::AccountNotFound)?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let code = normalize_pairing_code(&req.pairing_code);
    let row = state
        .db
        .find_user_by_credentials(req.name.trim(), &code)?
        .ok_or(ApiError::InvalidCredentials)?;

    state.db.touch_last_login(&row.id)?;

    let account = complete_account(&state, &row.id)?.ok_or(ApiError::AccountNotFound)?;
    Ok(Json(account))
}

/// Re-authentication with a cached identity. Same lookup as login, plus an
/// id check so a recycled code can't resume as a different account.
pub async fn resume(
    State(state): State<AppState>,
    Json(req): Json<ResumeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let code = normalize_pairing_code(&req.pairing_code);
    let row = state
        .db
        .find_user_by_credentials(req.name.trim(), &code)?
        .ok_or(ApiError::InvalidCredentials)?;

    if row.id != req.user_id.to_string() {
        return Err(ApiError::InvalidCredentials);
    }

    state.db.touch_last_login(&row.id)?;

    let account = complete_account(&state, &row.id)?.ok_or(ApiError::AccountNotFound)?;
    Ok(Json(account))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, ApiError> {
    let account = complete_account(&state, &session.user_id.to_string())?
        .ok_or(ApiError::AccountNotFound)?;
    Ok(Json(account))
}

pub async fn pair(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<PairRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let code = normalize_pairing_code(&req.pairing_code);
    let partner = state
        .db
        .find_user_by_pairing_code(&code)?
        .ok_or(ApiError::PartnerNotFound)?;

    let self_id = session.user_id.to_string();
    if partner.id == self_id {
        // Your own code never resolves to a partner.
        return Err(ApiError::PartnerNotFound);
    }

    state
        .db
        .link_partners(&self_id, &partner.id)
        .map_err(|e| match e {
            StoreError::RowNotFound => ApiError::AccountNotFound,
            e => e.into(),
        })?;

    info!("Paired {} with {}", self_id, partner.id);

    // Pairing changes which events each side can see.
    state.dispatcher.broadcast(StoreChange::EventsChanged);

    let account = complete_account(&state, &self_id)?.ok_or(ApiError::AccountNotFound)?;
    Ok(Json(account))
}

/// Silent relaunch path: re-run the login lookup with the cached identity
/// and discard the cache if the account no longer checks out. A store
/// failure keeps the cache — the account may still be fine.
pub async fn try_auto_login(
    state: &AppState,
    sessions: &SessionStore,
) -> Result<Option<Account>, ApiError> {
    let Some(saved) = sessions.load_session() else {
        return Ok(None);
    };

    let row = state
        .db
        .find_user_by_credentials(&saved.name, &saved.pairing_code)?;
    let valid = row.as_ref().is_some_and(|r| r.id == saved.user_id.to_string());
    if !valid {
        info!("Cached session for {} is stale, clearing", saved.name);
        sessions.clear_session();
        return Ok(None);
    }

    let id = saved.user_id.to_string();
    state.db.touch_last_login(&id)?;
    match complete_account(state, &id)? {
        Some(account) => Ok(Some(account)),
        None => {
            sessions.clear_session();
            Ok(None)
        }
    }
}

/// Materialize the denormalized view the UI needs after any account
/// operation.
pub fn complete_account(state: &AppState, user_id: &str) -> Result<Option<Account>, ApiError> {
    Ok(state.db.get_user_with_partner(user_id)?.map(account_from_row))
}

fn account_from_row(row: JoinedUserRow) -> Account {
    Account {
        user_id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt user id '{}': {}", row.id, e);
            Uuid::default()
        }),
        partner_id: row.partner_id.as_deref().and_then(|s| s.parse().ok()),
        user_name: row.name,
        pairing_code: row.pairing_code,
        partner_name: row.partner_name,
        partner_pairing_code: row.partner_pairing_code,
    }
}
