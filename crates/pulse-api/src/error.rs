use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use thiserror::Error;
use tracing::error;

use pulse_db::StoreError;
use pulse_types::api::ErrorBody;

/// Everything a handler can fail with. Store failures are surfaced
/// generically; the operation is abandoned with no automatic retry and no
/// state change the caller may assume.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("pairing code already in use")]
    DuplicateCode,

    #[error("invalid name or pairing code")]
    InvalidCredentials,

    #[error("no account matches that pairing code")]
    PartnerNotFound,

    #[error("account not found")]
    AccountNotFound,

    #[error("event not found")]
    EventNotFound,

    #[error("{0}")]
    Validation(String),

    #[error("store failure")]
    Store(#[source] StoreError),

    #[error("internal task failure")]
    Internal,
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateCode => Self::DuplicateCode,
            other => Self::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::DuplicateCode => StatusCode::CONFLICT,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::PartnerNotFound | Self::AccountNotFound | Self::EventNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Store(e) => {
                error!("Store failure: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
