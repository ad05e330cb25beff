use crate::auction::AuctionError;
use crate::orchestration::LedgerError;
use crate::projection::SettlementError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::CircleNotFound(_)
            | LedgerError::RoundNotFound { .. }
            | LedgerError::MemberNotFound(_) => AppError::NotFound(message),
            LedgerError::InvalidRequest(_) | LedgerError::NotAuction(_) => {
                AppError::BadRequest(message)
            }
            LedgerError::RoundAlreadySettled(_)
            | LedgerError::NoWinner(_)
            | LedgerError::PayoutExists(_)
            | LedgerError::NoBids(_) => AppError::Conflict(message),
            LedgerError::Settlement(SettlementError::RoundAlreadyDecided(_)) => {
                AppError::Conflict(message)
            }
            LedgerError::Settlement(_) => AppError::BadRequest(message),
            LedgerError::Auction(AuctionError::NotRunning { .. }) => AppError::NotFound(message),
            LedgerError::Auction(AuctionError::MailboxClosed) => AppError::Internal(message),
            LedgerError::Auction(_) => AppError::Conflict(message),
            LedgerError::Integrity(_) | LedgerError::Db(_) => AppError::Internal(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
