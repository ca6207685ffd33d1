use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ledger_core::LedgerError;
use serde::Serialize;
use tracing::error;

#[derive(Debug)]
pub(crate) enum ApiError {
    Ledger(LedgerError),
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    defects: Vec<String>,
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        ApiError::Ledger(e)
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            ApiError::Ledger(e) => match e {
                LedgerError::MalformedChallenge(_) => (StatusCode::BAD_REQUEST, "malformed_challenge"),
                LedgerError::Encode(_) => (StatusCode::BAD_REQUEST, "unencodable_record"),
                LedgerError::ExpiredChallenge { .. } => (StatusCode::UNAUTHORIZED, "expired_challenge"),
                LedgerError::InvalidSignature => (StatusCode::UNAUTHORIZED, "invalid_signature"),
                LedgerError::GenesisPayload => (StatusCode::UNPROCESSABLE_ENTITY, "genesis_payload"),
                LedgerError::ChainIntegrity(_) => (StatusCode::CONFLICT, "chain_integrity"),
                LedgerError::Decode { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "decode_error"),
                LedgerError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        if status.is_server_error() {
            error!(code, "request failed: {self:?}");
        }
        let (message, defects) = match self {
            ApiError::BadRequest(m) | ApiError::NotFound(m) | ApiError::Internal(m) => (m, Vec::new()),
            ApiError::Ledger(LedgerError::ChainIntegrity(defects)) => {
                ("chain integrity check failed".to_string(), defects)
            }
            ApiError::Ledger(e) => (e.to_string(), Vec::new()),
        };
        (
            status,
            Json(ErrorBody {
                code,
                message,
                defects,
            }),
        )
            .into_response()
    }
}
