//! API error envelope (§6 "non-2xx responses carry `{error, message,
//! hint?}`"). `ApiError` is the single `IntoResponse` every handler
//! returns on the error path, converting from `BankError` (domain),
//! `DbError` (storage, via `BankError`), and `AuthError` (tokens).

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use openbank_auth::AuthError;
use openbank_types::BankError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip)]
    pub status: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(&self)).into_response()
    }
}

impl From<BankError> for ApiError {
    fn from(err: BankError) -> Self {
        let hint = err.hint();
        Self {
            error: err.error_code().to_string(),
            status: err.status_code(),
            message: err.to_string(),
            hint,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self {
            error: err.error_code().to_string(),
            status: err.status_code(),
            message: err.to_string(),
            hint: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consent_required_carries_its_hint() {
        let err = ApiError::from(BankError::ConsentRequired {
            hint: "request ReadAccountsDetail".into(),
        });
        assert_eq!(err.error, "CONSENT_REQUIRED");
        assert_eq!(err.status, 403);
        assert_eq!(err.hint.as_deref(), Some("request ReadAccountsDetail"));
    }
}
