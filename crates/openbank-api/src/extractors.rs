//! Request-context extraction: the bearer token and the third-party
//! context headers of §6, pulled together once per request instead of
//! re-parsed by every handler.
//!
//! Grounded on `openibank-auth::middleware::RequireAuth`'s
//! `FromRequestParts` shape, merged with the header/verification work a
//! prior tower layer would otherwise do — `AppState` is already reachable
//! from `FromRequestParts<AppState>`, so no separate layer is needed.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use openbank_types::{ConsentId, InstitutionId};

use crate::error::ApiError;
use crate::state::AppState;

pub struct AuthContext {
    pub token: openbank_auth::VerifiedToken,
    pub requesting_institution: Option<InstitutionId>,
    pub consent_id: Option<ConsentId>,
    pub payment_consent_id: Option<ConsentId>,
}

impl<S> FromRequestParts<S> for AuthContext
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(openbank_types::BankError::MissingToken)?;

        let raw = header
            .strip_prefix("Bearer ")
            .ok_or(openbank_types::BankError::MalformedToken)?;

        let token = app_state
            .auth
            .verify(raw)
            .await
            .map_err(ApiError::from)?;

        let requesting_institution = header_str(parts, "x-requesting-institution").map(InstitutionId::new);

        let consent_id = header_str(parts, "x-consent-id")
            .map(|s| ConsentId::parse(&s))
            .transpose()
            .map_err(|_| openbank_types::BankError::validation("invalid X-Consent-Id"))?;

        let payment_consent_id = header_str(parts, "x-payment-consent-id")
            .map(|s| ConsentId::parse(&s))
            .transpose()
            .map_err(|_| openbank_types::BankError::validation("invalid X-Payment-Consent-Id"))?;

        Ok(Self {
            token,
            requesting_institution,
            consent_id,
            payment_consent_id,
        })
    }
}

fn header_str(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
