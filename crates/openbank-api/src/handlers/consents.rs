//! Consent Registry handlers (§4.1): request/approve/reject/revoke across
//! all five consent kinds, sharing one request/response shape.

use axum::extract::{Path, State};
use axum::Json;
use openbank_db::RequestOutcome;
use openbank_types::{BankError, ClientId, ConsentId, ConsentRequestId, InstitutionId};

use crate::dto::consent::{ConsentDto, RequestConsentRequest, RequestOutcomeDto};
use crate::dto::ResponseEnvelope;
use crate::error::ApiError;
use crate::extractors::AuthContext;
use crate::state::AppState;

/// `POST /account-consents/request` and friends. The caller declares
/// `grantor` implicitly as the authenticated client — third-party
/// institutions do not request consent on a client's behalf.
pub async fn request_consent(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(body): Json<RequestConsentRequest>,
) -> Result<Json<ResponseEnvelope<RequestOutcomeDto>>, ApiError> {
    if ctx.token.class != openbank_auth::TokenClass::Client {
        return Err(BankError::Forbidden.into());
    }
    let grantor = ClientId::new(ctx.token.subject.clone());
    let grantee = InstitutionId::new(body.grantee.clone());
    let scope = body.scope.into_domain()?;
    let kind = scope.kind_name().to_string();

    let settings = state.db.bank_settings_repo().get(&state.own_bank_code).await?;
    let auto_approve = openbank_db::BankSettingsRepo::auto_approve_for_kind(&settings, &kind);

    let outcome = state
        .db
        .consent_repo()
        .request(&grantor, &grantee, &body.grantee_name, scope, &body.reason, auto_approve)
        .await?;

    let (dto, self_link) = match outcome {
        RequestOutcome::AutoApproved(consent) => {
            let link = format!("/consents/{}", consent.id);
            (RequestOutcomeDto::AutoApproved(consent.into()), link)
        }
        RequestOutcome::AwaitingAuthorization(request) => {
            let link = format!("/consent-requests/{}", request.id);
            (RequestOutcomeDto::AwaitingAuthorization(request.into()), link)
        }
    };

    Ok(Json(ResponseEnvelope::single(dto, self_link)))
}

pub async fn approve_consent(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(request_id): Path<String>,
) -> Result<Json<ResponseEnvelope<ConsentDto>>, ApiError> {
    let request_id = ConsentRequestId::parse(&request_id).map_err(|_| BankError::validation("invalid request id"))?;
    let grantor = ClientId::new(ctx.token.subject.clone());
    let consent = state.db.consent_repo().approve(request_id, &grantor).await?;
    let self_link = format!("/consents/{}", consent.id);
    Ok(Json(ResponseEnvelope::single(consent.into(), self_link)))
}

pub async fn reject_consent(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(request_id): Path<String>,
) -> Result<Json<ResponseEnvelope<crate::dto::consent::ConsentRequestDto>>, ApiError> {
    let request_id = ConsentRequestId::parse(&request_id).map_err(|_| BankError::validation("invalid request id"))?;
    let grantor = ClientId::new(ctx.token.subject.clone());
    let request = state.db.consent_repo().reject(request_id, &grantor).await?;
    let self_link = format!("/consent-requests/{}", request.id);
    Ok(Json(ResponseEnvelope::single(request.into(), self_link)))
}

pub async fn revoke_consent(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(consent_id): Path<String>,
) -> Result<Json<ResponseEnvelope<ConsentDto>>, ApiError> {
    let consent_id = ConsentId::parse(&consent_id).map_err(|_| BankError::validation("invalid consent id"))?;
    let grantor = ClientId::new(ctx.token.subject.clone());
    let consent = state.db.consent_repo().revoke(consent_id, &grantor).await?;
    let self_link = format!("/consents/{}", consent.id);
    Ok(Json(ResponseEnvelope::single(consent.into(), self_link)))
}

pub async fn get_consent(
    State(state): State<AppState>,
    _ctx: AuthContext,
    Path(consent_id): Path<String>,
) -> Result<Json<ResponseEnvelope<ConsentDto>>, ApiError> {
    let consent_id = ConsentId::parse(&consent_id).map_err(|_| BankError::validation("invalid consent id"))?;
    let consent = state.db.consent_repo().find_by_id(consent_id).await?;
    let self_link = format!("/consents/{}", consent.id);
    Ok(Json(ResponseEnvelope::single(consent.into(), self_link)))
}
