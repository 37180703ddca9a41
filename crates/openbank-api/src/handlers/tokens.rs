//! Token issuance (§6). Grounded on the sandbox's signing-oracle
//! credential flow: a client token requires an existing, active client
//! row; institution and staff tokens are minted for any named party,
//! since there is no institution/staff registry in this sandbox.

use axum::extract::State;
use axum::Json;
use openbank_auth::TokenClass;
use openbank_types::{BankError, ClientId};

use crate::dto::token::{IssueClientTokenRequest, IssueInstitutionTokenRequest, IssuedTokenResponse};
use crate::error::ApiError;
use crate::state::AppState;

fn issued(state: &AppState, class: TokenClass, subject: &str) -> Result<IssuedTokenResponse, ApiError> {
    let access_token = state.auth.issue(class, subject)?;
    Ok(IssuedTokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        subject: subject.to_string(),
        expires_in: 24 * 60 * 60,
    })
}

pub async fn issue_client_token(
    State(state): State<AppState>,
    Json(body): Json<IssueClientTokenRequest>,
) -> Result<Json<IssuedTokenResponse>, ApiError> {
    let client_id = ClientId::new(body.client_id);
    let client = state.db.client_repo().find_by_id(&client_id).await?;
    if !client.active {
        return Err(BankError::validation("client is not active").into());
    }
    Ok(Json(issued(&state, TokenClass::Client, client.id.as_str())?))
}

pub async fn issue_institution_token(
    State(state): State<AppState>,
    Json(body): Json<IssueInstitutionTokenRequest>,
) -> Result<Json<IssuedTokenResponse>, ApiError> {
    Ok(Json(issued(&state, TokenClass::Institution, &body.institution_id)?))
}

pub async fn issue_staff_token(State(state): State<AppState>) -> Result<Json<IssuedTokenResponse>, ApiError> {
    Ok(Json(issued(&state, TokenClass::Staff, "staff")?))
}
