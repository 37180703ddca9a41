//! Payment Engine handlers (§4.3): single and VRP payments.

use axum::extract::State;
use axum::Json;
use openbank_db::PaymentGate;
use openbank_mediator::Operation;

use crate::dto::payment::{InitiatePaymentRequest, InitiateVrpPaymentRequest, PaymentDto};
use crate::dto::ResponseEnvelope;
use crate::error::ApiError;
use crate::extractors::AuthContext;
use crate::handlers::authorize;
use crate::state::AppState;

pub async fn initiate_payment(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(body): Json<InitiatePaymentRequest>,
) -> Result<Json<ResponseEnvelope<PaymentDto>>, ApiError> {
    let source = state.db.account_repo().find_active_source(&body.from_account_number).await?;
    authorize(&state, &ctx, Operation::InitiatePayment, &source.owner).await?;

    let gate = match ctx.payment_consent_id {
        Some(consent_id) => PaymentGate::Single(consent_id),
        None => PaymentGate::None,
    };

    let amount = body.amount.into_domain()?;
    let payment = state
        .db
        .payment_repo()
        .initiate(
            &body.from_account_number,
            &body.to_account_number,
            body.to_bank_code.as_deref(),
            amount,
            &body.description,
            gate,
            &state.own_bank_code,
        )
        .await?;

    let self_link = format!("/payments/{}", payment.id);
    Ok(Json(ResponseEnvelope::single(payment.into(), self_link)))
}

pub async fn initiate_vrp_payment(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(body): Json<InitiateVrpPaymentRequest>,
) -> Result<Json<ResponseEnvelope<PaymentDto>>, ApiError> {
    let consent_id = ctx
        .payment_consent_id
        .ok_or_else(|| openbank_types::BankError::validation("X-Payment-Consent-Id header is required for VRP payments"))?;

    let consent = state.db.consent_repo().find_by_id(consent_id).await?;
    authorize(&state, &ctx, Operation::InitiateVrpPayment, &consent.grantor).await?;

    let source_account = match &consent.scope {
        openbank_types::ConsentScope::Vrp { source_account, .. } => *source_account,
        _ => return Err(openbank_types::BankError::InvalidScope.into()),
    };
    let source = state.db.account_repo().find_by_id(source_account).await?;

    let amount = body.amount.into_domain()?;
    let payment = state
        .db
        .payment_repo()
        .initiate(
            &source.account_number,
            &body.to_account_number,
            body.to_bank_code.as_deref(),
            amount,
            &body.description,
            PaymentGate::Vrp(consent_id),
            &state.own_bank_code,
        )
        .await?;

    let self_link = format!("/payments/{}", payment.id);
    Ok(Json(ResponseEnvelope::single(payment.into(), self_link)))
}
