//! Card handlers (§3).

use axum::extract::{Path, State};
use axum::Json;
use chrono::{Duration, Utc};
use openbank_mediator::Operation;
use openbank_types::{luhn_is_valid, AccountId, BankError, CardId};
use rand::Rng;

use crate::dto::card::{parse_card_status, parse_card_type, CardDto, IssueCardRequest, UpdateCardStatusRequest};
use crate::dto::ResponseEnvelope;
use crate::error::ApiError;
use crate::extractors::AuthContext;
use crate::handlers::authorize;
use crate::state::AppState;

fn generate_pan() -> String {
    // Luhn-valid synthetic PAN: 15 random digits plus a computed check digit.
    let mut rng = rand::thread_rng();
    let mut digits: Vec<u32> = (0..15).map(|_| rng.gen_range(0..10)).collect();
    let check = loop {
        let candidate: u32 = rng.gen_range(0..10);
        let mut trial = digits.clone();
        trial.push(candidate);
        let number: String = trial.iter().map(|d| d.to_string()).collect();
        if luhn_is_valid(&number) {
            break candidate;
        }
    };
    digits.push(check);
    digits.iter().map(|d| d.to_string()).collect()
}

pub async fn issue_card(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(body): Json<IssueCardRequest>,
) -> Result<Json<ResponseEnvelope<CardDto>>, ApiError> {
    let account_id = AccountId::parse(&body.account_id).map_err(|_| BankError::validation("invalid account_id"))?;
    let account = state.db.account_repo().find_by_id(account_id).await?;
    authorize(&state, &ctx, Operation::PostCard, &account.owner).await?;

    let card_type = parse_card_type(&body.card_type)
        .ok_or_else(|| BankError::validation(format!("unknown card_type: {}", body.card_type)))?;
    let daily_limit = body.daily_limit.map(|d| d.into_domain()).transpose()?;
    let monthly_limit = body.monthly_limit.map(|d| d.into_domain()).transpose()?;
    let number = generate_pan();
    let expiry = Utc::now() + Duration::days(365 * 4);

    let card = state
        .db
        .card_repo()
        .create(account_id, &number, card_type, &body.holder_name, expiry, daily_limit, monthly_limit)
        .await?;

    let self_link = format!("/cards/{}", card.id);
    Ok(Json(ResponseEnvelope::single(card.into(), self_link)))
}

pub async fn list_cards(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(account_id): Path<String>,
) -> Result<Json<ResponseEnvelope<Vec<CardDto>>>, ApiError> {
    let account_id = AccountId::parse(&account_id).map_err(|_| BankError::validation("invalid account id"))?;
    let account = state.db.account_repo().find_by_id(account_id).await?;
    authorize(&state, &ctx, Operation::GetCards, &account.owner).await?;

    let cards = state.db.card_repo().list_by_account(account_id).await?;
    let data = cards.into_iter().map(CardDto::from).collect();
    Ok(Json(ResponseEnvelope::single(data, format!("/accounts/{account_id}/cards"))))
}

pub async fn update_card_status(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(card_id): Path<String>,
    Json(body): Json<UpdateCardStatusRequest>,
) -> Result<Json<ResponseEnvelope<CardDto>>, ApiError> {
    let card_id = CardId::parse(&card_id).map_err(|_| BankError::validation("invalid card id"))?;
    let card = state.db.card_repo().find_by_id(card_id).await?;
    let account = state.db.account_repo().find_by_id(card.account).await?;
    authorize(&state, &ctx, Operation::PostCard, &account.owner).await?;

    let status = parse_card_status(&body.status)
        .ok_or_else(|| BankError::validation(format!("unknown card status: {}", body.status)))?;
    let updated = state.db.card_repo().update_status(card_id, status).await?;
    Ok(Json(ResponseEnvelope::single(updated.into(), format!("/cards/{card_id}"))))
}
