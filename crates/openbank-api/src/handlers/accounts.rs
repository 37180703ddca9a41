//! Account Ledger handlers (§4.4).

use axum::extract::{Path, Query, State};
use axum::Json;
use openbank_mediator::Operation;
use openbank_db::CloseDisposition;
use openbank_types::{coerce_paging, Account, AccountId, BankError, ClientId};
use serde::Deserialize;

use crate::dto::account::{parse_account_type, AccountDto, CloseAccountRequest, CreateAccountRequest, TransactionPageDto};
use crate::dto::{PageParams, ResponseEnvelope};
use crate::error::ApiError;
use crate::extractors::AuthContext;
use crate::handlers::authorize;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ClientIdQuery {
    pub client_id: Option<String>,
}

fn resolve_subject(ctx: &AuthContext, client_id: &Option<String>) -> ClientId {
    match client_id {
        Some(id) => ClientId::new(id.clone()),
        None => ClientId::new(ctx.token.subject.clone()),
    }
}

async fn load_account(state: &AppState, id: &str) -> Result<Account, ApiError> {
    let account_id = AccountId::parse(id).map_err(|_| BankError::validation("invalid account id"))?;
    Ok(state.db.account_repo().find_by_id(account_id).await?)
}

pub async fn list_accounts(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<ClientIdQuery>,
) -> Result<Json<ResponseEnvelope<Vec<AccountDto>>>, ApiError> {
    let subject = resolve_subject(&ctx, &query.client_id);
    authorize(&state, &ctx, Operation::GetAccountDetail, &subject).await?;

    let accounts = state.db.account_repo().list_by_client(&subject).await?;
    let data = accounts.into_iter().map(AccountDto::from).collect();
    Ok(Json(ResponseEnvelope::single(data, "/accounts")))
}

pub async fn create_account(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<ClientIdQuery>,
    Json(body): Json<CreateAccountRequest>,
) -> Result<Json<ResponseEnvelope<AccountDto>>, ApiError> {
    let subject = resolve_subject(&ctx, &query.client_id);
    authorize(&state, &ctx, Operation::PostAccount, &subject).await?;

    let account_type = parse_account_type(&body.account_type)
        .ok_or_else(|| BankError::validation(format!("unknown account_type: {}", body.account_type)))?;
    let initial_balance = match body.initial_balance {
        Some(dto) => dto.into_domain()?,
        None => {
            return Err(BankError::validation("initial_balance is required").into());
        }
    };

    let account_number = format!("acc-no-{}", uuid::Uuid::new_v4());
    let account = state
        .db
        .account_repo()
        .create(&subject, &account_number, account_type, initial_balance)
        .await?;

    let self_link = format!("/accounts/{}", account.id);
    Ok(Json(ResponseEnvelope::single(account.into(), self_link)))
}

pub async fn get_account(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<ResponseEnvelope<AccountDto>>, ApiError> {
    let account = load_account(&state, &id).await?;
    authorize(&state, &ctx, Operation::GetAccountDetail, &account.owner).await?;
    let self_link = format!("/accounts/{id}");
    Ok(Json(ResponseEnvelope::single(account.into(), self_link)))
}

#[derive(Debug, serde::Serialize)]
pub struct BalanceDto {
    pub account_id: String,
    pub balance: crate::dto::MoneyDto,
}

pub async fn get_balance(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<ResponseEnvelope<BalanceDto>>, ApiError> {
    let account = load_account(&state, &id).await?;
    authorize(&state, &ctx, Operation::GetBalance, &account.owner).await?;
    let dto = BalanceDto {
        account_id: account.id.to_string(),
        balance: crate::dto::MoneyDto::from_domain(account.balance),
    };
    Ok(Json(ResponseEnvelope::single(dto, format!("/accounts/{id}/balance"))))
}

pub async fn get_transactions(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    Query(page): Query<PageParams>,
) -> Result<Json<ResponseEnvelope<TransactionPageDto>>, ApiError> {
    let account = load_account(&state, &id).await?;
    authorize(&state, &ctx, Operation::GetTransactions, &account.owner).await?;

    let (coerced_page, coerced_limit) = coerce_paging(page.page.unwrap_or(0), page.limit.unwrap_or(0), 50, 500);
    let history = state
        .db
        .account_repo()
        .history(account.id, coerced_page as i64, coerced_limit as i64)
        .await?;

    let total_pages = history.total_pages();
    let total_records = history.total_count;
    let next = history.next_page().map(|p| format!("/accounts/{id}/transactions?page={p}"));
    let prev = history.prev_page().map(|p| format!("/accounts/{id}/transactions?page={p}"));

    let envelope = ResponseEnvelope::paged(
        TransactionPageDto::from(history),
        crate::dto::Links {
            self_link: format!("/accounts/{id}/transactions?page={coerced_page}"),
            next,
            prev,
        },
        crate::dto::Meta {
            total_pages: Some(total_pages),
            total_records: Some(total_records),
            current_page: Some(coerced_page),
            page_size: Some(coerced_limit),
        },
    );
    Ok(Json(envelope))
}

pub async fn close_account(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    Json(body): Json<CloseAccountRequest>,
) -> Result<Json<ResponseEnvelope<AccountDto>>, ApiError> {
    let account = load_account(&state, &id).await?;
    authorize(&state, &ctx, Operation::CloseAccount, &account.owner).await?;

    let disposition = match body.disposition.as_str() {
        "transfer" => {
            let destination = body
                .destination
                .ok_or_else(|| BankError::validation("destination is required for transfer disposition"))?;
            let destination_id =
                AccountId::parse(&destination).map_err(|_| BankError::validation("invalid destination account id"))?;
            CloseDisposition::Transfer { destination: destination_id }
        }
        "donate" => CloseDisposition::Donate,
        other => return Err(BankError::validation(format!("unknown disposition: {other}")).into()),
    };

    let closed = state.db.account_repo().close(account.id, disposition, &state.own_bank_code).await?;
    Ok(Json(ResponseEnvelope::single(closed.into(), format!("/accounts/{id}"))))
}
