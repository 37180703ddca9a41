//! Product catalog + Product Agreement Manager handlers (§4.5).

use axum::extract::{Path, Query, State};
use axum::Json;
use openbank_mediator::Operation;
use openbank_types::{AccountId, BankError, ClientId, ProductAgreementId, ProductId};
use serde::Deserialize;

use crate::dto::product::{
    parse_product_kind, CloseProductAgreementRequest, CreateProductRequest, OpenProductAgreementRequest,
    ProductAgreementDto, ProductDto,
};
use crate::dto::ResponseEnvelope;
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

pub async fn list_products(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> Result<Json<ResponseEnvelope<Vec<ProductDto>>>, ApiError> {
    authorize(&state, &ctx, Operation::ListProducts, &ClientId::new(ctx.token.subject.clone())).await?;
    let products = state.db.product_repo().list().await?;
    let data = products.into_iter().map(ProductDto::from).collect();
    Ok(Json(ResponseEnvelope::single(data, "/products")))
}

pub async fn open_agreement(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<ClientIdQuery>,
    Json(body): Json<OpenProductAgreementRequest>,
) -> Result<Json<ResponseEnvelope<ProductAgreementDto>>, ApiError> {
    let subject = resolve_subject(&ctx, &query.client_id);
    authorize(&state, &ctx, Operation::OpenProductAgreement, &subject).await?;

    let product_id = ProductId::parse(&body.product_id).map_err(|_| BankError::validation("invalid product_id"))?;
    let product = state.db.product_repo().find_by_id(product_id).await?;
    let principal = body.principal.into_domain()?;
    let source_account = body
        .source_account
        .as_deref()
        .map(AccountId::parse)
        .transpose()
        .map_err(|_| BankError::validation("invalid source_account"))?;

    let agreement = state
        .db
        .product_agreement_repo()
        .open(&subject, &product, principal, source_account, &state.own_bank_code)
        .await?;

    let self_link = format!("/product-agreements/{}", agreement.id);
    Ok(Json(ResponseEnvelope::single(agreement.into(), self_link)))
}

pub async fn close_agreement(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(agreement_id): Path<String>,
    Json(body): Json<CloseProductAgreementRequest>,
) -> Result<Json<ResponseEnvelope<ProductAgreementDto>>, ApiError> {
    let agreement_id =
        ProductAgreementId::parse(&agreement_id).map_err(|_| BankError::validation("invalid agreement id"))?;
    let existing = state.db.product_agreement_repo().find_by_id(agreement_id).await?;
    authorize(&state, &ctx, Operation::CloseProductAgreement, &existing.client).await?;

    let repayment_source = body
        .repayment_source
        .as_deref()
        .map(AccountId::parse)
        .transpose()
        .map_err(|_| BankError::validation("invalid repayment_source"))?;

    let agreement = state
        .db
        .product_agreement_repo()
        .close(agreement_id, repayment_source, &state.own_bank_code)
        .await?;

    let self_link = format!("/product-agreements/{}", agreement.id);
    Ok(Json(ResponseEnvelope::single(agreement.into(), self_link)))
}

pub async fn get_agreement(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(agreement_id): Path<String>,
) -> Result<Json<ResponseEnvelope<ProductAgreementDto>>, ApiError> {
    let agreement_id =
        ProductAgreementId::parse(&agreement_id).map_err(|_| BankError::validation("invalid agreement id"))?;
    let agreement = state.db.product_agreement_repo().find_by_id(agreement_id).await?;
    authorize(&state, &ctx, Operation::ReadProductAgreement, &agreement.client).await?;
    let self_link = format!("/product-agreements/{}", agreement.id);
    Ok(Json(ResponseEnvelope::single(agreement.into(), self_link)))
}

pub async fn list_agreements(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<ClientIdQuery>,
) -> Result<Json<ResponseEnvelope<Vec<ProductAgreementDto>>>, ApiError> {
    let subject = resolve_subject(&ctx, &query.client_id);
    authorize(&state, &ctx, Operation::ReadProductAgreement, &subject).await?;
    let agreements = state.db.product_agreement_repo().list_by_client(&subject).await?;
    let data = agreements.into_iter().map(ProductAgreementDto::from).collect();
    Ok(Json(ResponseEnvelope::single(data, "/product-agreements")))
}

/// Catalog maintenance is a back-office action (§4.5): no client or
/// institution can mint new products, only staff.
pub async fn create_product(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(body): Json<CreateProductRequest>,
) -> Result<Json<ResponseEnvelope<ProductDto>>, ApiError> {
    authorize(&state, &ctx, Operation::BackOfficeAction, &ClientId::new(ctx.token.subject.clone())).await?;

    let kind = parse_product_kind(&body.kind).ok_or_else(|| BankError::validation(format!("unknown product kind: {}", body.kind)))?;
    let min_amount = body.min_amount.into_domain()?;
    let max_amount = body.max_amount.into_domain()?;

    let product = state.db.product_repo().create(kind, &body.name, min_amount, max_amount).await?;
    let self_link = format!("/products/{}", product.id);
    Ok(Json(ResponseEnvelope::single(product.into(), self_link)))
}
