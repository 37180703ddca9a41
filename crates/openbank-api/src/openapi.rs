//! OpenAPI document (ambient tooling; spec.md treats the exact shape as
//! a non-conformance-target convenience for exploring the sandbox).

use utoipa::OpenApi;

use crate::dto::account::{AccountDto, TransactionDto, TransactionPageDto};
use crate::dto::card::CardDto;
use crate::dto::consent::{ConsentDto, ConsentRequestDto};
use crate::dto::money::MoneyDto;
use crate::dto::notification::NotificationDto;
use crate::dto::payment::{PaymentDestinationDto, PaymentDto};
use crate::dto::product::{ProductAgreementDto, ProductDto};
use crate::dto::token::IssuedTokenResponse;
use crate::dto::{Links, Meta};
use crate::error::ApiError;

#[derive(OpenApi)]
#[openapi(
    info(title = "OpenBank Sandbox API", description = "Consent & Authorization Core and Inter-Bank Payment Engine"),
    components(schemas(
        AccountDto,
        TransactionDto,
        TransactionPageDto,
        CardDto,
        ConsentDto,
        ConsentRequestDto,
        MoneyDto,
        NotificationDto,
        PaymentDto,
        PaymentDestinationDto,
        ProductDto,
        ProductAgreementDto,
        IssuedTokenResponse,
        Links,
        Meta,
        ApiError,
    ))
)]
pub struct ApiDoc;
