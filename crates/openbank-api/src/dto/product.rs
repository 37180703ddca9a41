use chrono::{DateTime, Utc};
use openbank_types::{Product, ProductAgreement, ProductAgreementStatus, ProductKind};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::money::MoneyDto;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDto {
    pub id: String,
    pub kind: String,
    pub name: String,
    pub min_amount: MoneyDto,
    pub max_amount: MoneyDto,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        Self {
            id: p.id.to_string(),
            kind: p.kind.as_str().to_string(),
            name: p.name,
            min_amount: MoneyDto::from_domain(p.min_amount),
            max_amount: MoneyDto::from_domain(p.max_amount),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub kind: String,
    pub name: String,
    pub min_amount: MoneyDto,
    pub max_amount: MoneyDto,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OpenProductAgreementRequest {
    pub product_id: String,
    pub principal: MoneyDto,
    #[serde(default)]
    pub source_account: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CloseProductAgreementRequest {
    #[serde(default)]
    pub repayment_source: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductAgreementDto {
    pub id: String,
    pub client: String,
    pub product: String,
    pub account: String,
    pub principal: MoneyDto,
    pub status: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl From<ProductAgreement> for ProductAgreementDto {
    fn from(a: ProductAgreement) -> Self {
        Self {
            id: a.id.to_string(),
            client: a.client.to_string(),
            product: a.product.to_string(),
            account: a.account.to_string(),
            principal: MoneyDto::from_domain(a.principal),
            status: match a.status {
                ProductAgreementStatus::Active => "active".to_string(),
                ProductAgreementStatus::Closed => "closed".to_string(),
                ProductAgreementStatus::Defaulted => "defaulted".to_string(),
            },
            start_date: a.start_date,
            end_date: a.end_date,
        }
    }
}

pub fn parse_product_kind(s: &str) -> Option<ProductKind> {
    ProductKind::parse(s)
}
