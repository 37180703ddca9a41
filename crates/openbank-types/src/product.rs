//! Product catalog binding (§3, §4.5): deposit/loan/card agreements
//! producing derived accounts.

use crate::identity::{AccountId, ClientId, ProductAgreementId, ProductId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductKind {
    Deposit,
    Loan,
    Card,
    CreditCard,
}

impl ProductKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Loan => "loan",
            Self::Card => "card",
            Self::CreditCard => "credit_card",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "deposit" => Some(Self::Deposit),
            "loan" => Some(Self::Loan),
            "card" => Some(Self::Card),
            "credit_card" => Some(Self::CreditCard),
            _ => None,
        }
    }
}

/// Catalog product (thin CRUD per spec.md §1 Non-goals; the Manager only
/// reads `min_amount`/`max_amount` bounds from it before any state
/// change).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub kind: ProductKind,
    pub name: String,
    pub min_amount: Money,
    pub max_amount: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductAgreementStatus {
    Active,
    Closed,
    Defaulted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductAgreement {
    pub id: ProductAgreementId,
    pub client: ClientId,
    pub product: ProductId,
    pub account: AccountId,
    pub principal: Money,
    pub status: ProductAgreementStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}
