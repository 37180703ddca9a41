use chrono::{DateTime, Utc};
use openbank_types::{Payment, PaymentDestination, PaymentStatus};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::money::MoneyDto;

#[derive(Debug, Deserialize, ToSchema)]
pub struct InitiatePaymentRequest {
    pub from_account_number: String,
    pub to_account_number: String,
    #[serde(default)]
    pub to_bank_code: Option<String>,
    pub amount: MoneyDto,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InitiateVrpPaymentRequest {
    pub to_account_number: String,
    #[serde(default)]
    pub to_bank_code: Option<String>,
    pub amount: MoneyDto,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentDestinationDto {
    Local { account: String },
    External { account_number: String, bank_code: String },
}

impl From<PaymentDestination> for PaymentDestinationDto {
    fn from(d: PaymentDestination) -> Self {
        match d {
            PaymentDestination::Local(id) => Self::Local { account: id.to_string() },
            PaymentDestination::External { account_number, bank_code } => {
                Self::External { account_number, bank_code }
            }
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentDto {
    pub id: String,
    pub source_account: String,
    pub destination: PaymentDestinationDto,
    pub amount: MoneyDto,
    pub description: String,
    pub status: String,
    pub consent_id: Option<String>,
    pub vrp_consent_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentDto {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id.to_string(),
            source_account: p.source_account.to_string(),
            destination: p.destination.into(),
            amount: MoneyDto::from_domain(p.amount),
            description: p.description,
            status: match p.status {
                PaymentStatus::Pending => "pending".to_string(),
                PaymentStatus::Completed => "completed".to_string(),
                PaymentStatus::Failed => "failed".to_string(),
            },
            consent_id: p.consent_id.map(|c| c.to_string()),
            vrp_consent_id: p.vrp_consent_id.map(|c| c.to_string()),
            created_at: p.created_at,
        }
    }
}
