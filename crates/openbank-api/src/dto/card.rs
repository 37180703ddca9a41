use chrono::{DateTime, Utc};
use openbank_types::{Card, CardStatus, CardType};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::money::MoneyDto;

#[derive(Debug, Deserialize, ToSchema)]
pub struct IssueCardRequest {
    pub account_id: String,
    pub card_type: String,
    pub holder_name: String,
    #[serde(default)]
    pub daily_limit: Option<MoneyDto>,
    #[serde(default)]
    pub monthly_limit: Option<MoneyDto>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCardStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CardDto {
    pub id: String,
    pub account: String,
    /// Masked PAN — the full number never leaves the storage layer.
    pub number: String,
    pub card_type: String,
    pub holder_name: String,
    pub expiry: DateTime<Utc>,
    pub daily_limit: Option<MoneyDto>,
    pub monthly_limit: Option<MoneyDto>,
    pub status: String,
}

impl From<Card> for CardDto {
    fn from(c: Card) -> Self {
        Self {
            id: c.id.to_string(),
            account: c.account.to_string(),
            number: c.masked(),
            card_type: match c.card_type {
                CardType::Debit => "debit".to_string(),
                CardType::Credit => "credit".to_string(),
            },
            holder_name: c.holder_name,
            expiry: c.expiry,
            daily_limit: c.daily_limit.map(MoneyDto::from_domain),
            monthly_limit: c.monthly_limit.map(MoneyDto::from_domain),
            status: match c.status {
                CardStatus::Active => "active".to_string(),
                CardStatus::Blocked => "blocked".to_string(),
                CardStatus::Expired => "expired".to_string(),
            },
        }
    }
}

pub fn parse_card_type(s: &str) -> Option<CardType> {
    match s {
        "debit" => Some(CardType::Debit),
        "credit" => Some(CardType::Credit),
        _ => None,
    }
}

pub fn parse_card_status(s: &str) -> Option<CardStatus> {
    match s {
        "active" => Some(CardStatus::Active),
        "blocked" => Some(CardStatus::Blocked),
        "expired" => Some(CardStatus::Expired),
        _ => None,
    }
}
