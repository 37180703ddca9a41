use chrono::{DateTime, Utc};
use openbank_types::{Account, AccountStatus, AccountType, Transaction, TransactionDirection, TransactionPage};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::money::MoneyDto;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAccountRequest {
    pub account_type: String,
    #[serde(default)]
    pub initial_balance: Option<MoneyDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountDto {
    pub id: String,
    pub owner: String,
    pub account_number: String,
    pub account_type: String,
    pub balance: MoneyDto,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountDto {
    fn from(a: Account) -> Self {
        Self {
            id: a.id.to_string(),
            owner: a.owner.to_string(),
            account_number: a.account_number,
            account_type: a.account_type.as_str().to_string(),
            balance: MoneyDto::from_domain(a.balance),
            status: match a.status {
                AccountStatus::Active => "active".to_string(),
                AccountStatus::Closed => "closed".to_string(),
            },
            created_at: a.created_at,
        }
    }
}

pub fn parse_account_type(s: &str) -> Option<AccountType> {
    AccountType::parse(s)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CloseAccountRequest {
    /// `"transfer"` (requires `destination`) or `"donate"`.
    pub disposition: String,
    #[serde(default)]
    pub destination: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionDto {
    pub id: String,
    pub account: String,
    pub external_id: String,
    pub amount: MoneyDto,
    pub direction: String,
    pub counterparty_label: String,
    pub description: String,
    pub merchant: Option<String>,
    pub card: Option<String>,
    pub value_date: DateTime<Utc>,
}

impl From<Transaction> for TransactionDto {
    fn from(t: Transaction) -> Self {
        Self {
            id: t.id.to_string(),
            account: t.account.to_string(),
            external_id: t.external_id,
            amount: MoneyDto::from_domain(t.amount),
            direction: match t.direction {
                TransactionDirection::Credit => "credit".to_string(),
                TransactionDirection::Debit => "debit".to_string(),
            },
            counterparty_label: t.counterparty_label,
            description: t.description,
            merchant: t.merchant.map(|m| m.to_string()),
            card: t.card.map(|c| c.to_string()),
            value_date: t.value_date,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionPageDto {
    pub items: Vec<TransactionDto>,
    pub total_count: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl From<TransactionPage> for TransactionPageDto {
    fn from(p: TransactionPage) -> Self {
        let total_pages = p.total_pages();
        Self {
            items: p.items.into_iter().map(TransactionDto::from).collect(),
            total_count: p.total_count,
            page: p.page,
            limit: p.limit,
            total_pages,
        }
    }
}
