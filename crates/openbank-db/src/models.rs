//! Database models - mapped from PostgreSQL tables.
//!
//! Grounded on `openibank-db::models` (flat `Db*` structs deriving
//! `sqlx::FromRow`, status/kind columns as `String`, money columns as
//! `Decimal`). Each model carries a `to_domain`/`from_domain` pair
//! converting to and from the strongly-typed structs in `openbank-types`
//! at the repo boundary, so no raw `Uuid`/`String`/`Decimal` column
//! leaks past the repos module.

use chrono::{DateTime, Utc};
use openbank_types::{
    Account, AccountId, AccountStatus, AccountType, BankCapital, Card, CardId, CardStatus,
    CardType, Client, ClientId, ClientSegment, Consent, ConsentId, ConsentRequest,
    ConsentRequestId, ConsentRequestStatus, ConsentScope, ConsentStatus, Currency,
    InstitutionId, InterbankTransfer, Merchant, MerchantId, Money, Notification, NotificationId,
    NotificationKind, Payment, PaymentDestination, PaymentId, PaymentStatus, Product,
    ProductAgreement, ProductAgreementId, ProductAgreementStatus, ProductId, ProductKind,
    Transaction, TransactionDirection, TransactionId, TransferDirection, TransferStatus,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

fn parse_currency(code: &str) -> DbResult<Currency> {
    Currency::parse(code).ok_or_else(|| DbError::InvalidInput(format!("unknown currency: {code}")))
}

fn money_from(cents_or_decimal: Decimal, currency: &str) -> DbResult<Money> {
    Money::from_decimal(cents_or_decimal, parse_currency(currency)?)
        .map_err(|e| DbError::InvalidInput(e.to_string()))
}

// ============================================================================
// Client
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbClient {
    pub id: String,
    pub display_name: String,
    pub segment: String,
    pub birth_year: Option<i32>,
    pub declared_income_cents: Option<i64>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl DbClient {
    pub fn to_domain(&self) -> DbResult<Client> {
        let segment = match self.segment.as_str() {
            "retail" => ClientSegment::Retail,
            "premium" => ClientSegment::Premium,
            "business" => ClientSegment::Business,
            other => return Err(DbError::InvalidInput(format!("unknown client segment: {other}"))),
        };
        Ok(Client {
            id: ClientId::new(self.id.clone()),
            display_name: self.display_name.clone(),
            segment,
            birth_year: self.birth_year,
            declared_income: self.declared_income_cents,
            active: self.active,
            created_at: self.created_at,
        })
    }

    pub fn from_domain(client: &Client) -> Self {
        let segment = match client.segment {
            ClientSegment::Retail => "retail",
            ClientSegment::Premium => "premium",
            ClientSegment::Business => "business",
        };
        Self {
            id: client.id.as_str().to_string(),
            display_name: client.display_name.clone(),
            segment: segment.to_string(),
            birth_year: client.birth_year,
            declared_income_cents: client.declared_income,
            active: client.active,
            created_at: client.created_at,
        }
    }
}

// ============================================================================
// Account
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbAccount {
    pub id: Uuid,
    pub account_number: String,
    pub client_id: String,
    pub account_type: String,
    pub balance: Decimal,
    pub currency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl DbAccount {
    pub fn to_domain(&self) -> DbResult<Account> {
        let account_type = AccountType::parse(&self.account_type)
            .ok_or_else(|| DbError::InvalidInput(format!("unknown account type: {}", self.account_type)))?;
        let status = match self.status.as_str() {
            "active" => AccountStatus::Active,
            "closed" => AccountStatus::Closed,
            other => return Err(DbError::InvalidInput(format!("unknown account status: {other}"))),
        };
        Ok(Account {
            id: AccountId::from_uuid(self.id),
            owner: ClientId::new(self.client_id.clone()),
            account_number: self.account_number.clone(),
            account_type,
            balance: money_from(self.balance, &self.currency)?,
            status,
            created_at: self.created_at,
        })
    }
}

// ============================================================================
// Transaction
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbTransaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub external_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub direction: String,
    pub counterparty_label: String,
    pub description: String,
    pub merchant_id: Option<Uuid>,
    pub card_id: Option<Uuid>,
    pub value_date: DateTime<Utc>,
}

impl DbTransaction {
    pub fn to_domain(&self) -> DbResult<Transaction> {
        let direction = match self.direction.as_str() {
            "credit" => TransactionDirection::Credit,
            "debit" => TransactionDirection::Debit,
            other => return Err(DbError::InvalidInput(format!("unknown direction: {other}"))),
        };
        Ok(Transaction {
            id: TransactionId::from_uuid(self.id),
            account: AccountId::from_uuid(self.account_id),
            external_id: self.external_id.clone(),
            amount: money_from(self.amount, &self.currency)?,
            direction,
            counterparty_label: self.counterparty_label.clone(),
            description: self.description.clone(),
            merchant: self.merchant_id.map(MerchantId::from_uuid),
            card: self.card_id.map(CardId::from_uuid),
            value_date: self.value_date,
        })
    }
}

// ============================================================================
// Card
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbCard {
    pub id: Uuid,
    pub account_id: Uuid,
    pub number: String,
    pub card_type: String,
    pub holder_name: String,
    pub expiry: DateTime<Utc>,
    pub daily_limit: Option<Decimal>,
    pub monthly_limit: Option<Decimal>,
    pub currency: String,
    pub status: String,
}

impl DbCard {
    pub fn to_domain(&self) -> DbResult<Card> {
        let card_type = match self.card_type.as_str() {
            "debit" => CardType::Debit,
            "credit" => CardType::Credit,
            other => return Err(DbError::InvalidInput(format!("unknown card type: {other}"))),
        };
        let status = match self.status.as_str() {
            "active" => CardStatus::Active,
            "blocked" => CardStatus::Blocked,
            "expired" => CardStatus::Expired,
            other => return Err(DbError::InvalidInput(format!("unknown card status: {other}"))),
        };
        Ok(Card {
            id: CardId::from_uuid(self.id),
            account: AccountId::from_uuid(self.account_id),
            number: self.number.clone(),
            card_type,
            holder_name: self.holder_name.clone(),
            expiry: self.expiry,
            daily_limit: self
                .daily_limit
                .map(|d| money_from(d, &self.currency))
                .transpose()?,
            monthly_limit: self
                .monthly_limit
                .map(|d| money_from(d, &self.currency))
                .transpose()?,
            status,
        })
    }
}

// ============================================================================
// Consent & Consent Request
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbConsent {
    pub id: Uuid,
    pub request_id: Uuid,
    pub grantor: String,
    pub grantee: String,
    pub status: String,
    pub kind: String,
    pub scope: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub status_updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl DbConsent {
    pub fn to_domain(&self) -> DbResult<Consent> {
        let status = parse_consent_status(&self.status)?;
        let scope: ConsentScope = serde_json::from_value(self.scope.clone())?;
        Ok(Consent {
            id: ConsentId::from_uuid(self.id),
            request_id: ConsentRequestId::from_uuid(self.request_id),
            grantor: ClientId::new(self.grantor.clone()),
            grantee: InstitutionId::new(self.grantee.clone()),
            status,
            scope,
            created_at: self.created_at,
            status_updated_at: self.status_updated_at,
            expires_at: self.expires_at,
            last_accessed_at: self.last_accessed_at,
        })
    }

    pub fn from_domain(consent: &Consent) -> DbResult<Self> {
        Ok(Self {
            id: *consent.id.as_uuid(),
            request_id: *consent.request_id.as_uuid(),
            grantor: consent.grantor.as_str().to_string(),
            grantee: consent.grantee.as_str().to_string(),
            status: consent_status_str(consent.status).to_string(),
            kind: consent.scope.kind_name().to_string(),
            scope: serde_json::to_value(&consent.scope)?,
            created_at: consent.created_at,
            status_updated_at: consent.status_updated_at,
            expires_at: consent.expires_at,
            last_accessed_at: consent.last_accessed_at,
        })
    }
}

pub fn consent_status_str(status: ConsentStatus) -> &'static str {
    match status {
        ConsentStatus::AwaitingAuthorization => "awaiting_authorization",
        ConsentStatus::Authorized => "authorized",
        ConsentStatus::Consumed => "consumed",
        ConsentStatus::Rejected => "rejected",
        ConsentStatus::Revoked => "revoked",
        ConsentStatus::Expired => "expired",
    }
}

pub fn parse_consent_status(s: &str) -> DbResult<ConsentStatus> {
    match s {
        "awaiting_authorization" => Ok(ConsentStatus::AwaitingAuthorization),
        "authorized" => Ok(ConsentStatus::Authorized),
        "consumed" => Ok(ConsentStatus::Consumed),
        "rejected" => Ok(ConsentStatus::Rejected),
        "revoked" => Ok(ConsentStatus::Revoked),
        "expired" => Ok(ConsentStatus::Expired),
        other => Err(DbError::InvalidInput(format!("unknown consent status: {other}"))),
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbConsentRequest {
    pub id: Uuid,
    pub grantor: String,
    pub grantee: String,
    pub grantee_name: String,
    pub kind: String,
    pub scope: serde_json::Value,
    pub reason: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl DbConsentRequest {
    pub fn to_domain(&self) -> DbResult<ConsentRequest> {
        let scope: ConsentScope = serde_json::from_value(self.scope.clone())?;
        let status = match self.status.as_str() {
            "pending" => ConsentRequestStatus::Pending,
            "approved" => ConsentRequestStatus::Approved,
            "rejected" => ConsentRequestStatus::Rejected,
            other => return Err(DbError::InvalidInput(format!("unknown request status: {other}"))),
        };
        Ok(ConsentRequest {
            id: ConsentRequestId::from_uuid(self.id),
            grantor: ClientId::new(self.grantor.clone()),
            grantee: InstitutionId::new(self.grantee.clone()),
            grantee_name: self.grantee_name.clone(),
            scope,
            reason: self.reason.clone(),
            status,
            created_at: self.created_at,
            responded_at: self.responded_at,
        })
    }
}

// ============================================================================
// Payment & Inter-bank Transfer
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbPayment {
    pub id: Uuid,
    pub source_account_id: Uuid,
    pub destination_account_id: Option<Uuid>,
    pub destination_external_number: Option<String>,
    pub destination_bank_code: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
    pub status: String,
    pub consent_id: Option<Uuid>,
    pub vrp_consent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl DbPayment {
    pub fn to_domain(&self) -> DbResult<Payment> {
        let status = match self.status.as_str() {
            "pending" => PaymentStatus::Pending,
            "completed" => PaymentStatus::Completed,
            "failed" => PaymentStatus::Failed,
            other => return Err(DbError::InvalidInput(format!("unknown payment status: {other}"))),
        };
        let destination = match self.destination_account_id {
            Some(id) => PaymentDestination::Local(AccountId::from_uuid(id)),
            None => PaymentDestination::External {
                account_number: self
                    .destination_external_number
                    .clone()
                    .ok_or_else(|| DbError::InvalidInput("missing external account number".into()))?,
                bank_code: self
                    .destination_bank_code
                    .clone()
                    .ok_or_else(|| DbError::InvalidInput("missing destination bank code".into()))?,
            },
        };
        Ok(Payment {
            id: PaymentId::from_uuid(self.id),
            source_account: AccountId::from_uuid(self.source_account_id),
            destination,
            amount: money_from(self.amount, &self.currency)?,
            description: self.description.clone(),
            status,
            consent_id: self.consent_id.map(ConsentId::from_uuid),
            vrp_consent_id: self.vrp_consent_id.map(ConsentId::from_uuid),
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbInterbankTransfer {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub direction: String,
    pub counterparty_bank_code: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl DbInterbankTransfer {
    pub fn to_domain(&self) -> DbResult<InterbankTransfer> {
        let direction = match self.direction.as_str() {
            "outbound" => TransferDirection::Outbound,
            "inbound" => TransferDirection::Inbound,
            other => return Err(DbError::InvalidInput(format!("unknown transfer direction: {other}"))),
        };
        let status = match self.status.as_str() {
            "processing" => TransferStatus::Processing,
            "completed" => TransferStatus::Completed,
            other => return Err(DbError::InvalidInput(format!("unknown transfer status: {other}"))),
        };
        Ok(InterbankTransfer {
            id: TransferId::from_uuid(self.id),
            payment_id: PaymentId::from_uuid(self.payment_id),
            direction,
            counterparty_bank_code: self.counterparty_bank_code.clone(),
            amount: money_from(self.amount, &self.currency)?,
            status,
            created_at: self.created_at,
        })
    }
}

// ============================================================================
// Product & Product Agreement
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbProduct {
    pub id: Uuid,
    pub kind: String,
    pub name: String,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub currency: String,
}

impl DbProduct {
    pub fn to_domain(&self) -> DbResult<Product> {
        let kind = ProductKind::parse(&self.kind)
            .ok_or_else(|| DbError::InvalidInput(format!("unknown product kind: {}", self.kind)))?;
        Ok(Product {
            id: ProductId::from_uuid(self.id),
            kind,
            name: self.name.clone(),
            min_amount: money_from(self.min_amount, &self.currency)?,
            max_amount: money_from(self.max_amount, &self.currency)?,
        })
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbProductAgreement {
    pub id: Uuid,
    pub client_id: String,
    pub product_id: Uuid,
    pub account_id: Uuid,
    pub principal: Decimal,
    pub currency: String,
    pub status: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl DbProductAgreement {
    pub fn to_domain(&self) -> DbResult<ProductAgreement> {
        let status = match self.status.as_str() {
            "active" => ProductAgreementStatus::Active,
            "closed" => ProductAgreementStatus::Closed,
            "defaulted" => ProductAgreementStatus::Defaulted,
            other => return Err(DbError::InvalidInput(format!("unknown agreement status: {other}"))),
        };
        Ok(ProductAgreement {
            id: ProductAgreementId::from_uuid(self.id),
            client: ClientId::new(self.client_id.clone()),
            product: ProductId::from_uuid(self.product_id),
            account: AccountId::from_uuid(self.account_id),
            principal: money_from(self.principal, &self.currency)?,
            status,
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }
}

// ============================================================================
// Bank Capital
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbBankCapital {
    pub bank_code: String,
    pub capital: Decimal,
    pub initial_capital: Decimal,
    pub total_deposits: Decimal,
    pub total_loans: Decimal,
    pub currency: String,
}

impl DbBankCapital {
    pub fn to_domain(&self) -> DbResult<BankCapital> {
        Ok(BankCapital {
            bank_code: self.bank_code.clone(),
            capital: money_from(self.capital, &self.currency)?,
            initial_capital: money_from(self.initial_capital, &self.currency)?,
            total_deposits: money_from(self.total_deposits, &self.currency)?,
            total_loans: money_from(self.total_loans, &self.currency)?,
        })
    }
}

// ============================================================================
// Notification & Merchant
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbNotification {
    pub id: Uuid,
    pub client_id: String,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub related_request_id: Uuid,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl DbNotification {
    pub fn to_domain(&self) -> DbResult<Notification> {
        let kind = match self.kind.as_str() {
            "consent_request" => NotificationKind::ConsentRequest,
            other => return Err(DbError::InvalidInput(format!("unknown notification kind: {other}"))),
        };
        Ok(Notification {
            id: NotificationId::from_uuid(self.id),
            client: ClientId::new(self.client_id.clone()),
            kind,
            title: self.title.clone(),
            message: self.message.clone(),
            related_request: ConsentRequestId::from_uuid(self.related_request_id),
            read: self.read,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbMerchant {
    pub id: Uuid,
    pub name: String,
    pub mcc_code: String,
    pub category: String,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl DbMerchant {
    pub fn to_domain(&self) -> DbResult<Merchant> {
        Ok(Merchant {
            id: MerchantId::from_uuid(self.id),
            name: self.name.clone(),
            mcc_code: self.mcc_code.clone(),
            category: self.category.clone(),
            city: self.city.clone(),
            country: self.country.clone(),
        })
    }
}

// ============================================================================
// Bank Settings (auto-approval flags, §4.1)
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbBankSettings {
    pub bank_code: String,
    pub auto_approve_account_access: bool,
    pub auto_approve_payment: bool,
    pub auto_approve_product_agreement: bool,
    pub auto_approve_vrp: bool,
    pub auto_approve_offer: bool,
}
