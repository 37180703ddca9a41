//! DTOs for the five consent kinds (§3, §4.1), sharing one request/response
//! shape with a `kind`-tagged `scope` payload.

use chrono::{DateTime, Utc};
use openbank_types::{
    BankError, BankResult, Consent, ConsentRequest, ConsentRequestStatus, ConsentScope, ConsentStatus,
    Permission,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;

use super::money::MoneyDto;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScopeRequestDto {
    AccountAccess {
        permissions: Vec<String>,
    },
    Payment {
        debtor_account: String,
        creditor_account: String,
        creditor_name: String,
        amount: MoneyDto,
        reference: String,
    },
    ProductAgreement {
        can_read: bool,
        can_open: bool,
        can_close: bool,
        #[serde(default)]
        product_type_allowlist: Option<Vec<String>>,
        #[serde(default)]
        cumulative_open_cap: Option<MoneyDto>,
        /// Currency `running_total` accrues in, independent of whether a
        /// cap is set.
        currency: String,
    },
    Vrp {
        source_account: String,
        per_payment_cap: MoneyDto,
        per_period_cap: MoneyDto,
        period_kind: String,
        max_payments_count: u32,
        valid_from: DateTime<Utc>,
        valid_to: DateTime<Utc>,
    },
    Offer {
        permissions: Vec<String>,
        #[serde(default)]
        lead_id: Option<String>,
    },
}

fn parse_permissions(raw: &[String]) -> BankResult<HashSet<Permission>> {
    raw.iter()
        .map(|p| Permission::parse(p).ok_or_else(|| BankError::validation(format!("unknown permission: {p}"))))
        .collect()
}

impl ScopeRequestDto {
    pub fn into_domain(self) -> BankResult<ConsentScope> {
        use openbank_types::{AccountId, PeriodKind};

        Ok(match self {
            Self::AccountAccess { permissions } => ConsentScope::AccountAccess {
                permissions: parse_permissions(&permissions)?,
            },
            Self::Payment {
                debtor_account,
                creditor_account,
                creditor_name,
                amount,
                reference,
            } => ConsentScope::Payment {
                debtor_account: AccountId::parse(&debtor_account)
                    .map_err(|_| BankError::validation("invalid debtor_account"))?,
                creditor_account: AccountId::parse(&creditor_account)
                    .map_err(|_| BankError::validation("invalid creditor_account"))?,
                creditor_name,
                amount: amount.into_domain()?,
                reference,
            },
            Self::ProductAgreement {
                can_read,
                can_open,
                can_close,
                product_type_allowlist,
                cumulative_open_cap,
                currency,
            } => {
                let currency = openbank_types::Currency::parse(&currency)
                    .ok_or_else(|| BankError::validation(format!("unknown currency code: {currency}")))?;
                ConsentScope::ProductAgreement {
                    can_read,
                    can_open,
                    can_close,
                    product_type_allowlist,
                    cumulative_open_cap: cumulative_open_cap.map(MoneyDto::into_domain).transpose()?,
                    running_total: openbank_types::Money::zero(currency),
                }
            }
            Self::Vrp {
                source_account,
                per_payment_cap,
                per_period_cap,
                period_kind,
                max_payments_count,
                valid_from,
                valid_to,
            } => ConsentScope::Vrp {
                source_account: AccountId::parse(&source_account)
                    .map_err(|_| BankError::validation("invalid source_account"))?,
                per_payment_cap: per_payment_cap.into_domain()?,
                per_period_cap: per_period_cap.into_domain()?,
                period_kind: PeriodKind::parse(&period_kind)
                    .ok_or_else(|| BankError::validation(format!("unknown period_kind: {period_kind}")))?,
                max_payments_count,
                valid_from,
                valid_to,
            },
            Self::Offer { permissions, lead_id } => ConsentScope::Offer {
                permissions: parse_permissions(&permissions)?,
                lead_id,
            },
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RequestConsentRequest {
    pub grantee: String,
    pub grantee_name: String,
    pub reason: String,
    pub scope: ScopeRequestDto,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScopeDto {
    AccountAccess {
        permissions: Vec<String>,
    },
    Payment {
        debtor_account: String,
        creditor_account: String,
        creditor_name: String,
        amount: MoneyDto,
        reference: String,
    },
    ProductAgreement {
        can_read: bool,
        can_open: bool,
        can_close: bool,
        product_type_allowlist: Option<Vec<String>>,
        cumulative_open_cap: Option<MoneyDto>,
        running_total: MoneyDto,
    },
    Vrp {
        source_account: String,
        per_payment_cap: MoneyDto,
        per_period_cap: MoneyDto,
        period_kind: String,
        max_payments_count: u32,
        valid_from: DateTime<Utc>,
        valid_to: DateTime<Utc>,
    },
    Offer {
        permissions: Vec<String>,
        lead_id: Option<String>,
    },
}

impl From<ConsentScope> for ScopeDto {
    fn from(scope: ConsentScope) -> Self {
        match scope {
            ConsentScope::AccountAccess { permissions } => Self::AccountAccess {
                permissions: permissions.iter().map(|p| p.as_str().to_string()).collect(),
            },
            ConsentScope::Payment {
                debtor_account,
                creditor_account,
                creditor_name,
                amount,
                reference,
            } => Self::Payment {
                debtor_account: debtor_account.to_string(),
                creditor_account: creditor_account.to_string(),
                creditor_name,
                amount: MoneyDto::from_domain(amount),
                reference,
            },
            ConsentScope::ProductAgreement {
                can_read,
                can_open,
                can_close,
                product_type_allowlist,
                cumulative_open_cap,
                running_total,
            } => Self::ProductAgreement {
                can_read,
                can_open,
                can_close,
                product_type_allowlist,
                cumulative_open_cap: cumulative_open_cap.map(MoneyDto::from_domain),
                running_total: MoneyDto::from_domain(running_total),
            },
            ConsentScope::Vrp {
                source_account,
                per_payment_cap,
                per_period_cap,
                period_kind,
                max_payments_count,
                valid_from,
                valid_to,
            } => Self::Vrp {
                source_account: source_account.to_string(),
                per_payment_cap: MoneyDto::from_domain(per_payment_cap),
                per_period_cap: MoneyDto::from_domain(per_period_cap),
                period_kind: period_kind.as_str().to_string(),
                max_payments_count,
                valid_from,
                valid_to,
            },
            ConsentScope::Offer { permissions, lead_id } => Self::Offer {
                permissions: permissions.iter().map(|p| p.as_str().to_string()).collect(),
                lead_id,
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConsentDto {
    pub id: String,
    pub request_id: String,
    pub grantor: String,
    pub grantee: String,
    pub status: String,
    pub scope: ScopeDto,
    pub created_at: DateTime<Utc>,
    pub status_updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

fn status_str(status: ConsentStatus) -> &'static str {
    match status {
        ConsentStatus::AwaitingAuthorization => "awaiting_authorization",
        ConsentStatus::Authorized => "authorized",
        ConsentStatus::Consumed => "consumed",
        ConsentStatus::Rejected => "rejected",
        ConsentStatus::Revoked => "revoked",
        ConsentStatus::Expired => "expired",
    }
}

impl From<Consent> for ConsentDto {
    fn from(c: Consent) -> Self {
        Self {
            id: c.id.to_string(),
            request_id: c.request_id.to_string(),
            grantor: c.grantor.to_string(),
            grantee: c.grantee.to_string(),
            status: status_str(c.status).to_string(),
            scope: c.scope.into(),
            created_at: c.created_at,
            status_updated_at: c.status_updated_at,
            expires_at: c.expires_at,
            last_accessed_at: c.last_accessed_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConsentRequestDto {
    pub id: String,
    pub grantor: String,
    pub grantee: String,
    pub grantee_name: String,
    pub scope: ScopeDto,
    pub reason: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl From<ConsentRequest> for ConsentRequestDto {
    fn from(r: ConsentRequest) -> Self {
        Self {
            id: r.id.to_string(),
            grantor: r.grantor.to_string(),
            grantee: r.grantee.to_string(),
            grantee_name: r.grantee_name,
            scope: r.scope.into(),
            reason: r.reason,
            status: match r.status {
                ConsentRequestStatus::Pending => "pending".to_string(),
                ConsentRequestStatus::Approved => "approved".to_string(),
                ConsentRequestStatus::Rejected => "rejected".to_string(),
            },
            created_at: r.created_at,
            responded_at: r.responded_at,
        }
    }
}

/// Either branch of `RequestOutcome` (§4.1), flattened for the wire.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum RequestOutcomeDto {
    AutoApproved(ConsentDto),
    AwaitingAuthorization(ConsentRequestDto),
}
