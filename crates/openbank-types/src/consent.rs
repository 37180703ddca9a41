//! The consent domain (§3, §4.1): a tagged union of five consent kinds
//! sharing one header and one state machine, per REDESIGN FLAGS item 2.
//!
//! Grounded on `openibank-types::permit::SpendPermit` for the
//! bounded/expiring/scoped-authorization shape (`is_valid`, `is_expired`,
//! `can_cover`), generalized from a single wallet-spend permit to five
//! distinct authorization kinds sharing one header.

use crate::error::{BankError, BankResult};
use crate::identity::{AccountId, ClientId, ConsentId, ConsentRequestId, InstitutionId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named capability within a consent's scope. Comparison against a
/// required set is subset-of, never equality (§9 "Permission sets").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    ReadAccountsDetail,
    ReadBalances,
    ReadTransactionsDetail,
    ReadCards,
    ManageCards,
    ManageAccounts,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadAccountsDetail => "ReadAccountsDetail",
            Self::ReadBalances => "ReadBalances",
            Self::ReadTransactionsDetail => "ReadTransactionsDetail",
            Self::ReadCards => "ReadCards",
            Self::ManageCards => "ManageCards",
            Self::ManageAccounts => "ManageAccounts",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ReadAccountsDetail" => Some(Self::ReadAccountsDetail),
            "ReadBalances" => Some(Self::ReadBalances),
            "ReadTransactionsDetail" => Some(Self::ReadTransactionsDetail),
            "ReadCards" => Some(Self::ReadCards),
            "ManageCards" => Some(Self::ManageCards),
            "ManageAccounts" => Some(Self::ManageAccounts),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsentStatus {
    AwaitingAuthorization,
    Authorized,
    Consumed,
    Rejected,
    Revoked,
    Expired,
}

impl ConsentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Rejected | Self::Revoked | Self::Expired | Self::Consumed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodKind {
    Day,
    Week,
    Month,
    Year,
}

impl PeriodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            _ => None,
        }
    }

    /// Calendar-aligned window of this kind containing `now`, as
    /// `[start, end)`. Used by the VRP period-sum/count guards (§4.1).
    pub fn window_containing(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        use chrono::{Datelike, Duration, TimeZone};
        match self {
            Self::Day => {
                let start = now.date_naive().and_hms_opt(0, 0, 0).unwrap();
                let start = Utc.from_utc_datetime(&start);
                (start, start + Duration::days(1))
            }
            Self::Week => {
                let weekday = now.weekday().num_days_from_monday() as i64;
                let start_date = now.date_naive() - Duration::days(weekday);
                let start = Utc.from_utc_datetime(&start_date.and_hms_opt(0, 0, 0).unwrap());
                (start, start + Duration::days(7))
            }
            Self::Month => {
                let year = now.year();
                let month = now.month();
                let start = Utc
                    .with_ymd_and_hms(year, month, 1, 0, 0, 0)
                    .single()
                    .unwrap();
                let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
                let end = Utc
                    .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
                    .single()
                    .unwrap();
                (start, end)
            }
            Self::Year => {
                let year = now.year();
                let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single().unwrap();
                let end = Utc.with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0).single().unwrap();
                (start, end)
            }
        }
    }
}

/// Kind-specific payload. The header (id, grantor, grantee, status,
/// timestamps) is shared; only the guard data differs per kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConsentScope {
    AccountAccess {
        permissions: HashSet<Permission>,
    },
    Payment {
        debtor_account: AccountId,
        creditor_account: AccountId,
        creditor_name: String,
        amount: Money,
        reference: String,
    },
    ProductAgreement {
        can_read: bool,
        can_open: bool,
        can_close: bool,
        product_type_allowlist: Option<Vec<String>>,
        cumulative_open_cap: Option<Money>,
        running_total: Money,
    },
    Vrp {
        source_account: AccountId,
        per_payment_cap: Money,
        per_period_cap: Money,
        period_kind: PeriodKind,
        max_payments_count: u32,
        valid_from: DateTime<Utc>,
        valid_to: DateTime<Utc>,
    },
    Offer {
        permissions: HashSet<Permission>,
        lead_id: Option<String>,
    },
}

impl ConsentScope {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::AccountAccess { .. } => "account_access",
            Self::Payment { .. } => "payment",
            Self::ProductAgreement { .. } => "product_agreement",
            Self::Vrp { .. } => "vrp",
            Self::Offer { .. } => "offer",
        }
    }

    /// Whether `required` is satisfied by this scope's permission set.
    /// Non-permission-bearing kinds (Payment, ProductAgreement, Vrp) never
    /// satisfy a permission check directly — they are consumed by their
    /// own dedicated guards instead (§4.1, §4.3).
    pub fn satisfies(&self, required: &HashSet<Permission>) -> bool {
        match self {
            Self::AccountAccess { permissions } | Self::Offer { permissions, .. } => {
                required.is_subset(permissions)
            }
            _ => required.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consent {
    pub id: ConsentId,
    pub request_id: ConsentRequestId,
    pub grantor: ClientId,
    pub grantee: InstitutionId,
    pub status: ConsentStatus,
    pub scope: ConsentScope,
    pub created_at: DateTime<Utc>,
    pub status_updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl Consent {
    /// Lazily-evaluated effective status: `Authorized` flips to `Expired`
    /// once `now` has passed `expires_at`, without a background sweeper
    /// (§9 "Time-driven expiry").
    pub fn effective_status(&self, now: DateTime<Utc>) -> ConsentStatus {
        if self.status == ConsentStatus::Authorized && now >= self.expires_at {
            ConsentStatus::Expired
        } else {
            self.status
        }
    }

    pub fn is_authorized(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == ConsentStatus::Authorized
    }

    /// §4.1 `check` predicate, minus the grantee/grantor/consent_id match
    /// which the registry performs against its index before loading this
    /// value.
    pub fn satisfies(&self, required: &HashSet<Permission>, now: DateTime<Utc>) -> bool {
        self.is_authorized(now) && self.scope.satisfies(required)
    }

    /// §4.1 amount binding for payment consents: exact account/currency
    /// match and `amount <= consent.amount`.
    pub fn check_payment_binding(
        &self,
        debtor: &AccountId,
        creditor: &AccountId,
        amount: &Money,
        now: DateTime<Utc>,
    ) -> BankResult<()> {
        if !self.is_authorized(now) {
            return Err(BankError::InvalidConsent);
        }
        match &self.scope {
            ConsentScope::Payment {
                debtor_account,
                creditor_account,
                amount: consent_amount,
                ..
            } => {
                if debtor_account != debtor || creditor_account != creditor {
                    return Err(BankError::ConsentMismatch("debtor/creditor mismatch".into()));
                }
                if amount.currency() != consent_amount.currency() || amount.cents() > consent_amount.cents() {
                    return Err(BankError::ConsentMismatch("amount exceeds consent".into()));
                }
                Ok(())
            }
            _ => Err(BankError::ConsentMismatch("not a payment consent".into())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsentRequestStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentRequest {
    pub id: ConsentRequestId,
    pub grantor: ClientId,
    pub grantee: InstitutionId,
    pub grantee_name: String,
    pub scope: ConsentScope,
    pub reason: String,
    pub status: ConsentRequestStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Currency;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn account_access_consent(expires_in: Duration) -> Consent {
        let now = Utc::now();
        let mut permissions = HashSet::new();
        permissions.insert(Permission::ReadAccountsDetail);
        Consent {
            id: ConsentId::new(),
            request_id: ConsentRequestId::new(),
            grantor: ClientId::new("demo-1"),
            grantee: InstitutionId::new("team200"),
            status: ConsentStatus::Authorized,
            scope: ConsentScope::AccountAccess { permissions },
            created_at: now,
            status_updated_at: now,
            expires_at: now + expires_in,
            last_accessed_at: None,
        }
    }

    #[test]
    fn expired_consent_fails_the_permission_check_at_and_after_expiry() {
        let consent = account_access_consent(Duration::seconds(-1));
        let required: HashSet<Permission> = [Permission::ReadAccountsDetail].into_iter().collect();
        assert!(!consent.satisfies(&required, Utc::now()));
        assert_eq!(consent.effective_status(Utc::now()), ConsentStatus::Expired);
    }

    #[test]
    fn permission_subset_check_is_not_equality() {
        let consent = account_access_consent(Duration::days(1));
        let required: HashSet<Permission> = HashSet::new();
        assert!(consent.satisfies(&required, Utc::now()));
    }

    #[test]
    fn payment_binding_rejects_amount_above_consent() {
        let now = Utc::now();
        let debtor = AccountId::new();
        let creditor = AccountId::new();
        let consent = Consent {
            id: ConsentId::new(),
            request_id: ConsentRequestId::new(),
            grantor: ClientId::new("demo-1"),
            grantee: InstitutionId::new("team200"),
            status: ConsentStatus::Authorized,
            scope: ConsentScope::Payment {
                debtor_account: debtor,
                creditor_account: creditor,
                creditor_name: "merchant".into(),
                amount: Money::from_major(dec!(500.00), Currency::RUB).unwrap(),
                reference: "ref".into(),
            },
            created_at: now,
            status_updated_at: now,
            expires_at: now + Duration::days(90),
            last_accessed_at: None,
        };
        let over = Money::from_major(dec!(500.01), Currency::RUB).unwrap();
        assert!(consent
            .check_payment_binding(&debtor, &creditor, &over, now)
            .is_err());
        let exact = Money::from_major(dec!(500.00), Currency::RUB).unwrap();
        assert!(consent
            .check_payment_binding(&debtor, &creditor, &exact, now)
            .is_ok());
    }
}
