//! Account and its immutable transaction log (§3, §4.4).

use crate::error::{BankError, BankResult};
use crate::identity::{AccountId, ClientId, MerchantId, TransactionId};
use crate::money::Money;
use crate::Currency;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    Checking,
    Savings,
    Deposit,
    Card,
    Loan,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Savings => "savings",
            Self::Deposit => "deposit",
            Self::Card => "card",
            Self::Loan => "loan",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "checking" => Some(Self::Checking),
            "savings" => Some(Self::Savings),
            "deposit" => Some(Self::Deposit),
            "card" => Some(Self::Card),
            "loan" => Some(Self::Loan),
            _ => None,
        }
    }

    /// Loan accounts carry outstanding principal as a positive balance and
    /// are exempt from the non-negative-balance invariant's usual
    /// direction (they start positive and trend to zero); every other
    /// type must stay non-negative (§3).
    pub fn allows_negative_balance(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    Active,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub owner: ClientId,
    pub account_number: String,
    pub account_type: AccountType,
    pub balance: Money,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn currency(&self) -> Currency {
        self.balance.currency()
    }

    pub fn ensure_active(&self) -> BankResult<()> {
        if self.status != AccountStatus::Active {
            return Err(BankError::AccountClosed);
        }
        Ok(())
    }

    /// §3 invariant: balance never goes negative outside an open
    /// transaction, for every account type including `loan` (loans are
    /// opened at a positive principal and only repaid down to zero, never
    /// overdrawn).
    pub fn would_underflow(&self, debit: &Money) -> bool {
        debit.cents() > self.balance.cents()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionDirection {
    Credit,
    Debit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub account: AccountId,
    pub external_id: String,
    pub amount: Money,
    pub direction: TransactionDirection,
    pub counterparty_label: String,
    pub description: String,
    pub merchant: Option<MerchantId>,
    pub card: Option<crate::identity::CardId>,
    pub value_date: DateTime<Utc>,
}

/// A page of transaction history (§4.4 "Paging of history").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionPage {
    pub items: Vec<Transaction>,
    pub total_count: i64,
    pub page: u32,
    pub limit: u32,
}

impl TransactionPage {
    pub fn total_pages(&self) -> u32 {
        if self.limit == 0 {
            return 0;
        }
        ((self.total_count as f64) / (self.limit as f64)).ceil() as u32
    }

    pub fn next_page(&self) -> Option<u32> {
        if self.page < self.total_pages() {
            Some(self.page + 1)
        } else {
            None
        }
    }

    pub fn prev_page(&self) -> Option<u32> {
        if self.page > 1 {
            Some(self.page - 1)
        } else {
            None
        }
    }
}

/// Coerces raw paging input per §8 "Boundary behaviors": `limit=0` becomes
/// the default, `limit>500` is capped, `page<1` becomes `1`.
pub fn coerce_paging(page: i64, limit: i64, default_limit: u32, max_limit: u32) -> (u32, u32) {
    let page = if page < 1 { 1 } else { page as u32 };
    let limit = if limit <= 0 {
        default_limit
    } else if limit as u32 > max_limit {
        max_limit
    } else {
        limit as u32
    };
    (page, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_coerces_boundary_values() {
        assert_eq!(coerce_paging(0, 0, 50, 500), (1, 50));
        assert_eq!(coerce_paging(-5, 9000, 50, 500), (1, 500));
        assert_eq!(coerce_paging(3, 20, 50, 500), (3, 20));
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = TransactionPage {
            items: vec![],
            total_count: 101,
            page: 1,
            limit: 50,
        };
        assert_eq!(page.total_pages(), 3);
        assert_eq!(page.next_page(), Some(2));
        assert_eq!(page.prev_page(), None);
    }
}
