//! Payment (§3, §4.3): a single-shot or VRP money movement, local or
//! inter-bank.

use crate::identity::{AccountId, ConsentId, PaymentId, TransferId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// Local reference, or an external account number + bank code for an
/// inter-bank leg (§3 "destination account").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PaymentDestination {
    Local(AccountId),
    External { account_number: String, bank_code: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub source_account: AccountId,
    pub destination: PaymentDestination,
    pub amount: Money,
    pub description: String,
    pub status: PaymentStatus,
    pub consent_id: Option<ConsentId>,
    pub vrp_consent_id: Option<ConsentId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferDirection {
    Outbound,
    Inbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    Processing,
    Completed,
}

/// An inter-bank capital transfer record (§4.3 "Inter-bank"). Modeled as
/// a capital transfer rather than a clearing protocol; the other bank is
/// an external collaborator behind a `settle(...)` call this type does
/// not define.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterbankTransfer {
    pub id: TransferId,
    pub payment_id: PaymentId,
    pub direction: TransferDirection,
    pub counterparty_bank_code: String,
    pub amount: Money,
    pub status: TransferStatus,
    pub created_at: DateTime<Utc>,
}
