//! The declared operation a caller wants to perform, and the fixed
//! `permissions(op)` table from §4.2.

use openbank_types::Permission;
use std::collections::HashSet;

/// The kind of resource an operation targets. Payments carry their own
/// consent-binding check (§4.3) rather than a static permission set, so
/// they're represented here only to route the decision, not to feed
/// `permissions()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Account,
    Balance,
    Transaction,
    Card,
    Payment,
    Vrp,
    ProductAgreement,
    Product,
}

/// A declared operation: what the caller wants to do, to what kind of
/// resource. Back-office actions (staff-only) are flagged explicitly
/// rather than inferred from the HTTP verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetAccountDetail,
    GetBalance,
    GetTransactions,
    PostCard,
    GetCards,
    PostAccount,
    CloseAccount,
    InitiatePayment,
    InitiateVrpPayment,
    OpenProductAgreement,
    CloseProductAgreement,
    ReadProductAgreement,
    ListProducts,
    BackOfficeAction,
}

impl Operation {
    pub fn target_kind(&self) -> TargetKind {
        match self {
            Self::GetAccountDetail | Self::PostAccount | Self::CloseAccount => TargetKind::Account,
            Self::GetBalance => TargetKind::Balance,
            Self::GetTransactions => TargetKind::Transaction,
            Self::PostCard | Self::GetCards => TargetKind::Card,
            Self::InitiatePayment => TargetKind::Payment,
            Self::InitiateVrpPayment => TargetKind::Vrp,
            Self::OpenProductAgreement | Self::CloseProductAgreement | Self::ReadProductAgreement => {
                TargetKind::ProductAgreement
            }
            Self::ListProducts => TargetKind::Product,
            Self::BackOfficeAction => TargetKind::Account,
        }
    }

    pub fn is_back_office(&self) -> bool {
        matches!(self, Self::BackOfficeAction)
    }

    /// §4.2's fixed `permissions(op)` table. Payment/VRP operations are
    /// gated by their own consent-binding check (§4.3), not a permission
    /// set, so they map to the empty set here — `ConsentScope::satisfies`
    /// already treats non-permission-bearing scopes as vacuously
    /// satisfied, and the Payment Engine performs the real binding check.
    pub fn permissions(&self) -> HashSet<Permission> {
        let single = |p: Permission| HashSet::from([p]);
        match self {
            Self::GetAccountDetail => single(Permission::ReadAccountsDetail),
            Self::GetBalance => single(Permission::ReadBalances),
            Self::GetTransactions => single(Permission::ReadTransactionsDetail),
            Self::PostCard => single(Permission::ManageCards),
            Self::GetCards => single(Permission::ReadCards),
            Self::PostAccount | Self::CloseAccount => single(Permission::ManageAccounts),
            Self::InitiatePayment
            | Self::InitiateVrpPayment
            | Self::OpenProductAgreement
            | Self::CloseProductAgreement
            | Self::ReadProductAgreement
            | Self::ListProducts
            | Self::BackOfficeAction => HashSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_detail_maps_to_read_accounts_detail() {
        assert_eq!(
            Operation::GetAccountDetail.permissions(),
            HashSet::from([Permission::ReadAccountsDetail])
        );
    }

    #[test]
    fn close_account_requires_manage_accounts() {
        assert_eq!(
            Operation::CloseAccount.permissions(),
            HashSet::from([Permission::ManageAccounts])
        );
    }
}
