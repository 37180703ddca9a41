//! Database error taxonomy.
//!
//! Grounded on `openibank-db::error::DbError` — same variant shape,
//! same `#[from] sqlx::Error` bridge — plus a boundary conversion into
//! `openbank_types::BankError` so repo callers upstream (the Mediator,
//! the HTTP handlers) only ever see the domain error taxonomy (§7).

use openbank_types::BankError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("query error: {0}")]
    Query(#[from] sqlx::Error),

    #[error("redis error: {0}")]
    Redis(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate: {0}")]
    Duplicate(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("insufficient capital")]
    InsufficientCapital,

    #[error("vrp limit exceeded")]
    VrpLimitExceeded,
}

pub type DbResult<T> = Result<T, DbError>;

impl From<deadpool_redis::PoolError> for DbError {
    fn from(e: deadpool_redis::PoolError) -> Self {
        DbError::Redis(e.to_string())
    }
}

impl From<deadpool_redis::redis::RedisError> for DbError {
    fn from(e: deadpool_redis::redis::RedisError) -> Self {
        DbError::Redis(e.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(e: serde_json::Error) -> Self {
        DbError::Serialization(e.to_string())
    }
}

/// Maps a storage-layer failure onto the domain taxonomy a caller
/// outside this crate is allowed to see. `NotFound` is intentionally
/// generic here — callers that need a specific resource kind in the
/// error (e.g. `AccountNotFound` vs `CardNotFound`) attach it before
/// the `DbError::NotFound` reaches this conversion, by mapping the
/// `None` branch of their own lookup directly instead of routing
/// through `DbError`.
impl From<DbError> for BankError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::InsufficientBalance => BankError::InsufficientFunds,
            DbError::InsufficientCapital => BankError::InsufficientCapital,
            DbError::VrpLimitExceeded => BankError::VrpLimitExceeded("period or payment cap reached".to_string()),
            DbError::NotFound(msg) => BankError::internal(format!("not found: {msg}")),
            DbError::InvalidInput(msg) => BankError::validation(msg),
            DbError::Duplicate(msg) => BankError::validation(msg),
            other => BankError::storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_balance_maps_to_insufficient_funds() {
        let mapped: BankError = DbError::InsufficientBalance.into();
        assert_eq!(mapped.error_code(), "INSUFFICIENT_FUNDS");
    }

    #[test]
    fn vrp_limit_exceeded_maps_through() {
        let mapped: BankError = DbError::VrpLimitExceeded.into();
        assert_eq!(mapped.error_code(), "INVALID_CONSENT");
    }
}
