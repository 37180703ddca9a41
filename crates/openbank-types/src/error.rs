//! The bank's error taxonomy (§7).
//!
//! One `thiserror` enum carries every kind named in §7 (Authentication,
//! Authorization, Validation, Resource, State, Invariant, Infrastructure).
//! `error_code()` exposes the stable wire codes of §6; `status_code()`
//! maps each variant to its HTTP class, mirroring
//! `openibank-auth::error::AuthError`'s `status_code()`/`error_code()`
//! pair rather than `openibank-types::error::OpeniBankError`'s simpler
//! single-code scheme.

use thiserror::Error;

pub type BankResult<T> = Result<T, BankError>;

#[derive(Debug, Error, Clone)]
pub enum BankError {
    // --- Authentication (401) ---
    #[error("missing bearer token")]
    MissingToken,
    #[error("malformed bearer token")]
    MalformedToken,
    #[error("token expired")]
    TokenExpired,
    #[error("token revoked")]
    TokenRevoked,

    // --- Authorization (403) ---
    #[error("consent required: {hint}")]
    ConsentRequired { hint: String },
    #[error("consent is not valid for this operation")]
    InvalidConsent,
    #[error("consent does not match the requested operation: {0}")]
    ConsentMismatch(String),
    #[error("operation forbidden for this caller")]
    Forbidden,

    // --- Validation (400) ---
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("requested scope is empty or inconsistent")]
    InvalidScope,

    // --- Resource (404) ---
    #[error("client not found")]
    ClientNotFound,
    #[error("account not found")]
    AccountNotFound,
    #[error("source account not found")]
    SourceNotFound,
    #[error("card not found")]
    CardNotFound,
    #[error("consent not found")]
    ConsentNotFound,
    #[error("consent request not found")]
    ConsentRequestNotFound,
    #[error("payment not found")]
    PaymentNotFound,
    #[error("product not found")]
    ProductNotFound,
    #[error("product agreement not found")]
    ProductAgreementNotFound,
    #[error("unknown grantor")]
    UnknownGrantor,

    // --- State (400/409) ---
    #[error("invalid status transition: {0}")]
    InvalidStatusTransition(String),
    #[error("account is closed")]
    AccountClosed,
    #[error("consent already consumed")]
    ConsentAlreadyConsumed,

    // --- Invariant (400) ---
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("insufficient bank capital for this operation")]
    InsufficientCapital,
    #[error("VRP guard exceeded: {0}")]
    VrpLimitExceeded(String),

    // --- Infrastructure (5xx) ---
    #[error("storage error: {0}")]
    Storage(String),
    #[error("request deadline exceeded")]
    DeadlineExceeded,
    #[error("internal error: {0}")]
    Internal(String),
}

impl BankError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Stable wire code, per §6's "Error envelope".
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingToken | Self::MalformedToken | Self::TokenExpired | Self::TokenRevoked => {
                "UNAUTHENTICATED"
            }
            Self::ConsentRequired { .. } => "CONSENT_REQUIRED",
            Self::InvalidConsent => "INVALID_CONSENT",
            Self::ConsentMismatch(_) => "CONSENT_MISMATCH",
            Self::Forbidden => "FORBIDDEN",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidScope => "INVALID_SCOPE",
            Self::ClientNotFound => "CLIENT_NOT_FOUND",
            Self::AccountNotFound => "ACCOUNT_NOT_FOUND",
            Self::SourceNotFound => "SOURCE_NOT_FOUND",
            Self::CardNotFound => "CARD_NOT_FOUND",
            Self::ConsentNotFound => "CONSENT_NOT_FOUND",
            Self::ConsentRequestNotFound => "CONSENT_REQUEST_NOT_FOUND",
            Self::PaymentNotFound => "PAYMENT_NOT_FOUND",
            Self::ProductNotFound => "PRODUCT_NOT_FOUND",
            Self::ProductAgreementNotFound => "PRODUCT_AGREEMENT_NOT_FOUND",
            Self::UnknownGrantor => "UNKNOWN_GRANTOR",
            Self::InvalidStatusTransition(_) => "INVALID_STATUS_TRANSITION",
            Self::AccountClosed => "ACCOUNT_CLOSED",
            Self::ConsentAlreadyConsumed => "INVALID_CONSENT",
            Self::InsufficientFunds => "INSUFFICIENT_FUNDS",
            Self::InsufficientCapital => "INSUFFICIENT_CAPITAL",
            Self::VrpLimitExceeded(_) => "INVALID_CONSENT",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status class for this error, per §7.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingToken | Self::MalformedToken | Self::TokenExpired | Self::TokenRevoked => 401,
            Self::ConsentRequired { .. } | Self::Forbidden => 403,
            Self::Validation(_) | Self::InvalidScope | Self::InsufficientFunds | Self::InsufficientCapital => 400,
            Self::ClientNotFound
            | Self::AccountNotFound
            | Self::SourceNotFound
            | Self::CardNotFound
            | Self::ConsentNotFound
            | Self::ConsentRequestNotFound
            | Self::PaymentNotFound
            | Self::ProductNotFound
            | Self::ProductAgreementNotFound
            | Self::UnknownGrantor => 404,
            Self::InvalidConsent | Self::ConsentMismatch(_) | Self::VrpLimitExceeded(_) => 409,
            Self::InvalidStatusTransition(_) | Self::AccountClosed | Self::ConsentAlreadyConsumed => 409,
            Self::DeadlineExceeded => 504,
            Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    /// Optional hint text for the error envelope's `hint` field (§6).
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::ConsentRequired { hint } => Some(hint.clone()),
            _ => None,
        }
    }

    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::DeadlineExceeded | Self::Storage(_))
    }
}
