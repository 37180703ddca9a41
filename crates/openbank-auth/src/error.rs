//! Token Service errors.
//!
//! Grounded on `openibank-auth::error::AuthError`'s `status_code()` /
//! `error_code()` pair, narrowed to the failure modes a signing-oracle
//! token service actually has (§6 Non-goals: "Key management and JWT
//! cryptography" are treated as a signing oracle, not re-derived here).

use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("malformed bearer token")]
    InvalidToken,
    #[error("token has expired")]
    TokenExpired,
    #[error("token has been revoked")]
    TokenRevoked,
    #[error("unexpected token class")]
    WrongTokenClass,
    #[error("internal token service error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Internal(_) => 500,
            _ => 401,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingToken => "MISSING_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenRevoked => "TOKEN_REVOKED",
            Self::WrongTokenClass => "WRONG_TOKEN_CLASS",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            _ => Self::InvalidToken,
        }
    }
}
