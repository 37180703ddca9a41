//! Token claims and the three token classes (§6).
//!
//! Grounded on `openibank-auth::types::TokenClaims`/`UserRole`, narrowed
//! from a 5-role trading-platform user model to the 3 token classes §4.2
//! actually dispatches on.

use serde::{Deserialize, Serialize};

/// `sub` semantics vary by class (§4.2):
/// - `Client`: `sub` is the client's `person_id`.
/// - `Institution`: `sub` is the institution's code.
/// - `Staff`: `sub` is the operator handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenClass {
    Client,
    Institution,
    Staff,
}

impl TokenClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Institution => "institution",
            Self::Staff => "staff",
        }
    }
}

/// JWT claims for a bearer token (§6 "a signed structure containing at
/// minimum `sub`, `type`, `iss`, `aud`, and `exp`").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(rename = "type")]
    pub token_type: TokenClass,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    /// Unique token id, used for revocation.
    pub jti: String,
}

/// A verified, decoded bearer token, ready for the Mediator to consult.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub class: TokenClass,
    pub subject: String,
    pub jti: String,
    pub expires_at_unix: i64,
}

impl From<TokenClaims> for VerifiedToken {
    fn from(claims: TokenClaims) -> Self {
        Self {
            class: claims.token_type,
            subject: claims.sub,
            jti: claims.jti,
            expires_at_unix: claims.exp,
        }
    }
}
