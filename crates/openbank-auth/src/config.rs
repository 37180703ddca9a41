//! Token Service configuration.
//!
//! Grounded on `openibank-auth::config::JwtConfig`, narrowed to what a
//! signing oracle needs: a secret, a lifetime, and the bank's own issuer
//! identity. The 24-hour expiry is §6's stated default for every token
//! class.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenServiceConfig {
    /// Secret key for signing tokens (HS256). Treated as a signing oracle
    /// per spec.md §1 Non-goals — this crate never rotates or derives it.
    pub secret: String,
    #[serde(with = "humantime_serde")]
    pub token_lifetime: Duration,
    /// The bank's own code, used as the `iss` claim.
    pub issuer: String,
    pub audience: String,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            token_lifetime: Duration::from_secs(24 * 60 * 60),
            issuer: "openbank".to_string(),
            audience: "openbank-api".to_string(),
        }
    }
}
