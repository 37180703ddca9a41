//! Token Service (§2, §4.6, §6): issues and verifies the three bearer
//! token classes.
//!
//! Grounded on `openibank-auth::jwt::JwtService` — same shape (an
//! `EncodingKey`/`DecodingKey` pair derived from one HMAC secret, an
//! in-memory revocation set), trimmed of the refresh-token-pair/rotation
//! machinery the teacher needs for its own session model but this spec's
//! single-token-per-class design does not (§1 Non-goals treats JWT
//! cryptography as a signing oracle; there is no refresh flow named
//! anywhere in §4.2/§6).

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::TokenServiceConfig;
use crate::error::{AuthError, AuthResult};
use crate::types::{TokenClaims, TokenClass, VerifiedToken};

#[derive(Clone)]
pub struct TokenService {
    config: TokenServiceConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    revoked: Arc<RwLock<HashSet<String>>>,
}

impl TokenService {
    pub fn new(config: TokenServiceConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
            revoked: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Issue a bearer token for `subject` in the given class (§6).
    pub fn issue(&self, class: TokenClass, subject: &str) -> AuthResult<String> {
        let now = Utc::now();
        let lifetime = Duration::from_std(self.config.token_lifetime)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let claims = TokenClaims {
            sub: subject.to_string(),
            token_type: class,
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("failed to sign token: {e}")))
    }

    /// Verify a bearer token and return its decoded form for the
    /// Mediator to consult.
    pub async fn verify(&self, token: &str) -> AuthResult<VerifiedToken> {
        let claims = self.decode(token)?;
        if self.is_revoked(&claims.jti).await {
            return Err(AuthError::TokenRevoked);
        }
        Ok(claims.into())
    }

    pub async fn revoke(&self, jti: &str) {
        self.revoked.write().await.insert(jti.to_string());
    }

    pub async fn is_revoked(&self, jti: &str) -> bool {
        self.revoked.read().await.contains(jti)
    }

    fn decode(&self, token: &str) -> AuthResult<TokenClaims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);
        validation.validate_exp = true;

        let data = decode::<TokenClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> TokenServiceConfig {
        TokenServiceConfig {
            secret: "test-secret-key-at-least-32-bytes-long!!".to_string(),
            token_lifetime: std::time::Duration::from_secs(24 * 60 * 60),
            issuer: "vbank".to_string(),
            audience: "vbank-api".to_string(),
        }
    }

    #[tokio::test]
    async fn issues_and_verifies_a_client_token() {
        let svc = TokenService::new(test_config());
        let token = svc.issue(TokenClass::Client, "demo-1").unwrap();
        let verified = svc.verify(&token).await.unwrap();
        assert_eq!(verified.class, TokenClass::Client);
        assert_eq!(verified.subject, "demo-1");
    }

    #[tokio::test]
    async fn revoked_token_is_rejected() {
        let svc = TokenService::new(test_config());
        let token = svc.issue(TokenClass::Institution, "team200").unwrap();
        let verified = svc.verify(&token).await.unwrap();
        svc.revoke(&verified.jti).await;
        let result = svc.verify(&token).await;
        assert_eq!(result.unwrap_err(), AuthError::TokenRevoked);
    }

    #[tokio::test]
    async fn malformed_token_is_rejected() {
        let svc = TokenService::new(test_config());
        let result = svc.verify("not-a-jwt").await;
        assert!(result.is_err());
    }
}
