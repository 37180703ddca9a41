//! OpenBank Token Service — issues and verifies client, institution, and
//! staff bearer tokens (§2, §4.6, §6).

pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use config::TokenServiceConfig;
pub use error::{AuthError, AuthResult};
pub use jwt::TokenService;
pub use types::*;
