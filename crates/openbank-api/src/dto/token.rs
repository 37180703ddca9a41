//! Token issuance DTOs (§6 "a token is issued by a credentials check").
//! Credential verification itself is out of scope (§1 "Key management and
//! JWT cryptography are treated as a signing oracle"); these handlers
//! check only that the subject names a real, active party before minting.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct IssueClientTokenRequest {
    pub client_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct IssueInstitutionTokenRequest {
    pub institution_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IssuedTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub subject: String,
    pub expires_in: u64,
}
