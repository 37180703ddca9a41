//! Client (§3): a natural or legal person, identified by a stable external
//! `person_id`. Never deleted, only deactivated.

use crate::identity::ClientId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientSegment {
    Retail,
    Premium,
    Business,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub display_name: String,
    pub segment: ClientSegment,
    pub birth_year: Option<i32>,
    pub declared_income: Option<i64>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}
