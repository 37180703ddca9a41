//! Merchant (supplemental, §3 "optional merchant and card references").
//! Grounded on `original_source/api/accounts.py`'s transaction history
//! response, which nests an optional merchant object (name, MCC code,
//! category, city, country) on each transaction.

use crate::identity::MerchantId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Merchant {
    pub id: MerchantId,
    pub name: String,
    pub mcc_code: String,
    pub category: String,
    pub city: Option<String>,
    pub country: Option<String>,
}
