//! Identity types for OpenBank
//!
//! Resource identifiers are strongly typed wrappers to prevent accidental
//! mixing of different ID kinds. Most are internally generated, prefixed
//! UUIDs. `ClientId` and `InstitutionId` are the exception: both are
//! externally supplied stable strings (`person_id`, institution code), not
//! UUIDs the bank mints itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Macro to generate prefixed-UUID ID types with common implementations.
macro_rules! define_id_type {
    ($name:ident, $prefix:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Parse from a string (with or without prefix).
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                let s = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }

            /// Get the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Convert to the external, prefixed string form.
            pub fn to_prefixed_string(&self) -> String {
                format!("{}-{}", $prefix, self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }
    };
}

define_id_type!(AccountId, "acc", "Unique identifier for an account");
define_id_type!(TransactionId, "tx", "Unique identifier for a ledger transaction");
define_id_type!(CardId, "card", "Unique identifier for a card");
define_id_type!(ConsentId, "consent", "Unique identifier for an authorized consent");
define_id_type!(ConsentRequestId, "req", "Unique identifier for a consent request");
define_id_type!(PaymentId, "pay", "Unique identifier for a payment");
define_id_type!(TransferId, "xfer", "Unique identifier for an inter-bank transfer leg");
define_id_type!(ProductId, "prod", "Unique identifier for a catalog product");
define_id_type!(
    ProductAgreementId,
    "agr",
    "Unique identifier for a product agreement"
);
define_id_type!(
    NotificationId,
    "notif",
    "Unique identifier for a notification"
);
define_id_type!(MerchantId, "merch", "Unique identifier for a merchant");

/// A client's stable external identifier (`person_id`). Assigned at
/// onboarding time, never reused, never replaced by an internal UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn new(person_id: impl Into<String>) -> Self {
        Self(person_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ClientId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A third-party institution's stable code, as carried in the
/// `X-Requesting-Institution` header and the institution token's `sub`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstitutionId(pub String);

impl InstitutionId {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstitutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for InstitutionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for InstitutionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_round_trips_through_prefixed_string() {
        let id = AccountId::new();
        let s = id.to_string();
        assert!(s.starts_with("acc-"));
        assert_eq!(AccountId::parse(&s).unwrap(), id);
    }

    #[test]
    fn client_id_is_a_transparent_string() {
        let id = ClientId::new("demo-1");
        assert_eq!(id.as_str(), "demo-1");
        assert_eq!(id.to_string(), "demo-1");
    }
}
