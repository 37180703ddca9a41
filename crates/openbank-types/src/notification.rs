//! Notification (§4.1, §5): write-only append from the Consent Registry,
//! read-only by clients. Supplements spec.md, which only describes the
//! notification queue implicitly ("an unread notification is appended");
//! grounded on `original_source/services/consent_service.py`'s
//! `Notification` row created on manual (non-auto-approved) consent
//! requests.

use crate::identity::{ClientId, ConsentRequestId, NotificationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    ConsentRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub client: ClientId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_request: ConsentRequestId,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
