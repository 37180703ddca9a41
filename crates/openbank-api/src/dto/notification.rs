use chrono::{DateTime, Utc};
use openbank_types::{Notification, NotificationKind};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationDto {
    pub id: String,
    pub client: String,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub related_request: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationDto {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id.to_string(),
            client: n.client.to_string(),
            kind: match n.kind {
                NotificationKind::ConsentRequest => "consent_request".to_string(),
            },
            title: n.title,
            message: n.message,
            related_request: n.related_request.to_string(),
            read: n.read,
            created_at: n.created_at,
        }
    }
}
