//! Notification repository (§4.1, §9): the grantor's read-only queue,
//! appended to by `ConsentRepo::request` when auto-approval is off.

use openbank_types::{BankError, BankResult, ClientId, Notification, NotificationId};
use sqlx::PgPool;

use crate::error::DbError;
use crate::models::DbNotification;

pub struct NotificationRepo {
    pool: PgPool,
}

impl NotificationRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_unread(&self, client: &ClientId) -> BankResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, DbNotification>(
            r#"
            SELECT id, client_id, kind, title, message, related_request_id, read, created_at
            FROM notifications
            WHERE client_id = $1 AND read = FALSE
            ORDER BY created_at DESC
            "#,
        )
        .bind(client.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;
        rows.into_iter().map(|r| r.to_domain().map_err(BankError::from)).collect()
    }

    pub async fn mark_read(&self, id: NotificationId, client: &ClientId) -> BankResult<Notification> {
        let row = sqlx::query_as::<_, DbNotification>(
            r#"
            UPDATE notifications SET read = TRUE
            WHERE id = $1 AND client_id = $2
            RETURNING id, client_id, kind, title, message, related_request_id, read, created_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(client.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| BankError::internal("notification not found"))?;
        row.to_domain().map_err(BankError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::client::ClientRepo;
    use crate::repos::consent::{ConsentRepo, RequestOutcome};
    use openbank_types::{ClientSegment, ConsentScope, InstitutionId, NotificationKind, Permission};

    #[sqlx::test]
    async fn request_without_auto_approve_creates_a_notification(pool: PgPool) {
        let client_repo = ClientRepo::new(pool.clone());
        let consent_repo = ConsentRepo::new(pool.clone());
        let repo = NotificationRepo::new(pool);

        let grantor = ClientId::new("demo-1");
        client_repo.create(grantor.clone(), "Demo", ClientSegment::Retail, None, None).await.unwrap();
        let grantee = InstitutionId::new("team200");

        let outcome = consent_repo
            .request(
                &grantor,
                &grantee,
                "Team 200",
                ConsentScope::AccountAccess { permissions: vec![Permission::ReadBalances] },
                "budgeting app",
                false,
            )
            .await
            .unwrap();
        assert!(matches!(outcome, RequestOutcome::AwaitingAuthorization(_)));

        let unread = repo.list_unread(&grantor).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].kind, NotificationKind::ConsentRequest);
        assert!(!unread[0].read);

        let marked = repo.mark_read(unread[0].id, &grantor).await.unwrap();
        assert!(marked.read);

        let unread_after = repo.list_unread(&grantor).await.unwrap();
        assert!(unread_after.is_empty());
    }
}
