//! Client repository (§3): onboarding and lookup. Clients are never
//! deleted, only deactivated.

use openbank_types::{BankError, BankResult, Client, ClientId, ClientSegment};
use sqlx::PgPool;

use crate::error::DbError;
use crate::models::DbClient;

pub struct ClientRepo {
    pool: PgPool,
}

impl ClientRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        id: ClientId,
        display_name: &str,
        segment: ClientSegment,
        birth_year: Option<i32>,
        declared_income: Option<i64>,
    ) -> BankResult<Client> {
        let segment_str = segment_str(segment);
        let row = sqlx::query_as::<_, DbClient>(
            r#"
            INSERT INTO clients (id, display_name, segment, birth_year, declared_income_cents, active)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING id, display_name, segment, birth_year, declared_income_cents, active, created_at
            "#,
        )
        .bind(id.as_str())
        .bind(display_name)
        .bind(segment_str)
        .bind(birth_year)
        .bind(declared_income)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)?;

        row.to_domain().map_err(BankError::from)
    }

    pub async fn find_by_id(&self, id: &ClientId) -> BankResult<Client> {
        let row = sqlx::query_as::<_, DbClient>(
            "SELECT id, display_name, segment, birth_year, declared_income_cents, active, created_at FROM clients WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or(BankError::ClientNotFound)?;
        row.to_domain().map_err(BankError::from)
    }

    pub async fn set_active(&self, id: &ClientId, active: bool) -> BankResult<Client> {
        let row = sqlx::query_as::<_, DbClient>(
            r#"
            UPDATE clients SET active = $2
            WHERE id = $1
            RETURNING id, display_name, segment, birth_year, declared_income_cents, active, created_at
            "#,
        )
        .bind(id.as_str())
        .bind(active)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or(BankError::ClientNotFound)?;
        row.to_domain().map_err(BankError::from)
    }
}

fn segment_str(segment: ClientSegment) -> &'static str {
    match segment {
        ClientSegment::Retail => "retail",
        ClientSegment::Premium => "premium",
        ClientSegment::Business => "business",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test]
    async fn create_find_and_deactivate_round_trips(pool: PgPool) {
        let repo = ClientRepo::new(pool);
        let id = ClientId::new("demo-client");

        let created = repo
            .create(id.clone(), "Demo Client", ClientSegment::Premium, Some(1990), Some(85_000))
            .await
            .unwrap();
        assert_eq!(created.display_name, "Demo Client");
        assert!(created.active);

        let fetched = repo.find_by_id(&id).await.unwrap();
        assert_eq!(fetched.segment, ClientSegment::Premium);

        let deactivated = repo.set_active(&id, false).await.unwrap();
        assert!(!deactivated.active);

        let fetched_again = repo.find_by_id(&id).await.unwrap();
        assert!(!fetched_again.active);
    }

    #[sqlx::test]
    async fn find_by_id_rejects_unknown_client(pool: PgPool) {
        let repo = ClientRepo::new(pool);
        let result = repo.find_by_id(&ClientId::new("ghost")).await;
        assert!(matches!(result, Err(BankError::ClientNotFound)));
    }
}
