//! Card repository (§3, §4.4): a capability over its owning account.

use openbank_types::{
    luhn_is_valid, AccountId, BankError, BankResult, Card, CardId, CardStatus, CardType, Money,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::DbCard;

pub struct CardRepo {
    pool: PgPool,
}

impl CardRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        account_id: AccountId,
        number: &str,
        card_type: CardType,
        holder_name: &str,
        expiry: chrono::DateTime<chrono::Utc>,
        daily_limit: Option<Money>,
        monthly_limit: Option<Money>,
    ) -> BankResult<Card> {
        if !luhn_is_valid(number) {
            return Err(BankError::validation("card number fails Luhn check"));
        }
        let currency = daily_limit
            .as_ref()
            .or(monthly_limit.as_ref())
            .map(|m| m.currency().code())
            .unwrap_or("USD");

        let row = sqlx::query_as::<_, DbCard>(
            r#"
            INSERT INTO cards (id, account_id, number, card_type, holder_name, expiry, daily_limit, monthly_limit, currency, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'active')
            RETURNING id, account_id, number, card_type, holder_name, expiry, daily_limit, monthly_limit, currency, status
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(account_id.as_uuid())
        .bind(number)
        .bind(card_type_str(card_type))
        .bind(holder_name)
        .bind(expiry)
        .bind(daily_limit.map(|m| m.to_decimal()))
        .bind(monthly_limit.map(|m| m.to_decimal()))
        .bind(currency)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)?;

        row.to_domain().map_err(BankError::from)
    }

    pub async fn find_by_id(&self, id: CardId) -> BankResult<Card> {
        let row = sqlx::query_as::<_, DbCard>(
            "SELECT id, account_id, number, card_type, holder_name, expiry, daily_limit, monthly_limit, currency, status FROM cards WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or(BankError::CardNotFound)?;
        row.to_domain().map_err(BankError::from)
    }

    pub async fn list_by_account(&self, account_id: AccountId) -> BankResult<Vec<Card>> {
        let rows = sqlx::query_as::<_, DbCard>(
            "SELECT id, account_id, number, card_type, holder_name, expiry, daily_limit, monthly_limit, currency, status FROM cards WHERE account_id = $1",
        )
        .bind(account_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;
        rows.into_iter().map(|r| r.to_domain().map_err(BankError::from)).collect()
    }

    pub async fn update_status(&self, id: CardId, status: CardStatus) -> BankResult<Card> {
        let row = sqlx::query_as::<_, DbCard>(
            r#"
            UPDATE cards SET status = $2
            WHERE id = $1
            RETURNING id, account_id, number, card_type, holder_name, expiry, daily_limit, monthly_limit, currency, status
            "#,
        )
        .bind(id.as_uuid())
        .bind(card_status_str(status))
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or(BankError::CardNotFound)?;
        row.to_domain().map_err(BankError::from)
    }
}

fn card_type_str(card_type: CardType) -> &'static str {
    match card_type {
        CardType::Debit => "debit",
        CardType::Credit => "credit",
    }
}

fn card_status_str(status: CardStatus) -> &'static str {
    match status {
        CardStatus::Active => "active",
        CardStatus::Blocked => "blocked",
        CardStatus::Expired => "expired",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::account::AccountRepo;
    use crate::repos::client::ClientRepo;
    use chrono::Utc;
    use openbank_types::{ClientId, ClientSegment};

    #[sqlx::test]
    async fn create_rejects_a_non_luhn_number(pool: PgPool) {
        let repo = CardRepo::new(pool.clone());
        let client_repo = ClientRepo::new(pool.clone());
        let account_repo = AccountRepo::new(pool);
        let client = ClientId::new("demo-1");
        client_repo.create(client.clone(), "Demo", ClientSegment::Retail, None, None).await.unwrap();
        let account = account_repo
            .create(&client, "acc-card", openbank_types::AccountType::Checking, Money::zero(openbank_types::Currency::RUB))
            .await
            .unwrap();

        let result = repo
            .create(account.id, "1234567812345678", CardType::Debit, "Demo", Utc::now(), None, None)
            .await;
        assert!(result.is_err());
    }

    #[sqlx::test]
    async fn create_then_update_status_round_trips(pool: PgPool) {
        let repo = CardRepo::new(pool.clone());
        let client_repo = ClientRepo::new(pool.clone());
        let account_repo = AccountRepo::new(pool);
        let client = ClientId::new("demo-1");
        client_repo.create(client.clone(), "Demo", ClientSegment::Retail, None, None).await.unwrap();
        let account = account_repo
            .create(&client, "acc-card", openbank_types::AccountType::Checking, Money::zero(openbank_types::Currency::RUB))
            .await
            .unwrap();

        let card = repo
            .create(account.id, "4111111111111111", CardType::Debit, "Demo", Utc::now(), None, None)
            .await
            .unwrap();
        assert_eq!(card.status, CardStatus::Active);

        let blocked = repo.update_status(card.id, CardStatus::Blocked).await.unwrap();
        assert_eq!(blocked.status, CardStatus::Blocked);

        let fetched = repo.find_by_id(card.id).await.unwrap();
        assert_eq!(fetched.status, CardStatus::Blocked);
    }
}
