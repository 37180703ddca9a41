//! Bank Capital repository (§3): a row-locked singleton per bank code,
//! shared by inter-bank payment legs, donations on account closure, and
//! loan open/close in the Product Agreement Manager.

use openbank_types::{BankError, BankResult, BankCapital, Money};
use sqlx::PgPool;

use crate::error::DbError;
use crate::models::DbBankCapital;

pub struct BankCapitalRepo {
    pool: PgPool,
}

impl BankCapitalRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, bank_code: &str) -> BankResult<BankCapital> {
        let row = sqlx::query_as::<_, DbBankCapital>(
            "SELECT bank_code, capital, initial_capital, total_deposits, total_loans, currency FROM bank_capital WHERE bank_code = $1",
        )
        .bind(bank_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| BankError::internal(format!("unknown bank code: {bank_code}")))?;
        row.to_domain().map_err(BankError::from)
    }

    /// Row-locked read-modify-write: applies `delta` to `capital` inside
    /// one transaction, failing `INSUFFICIENT_CAPITAL` without mutating
    /// anything if the result would go negative (§3 invariant).
    pub async fn apply_delta(&self, bank_code: &str, delta: &Money) -> BankResult<BankCapital> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let capital = self.apply_delta_in_tx(&mut tx, bank_code, delta).await?;
        tx.commit().await.map_err(DbError::from)?;
        Ok(capital)
    }

    pub async fn apply_delta_in_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        bank_code: &str,
        delta: &Money,
    ) -> BankResult<BankCapital> {
        let locked = sqlx::query_as::<_, DbBankCapital>(
            "SELECT bank_code, capital, initial_capital, total_deposits, total_loans, currency FROM bank_capital WHERE bank_code = $1 FOR UPDATE",
        )
        .bind(bank_code)
        .fetch_optional(&mut **tx)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| BankError::internal(format!("unknown bank code: {bank_code}")))?
        .to_domain()
        .map_err(BankError::from)?;

        let mut next = locked.clone();
        next.apply_delta(delta)?;

        let row = sqlx::query_as::<_, DbBankCapital>(
            r#"
            UPDATE bank_capital SET capital = $2
            WHERE bank_code = $1
            RETURNING bank_code, capital, initial_capital, total_deposits, total_loans, currency
            "#,
        )
        .bind(bank_code)
        .bind(next.capital.to_decimal())
        .fetch_one(&mut **tx)
        .await
        .map_err(DbError::from)?;

        row.to_domain().map_err(BankError::from)
    }

    /// Adjusts `total_deposits` (Product Agreement Manager, deposit
    /// open/close) by `delta` without touching `capital` itself.
    pub async fn adjust_total_deposits_in_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        bank_code: &str,
        delta: &Money,
    ) -> BankResult<()> {
        sqlx::query("UPDATE bank_capital SET total_deposits = total_deposits + $2 WHERE bank_code = $1")
            .bind(bank_code)
            .bind(delta.to_decimal())
            .execute(&mut **tx)
            .await
            .map_err(DbError::from)?;
        Ok(())
    }

    /// Adjusts `total_loans` (Product Agreement Manager, loan open/close).
    pub async fn adjust_total_loans_in_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        bank_code: &str,
        delta: &Money,
    ) -> BankResult<()> {
        sqlx::query("UPDATE bank_capital SET total_loans = total_loans + $2 WHERE bank_code = $1")
            .bind(bank_code)
            .bind(delta.to_decimal())
            .execute(&mut **tx)
            .await
            .map_err(DbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openbank_types::Currency;

    async fn seed(pool: &PgPool, bank_code: &str, capital: &str) {
        sqlx::query(
            "INSERT INTO bank_capital (bank_code, capital, initial_capital, total_deposits, total_loans, currency) VALUES ($1, $2, $2, 0, 0, 'RUB')",
        )
        .bind(bank_code)
        .bind(capital.parse::<rust_decimal::Decimal>().unwrap())
        .execute(pool)
        .await
        .unwrap();
    }

    #[sqlx::test]
    async fn apply_delta_credits_and_debits(pool: PgPool) {
        seed(&pool, "bank1", "1000.00").await;
        let repo = BankCapitalRepo::new(pool);

        let after_credit = repo.apply_delta("bank1", &Money::new(50000, Currency::RUB)).await.unwrap();
        assert_eq!(after_credit.capital.to_decimal(), rust_decimal::Decimal::new(150000, 2));

        let after_debit = repo.apply_delta("bank1", &Money::new(-30000, Currency::RUB)).await.unwrap();
        assert_eq!(after_debit.capital.to_decimal(), rust_decimal::Decimal::new(120000, 2));
    }

    #[sqlx::test]
    async fn apply_delta_rejects_a_debit_that_would_go_negative(pool: PgPool) {
        seed(&pool, "bank1", "100.00").await;
        let repo = BankCapitalRepo::new(pool);

        let result = repo.apply_delta("bank1", &Money::new(-20000, Currency::RUB)).await;
        assert!(result.is_err());

        let unchanged = repo.get("bank1").await.unwrap();
        assert_eq!(unchanged.capital.to_decimal(), rust_decimal::Decimal::new(10000, 2));
    }

    #[sqlx::test]
    async fn total_deposits_and_loans_accumulate_across_calls(pool: PgPool) {
        seed(&pool, "bank1", "1000.00").await;
        let repo = BankCapitalRepo::new(pool.clone());

        let mut tx = pool.begin().await.unwrap();
        repo.adjust_total_deposits_in_tx(&mut tx, "bank1", &Money::new(10000, Currency::RUB)).await.unwrap();
        repo.adjust_total_deposits_in_tx(&mut tx, "bank1", &Money::new(5000, Currency::RUB)).await.unwrap();
        repo.adjust_total_loans_in_tx(&mut tx, "bank1", &Money::new(20000, Currency::RUB)).await.unwrap();
        tx.commit().await.unwrap();

        let capital = repo.get("bank1").await.unwrap();
        assert_eq!(capital.total_deposits.to_decimal(), rust_decimal::Decimal::new(15000, 2));
        assert_eq!(capital.total_loans.to_decimal(), rust_decimal::Decimal::new(20000, 2));
    }
}
