//! Account Ledger (§4.4): account existence, balance, and immutable
//! history.
//!
//! `credit`/`debit` follow the row-locked read-then-update-then-log
//! pattern of `openibank-db::repos::wallet::WalletRepo::credit`/`debit`
//! (`SELECT ... FOR UPDATE` inside a transaction, followed by an
//! immutable ledger insert), adapted from a per-currency balance table
//! to a single fixed-point balance column per account.

use chrono::Utc;
use openbank_types::{
    coerce_paging, Account, AccountId, AccountType, BankError, BankResult, ClientId, Money,
    Transaction, TransactionDirection, TransactionPage,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::DbAccount;
use crate::repos::capital::BankCapitalRepo;

pub struct AccountRepo {
    pool: PgPool,
    capital: BankCapitalRepo,
}

impl AccountRepo {
    pub fn new(pool: PgPool) -> Self {
        Self {
            capital: BankCapitalRepo::new(pool.clone()),
            pool,
        }
    }

    pub async fn create(
        &self,
        owner: &ClientId,
        account_number: &str,
        account_type: AccountType,
        initial_balance: Money,
    ) -> BankResult<Account> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let row = sqlx::query_as::<_, DbAccount>(
            r#"
            INSERT INTO accounts (id, account_number, client_id, account_type, balance, currency, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'active')
            RETURNING id, account_number, client_id, account_type, balance, currency, status, created_at
            "#,
        )
        .bind(id)
        .bind(account_number)
        .bind(owner.as_str())
        .bind(account_type.as_str())
        .bind(initial_balance.to_decimal())
        .bind(initial_balance.currency().code())
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::from)?;

        let account = row.to_domain().map_err(BankError::from)?;

        if initial_balance.is_positive() {
            insert_transaction(
                &mut tx,
                account.id,
                &format!("open-{id}"),
                initial_balance,
                TransactionDirection::Credit,
                "account opening",
                "initial balance",
                None,
                None,
            )
            .await
            .map_err(BankError::from)?;
        }

        tx.commit().await.map_err(DbError::from)?;
        Ok(account)
    }

    pub async fn find_by_id(&self, id: AccountId) -> BankResult<Account> {
        let row = sqlx::query_as::<_, DbAccount>(
            "SELECT id, account_number, client_id, account_type, balance, currency, status, created_at FROM accounts WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or(BankError::AccountNotFound)?;
        row.to_domain().map_err(BankError::from)
    }

    pub async fn find_by_number(&self, account_number: &str) -> BankResult<Option<Account>> {
        let row = sqlx::query_as::<_, DbAccount>(
            "SELECT id, account_number, client_id, account_type, balance, currency, status, created_at FROM accounts WHERE account_number = $1",
        )
        .bind(account_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;
        row.map(|r| r.to_domain().map_err(BankError::from)).transpose()
    }

    /// Resolves a local, active source account by number (§4.3 step 1).
    pub async fn find_active_source(&self, account_number: &str) -> BankResult<Account> {
        let account = self
            .find_by_number(account_number)
            .await?
            .ok_or(BankError::SourceNotFound)?;
        account.ensure_active()?;
        Ok(account)
    }

    pub async fn list_by_client(&self, client: &ClientId) -> BankResult<Vec<Account>> {
        let rows = sqlx::query_as::<_, DbAccount>(
            "SELECT id, account_number, client_id, account_type, balance, currency, status, created_at FROM accounts WHERE client_id = $1 ORDER BY created_at",
        )
        .bind(client.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;
        rows.into_iter().map(|r| r.to_domain().map_err(BankError::from)).collect()
    }

    /// Row-locked credit, followed by an immutable ledger insert, inside
    /// one transaction (§4.4, §5 "row locking of the involved account").
    pub async fn credit(
        &self,
        account_id: AccountId,
        amount: Money,
        counterparty_label: &str,
        description: &str,
        external_id: &str,
    ) -> BankResult<Account> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let locked = sqlx::query_as::<_, DbAccount>(
            "SELECT id, account_number, client_id, account_type, balance, currency, status, created_at FROM accounts WHERE id = $1 FOR UPDATE",
        )
        .bind(account_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(DbError::from)?
        .ok_or(BankError::AccountNotFound)?
        .to_domain()
        .map_err(BankError::from)?;

        locked.ensure_active()?;

        let updated = sqlx::query_as::<_, DbAccount>(
            r#"
            UPDATE accounts SET balance = balance + $2
            WHERE id = $1
            RETURNING id, account_number, client_id, account_type, balance, currency, status, created_at
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(amount.to_decimal())
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::from)?
        .to_domain()
        .map_err(BankError::from)?;

        insert_transaction(
            &mut tx,
            account_id,
            external_id,
            amount,
            TransactionDirection::Credit,
            counterparty_label,
            description,
            None,
            None,
        )
        .await
        .map_err(BankError::from)?;

        tx.commit().await.map_err(DbError::from)?;
        Ok(updated)
    }

    /// Row-locked debit. Fails `INSUFFICIENT_FUNDS` without mutating
    /// anything if the locked balance cannot cover `amount`.
    pub async fn debit(
        &self,
        account_id: AccountId,
        amount: Money,
        counterparty_label: &str,
        description: &str,
        external_id: &str,
    ) -> BankResult<Account> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let locked = sqlx::query_as::<_, DbAccount>(
            "SELECT id, account_number, client_id, account_type, balance, currency, status, created_at FROM accounts WHERE id = $1 FOR UPDATE",
        )
        .bind(account_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(DbError::from)?
        .ok_or(BankError::AccountNotFound)?
        .to_domain()
        .map_err(BankError::from)?;

        locked.ensure_active()?;
        if locked.would_underflow(&amount) {
            return Err(BankError::InsufficientFunds);
        }

        let updated = sqlx::query_as::<_, DbAccount>(
            r#"
            UPDATE accounts SET balance = balance - $2
            WHERE id = $1
            RETURNING id, account_number, client_id, account_type, balance, currency, status, created_at
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(amount.to_decimal())
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::from)?
        .to_domain()
        .map_err(BankError::from)?;

        insert_transaction(
            &mut tx,
            account_id,
            external_id,
            amount,
            TransactionDirection::Debit,
            counterparty_label,
            description,
            None,
            None,
        )
        .await
        .map_err(BankError::from)?;

        tx.commit().await.map_err(DbError::from)?;
        Ok(updated)
    }

    /// §4.4 "Close semantics": closing with a positive balance requires
    /// an explicit disposition. Donate credits this bank's capital by the
    /// same amount debited from the account, inside the one transaction
    /// (§3 `capital = … + Σ donations`).
    pub async fn close(
        &self,
        account_id: AccountId,
        disposition: CloseDisposition,
        own_bank_code: &str,
    ) -> BankResult<Account> {
        let account = self.find_by_id(account_id).await?;
        account.ensure_active()?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        if account.balance.is_positive() {
            match disposition {
                CloseDisposition::Transfer { destination } => {
                    let locked_source = lock_account(&mut tx, account_id).await?;
                    locked_source.ensure_active()?;
                    update_balance(&mut tx, account_id, &account.balance.negate()).await?;
                    insert_transaction(
                        &mut tx,
                        account_id,
                        &format!("close-out-{account_id}"),
                        account.balance,
                        TransactionDirection::Debit,
                        "account closure transfer",
                        "closing transfer out",
                        None,
                        None,
                    )
                    .await
                    .map_err(BankError::from)?;

                    let locked_dest = lock_account(&mut tx, destination).await?;
                    locked_dest.ensure_active()?;
                    update_balance(&mut tx, destination, &account.balance).await?;
                    insert_transaction(
                        &mut tx,
                        destination,
                        &format!("close-in-{account_id}"),
                        account.balance,
                        TransactionDirection::Credit,
                        "account closure transfer",
                        "closing transfer in",
                        None,
                        None,
                    )
                    .await
                    .map_err(BankError::from)?;
                }
                CloseDisposition::Donate => {
                    let locked = lock_account(&mut tx, account_id).await?;
                    locked.ensure_active()?;
                    update_balance(&mut tx, account_id, &account.balance.negate()).await?;
                    insert_transaction(
                        &mut tx,
                        account_id,
                        &format!("close-donate-{account_id}"),
                        account.balance,
                        TransactionDirection::Debit,
                        "bank capital",
                        "donated to bank capital on closure",
                        None,
                        None,
                    )
                    .await
                    .map_err(BankError::from)?;

                    self.capital.apply_delta_in_tx(&mut tx, own_bank_code, &account.balance).await?;
                }
            }
        }

        let row = sqlx::query_as::<_, DbAccount>(
            r#"
            UPDATE accounts SET status = 'closed'
            WHERE id = $1
            RETURNING id, account_number, client_id, account_type, balance, currency, status, created_at
            "#,
        )
        .bind(account_id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;
        row.to_domain().map_err(BankError::from)
    }

    /// §4.4 "Paging of history": `order transaction_date DESC`, total
    /// computed in the same snapshot as the slice.
    pub async fn history(&self, account_id: AccountId, page: i64, limit: i64) -> BankResult<TransactionPage> {
        let (page, limit) = coerce_paging(page, limit, 50, 500);

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let total_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE account_id = $1")
            .bind(account_id.as_uuid())
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::from)?;

        let offset = ((page - 1) as i64) * (limit as i64);
        let rows = sqlx::query_as::<_, crate::models::DbTransaction>(
            r#"
            SELECT id, account_id, external_id, amount, currency, direction, counterparty_label,
                   description, merchant_id, card_id, value_date
            FROM transactions
            WHERE account_id = $1
            ORDER BY value_date DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&mut *tx)
        .await
        .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;

        let items: Vec<Transaction> = rows
            .into_iter()
            .map(|r| r.to_domain().map_err(BankError::from))
            .collect::<BankResult<_>>()?;

        Ok(TransactionPage {
            items,
            total_count,
            page,
            limit,
        })
    }
}

pub enum CloseDisposition {
    Transfer { destination: AccountId },
    Donate,
}

fn direction_str(direction: TransactionDirection) -> &'static str {
    match direction {
        TransactionDirection::Credit => "credit",
        TransactionDirection::Debit => "debit",
    }
}

/// Shared by `credit`/`debit` so the ledger insert participates in the
/// caller's open transaction (§5 "committed together or not at all").
pub(crate) async fn insert_transaction(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    account_id: AccountId,
    external_id: &str,
    amount: Money,
    direction: TransactionDirection,
    counterparty_label: &str,
    description: &str,
    merchant_id: Option<Uuid>,
    card_id: Option<Uuid>,
) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO transactions
            (id, account_id, external_id, amount, currency, direction, counterparty_label, description, merchant_id, card_id, value_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(account_id.as_uuid())
    .bind(external_id)
    .bind(amount.to_decimal())
    .bind(amount.currency().code())
    .bind(direction_str(direction))
    .bind(counterparty_label)
    .bind(description)
    .bind(merchant_id)
    .bind(card_id)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn lock_account(tx: &mut sqlx::Transaction<'_, sqlx::Postgres>, account_id: AccountId) -> BankResult<Account> {
    sqlx::query_as::<_, DbAccount>(
        "SELECT id, account_number, client_id, account_type, balance, currency, status, created_at FROM accounts WHERE id = $1 FOR UPDATE",
    )
    .bind(account_id.as_uuid())
    .fetch_optional(&mut **tx)
    .await
    .map_err(DbError::from)?
    .ok_or(BankError::AccountNotFound)?
    .to_domain()
    .map_err(BankError::from)
}

async fn update_balance(tx: &mut sqlx::Transaction<'_, sqlx::Postgres>, account_id: AccountId, delta: &Money) -> BankResult<()> {
    sqlx::query("UPDATE accounts SET balance = balance + $2 WHERE id = $1")
        .bind(account_id.as_uuid())
        .bind(delta.to_decimal())
        .execute(&mut **tx)
        .await
        .map_err(DbError::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_disposition_variants_construct() {
        let _ = CloseDisposition::Donate;
        let _ = CloseDisposition::Transfer {
            destination: AccountId::new(),
        };
    }

    #[sqlx::test]
    async fn closing_with_donate_debits_the_account_and_credits_bank_capital(pool: PgPool) {
        sqlx::query(
            "INSERT INTO bank_capital (bank_code, capital, initial_capital, total_deposits, total_loans, currency) VALUES ('bank1', 1000.00, 1000.00, 0, 0, 'RUB')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let client_repo = crate::repos::client::ClientRepo::new(pool.clone());
        let repo = AccountRepo::new(pool.clone());
        let client = ClientId::new("demo-1");
        client_repo.create(client.clone(), "Demo", openbank_types::ClientSegment::Retail, None, None).await.unwrap();
        let account = repo
            .create(&client, "acc-donate", AccountType::Checking, Money::new(250_00, openbank_types::Currency::RUB))
            .await
            .unwrap();

        let closed = repo.close(account.id, CloseDisposition::Donate, "bank1").await.unwrap();
        assert_eq!(closed.balance.cents(), 0);
        assert_eq!(closed.status, openbank_types::AccountStatus::Closed);

        let capital = crate::repos::capital::BankCapitalRepo::new(pool).get("bank1").await.unwrap();
        assert_eq!(capital.capital.to_decimal(), rust_decimal::Decimal::new(125000, 2));
    }
}
