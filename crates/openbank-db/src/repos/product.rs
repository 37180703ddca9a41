//! Product catalog + Product Agreement Manager (§4.5): opening and
//! closing derived accounts bound to catalog products, with capital
//! invariants enforced under row lock.
//!
//! Grounded on `original_source/api/product_agreements.py`'s capital
//! arithmetic (loan open decreases `capital`/increases `total_loans`;
//! close does the reverse) and on `openibank-db::repos::wallet` for the
//! row-locked debit/credit style reused here across the funding source
//! and the new product account.

use chrono::Utc;
use openbank_types::{
    Account, AccountId, AccountType, BankError, BankResult, ClientId, Money, Product,
    ProductAgreement, ProductAgreementId, ProductAgreementStatus, ProductId, ProductKind,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{DbAccount, DbProduct, DbProductAgreement};
use crate::repos::account::insert_transaction;
use crate::repos::capital::BankCapitalRepo;

pub struct ProductRepo {
    pool: PgPool,
}

impl ProductRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, kind: ProductKind, name: &str, min_amount: Money, max_amount: Money) -> BankResult<Product> {
        let row = sqlx::query_as::<_, DbProduct>(
            r#"
            INSERT INTO products (id, kind, name, min_amount, max_amount, currency)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, kind, name, min_amount, max_amount, currency
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(kind.as_str())
        .bind(name)
        .bind(min_amount.to_decimal())
        .bind(max_amount.to_decimal())
        .bind(min_amount.currency().code())
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)?;
        row.to_domain().map_err(BankError::from)
    }

    pub async fn find_by_id(&self, id: ProductId) -> BankResult<Product> {
        let row = sqlx::query_as::<_, DbProduct>(
            "SELECT id, kind, name, min_amount, max_amount, currency FROM products WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or(BankError::ProductNotFound)?;
        row.to_domain().map_err(BankError::from)
    }

    pub async fn list(&self) -> BankResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, DbProduct>("SELECT id, kind, name, min_amount, max_amount, currency FROM products")
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;
        rows.into_iter().map(|r| r.to_domain().map_err(BankError::from)).collect()
    }

    fn ensure_within_bounds(product: &Product, amount: &Money) -> BankResult<()> {
        if amount.currency() != product.min_amount.currency() {
            return Err(BankError::validation("amount currency does not match product currency"));
        }
        if amount.cents() < product.min_amount.cents() || amount.cents() > product.max_amount.cents() {
            return Err(BankError::validation("amount outside the product's min/max bounds"));
        }
        Ok(())
    }
}

pub struct ProductAgreementRepo {
    pool: PgPool,
    capital: BankCapitalRepo,
}

impl ProductAgreementRepo {
    pub fn new(pool: PgPool) -> Self {
        Self {
            capital: BankCapitalRepo::new(pool.clone()),
            pool,
        }
    }

    /// §4.5 opening. `source_account` funds deposit/card agreements (not
    /// loans, which create a positive-balance loan account directly).
    pub async fn open(
        &self,
        client: &ClientId,
        product: &Product,
        principal: Money,
        source_account: Option<AccountId>,
        own_bank_code: &str,
    ) -> BankResult<ProductAgreement> {
        ProductRepo::ensure_within_bounds(product, &principal)?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let new_account_type = match product.kind {
            ProductKind::Deposit => AccountType::Deposit,
            ProductKind::Loan => AccountType::Loan,
            ProductKind::Card | ProductKind::CreditCard => AccountType::Card,
        };

        let new_account_id = Uuid::new_v4();
        let new_account = sqlx::query_as::<_, DbAccount>(
            r#"
            INSERT INTO accounts (id, account_number, client_id, account_type, balance, currency, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'active')
            RETURNING id, account_number, client_id, account_type, balance, currency, status, created_at
            "#,
        )
        .bind(new_account_id)
        .bind(format!("agr-{new_account_id}"))
        .bind(client.as_str())
        .bind(new_account_type.as_str())
        .bind(if product.kind == ProductKind::Loan { principal.to_decimal() } else { Money::zero(principal.currency()).to_decimal() })
        .bind(principal.currency().code())
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::from)?
        .to_domain()
        .map_err(BankError::from)?;

        match product.kind {
            ProductKind::Loan => {
                self.capital
                    .apply_delta_in_tx(&mut tx, own_bank_code, &principal.negate())
                    .await?;
                self.capital
                    .adjust_total_loans_in_tx(&mut tx, own_bank_code, &principal)
                    .await?;
            }
            ProductKind::Deposit => {
                let source_id = source_account
                    .ok_or_else(|| BankError::validation("deposit agreements require a funding source account"))?;
                self.fund_from_source(&mut tx, source_id, new_account_id.into(), principal).await?;
                self.capital.adjust_total_deposits_in_tx(&mut tx, own_bank_code, &principal).await?;
            }
            ProductKind::Card | ProductKind::CreditCard => {
                if let Some(source_id) = source_account {
                    self.fund_from_source(&mut tx, source_id, new_account_id.into(), principal).await?;
                }
            }
        }

        let agreement_id = Uuid::new_v4();
        let row = sqlx::query_as::<_, DbProductAgreement>(
            r#"
            INSERT INTO product_agreements (id, client_id, product_id, account_id, principal, currency, status, start_date)
            VALUES ($1, $2, $3, $4, $5, $6, 'active', $7)
            RETURNING id, client_id, product_id, account_id, principal, currency, status, start_date, end_date
            "#,
        )
        .bind(agreement_id)
        .bind(client.as_str())
        .bind(product.id.as_uuid())
        .bind(new_account.id.as_uuid())
        .bind(principal.to_decimal())
        .bind(principal.currency().code())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;
        row.to_domain().map_err(BankError::from)
    }

    /// §4.5 closing. Loans require `repayment_source` to cover the
    /// outstanding principal; other kinds simply close the account
    /// (§4.4 close semantics apply if a balance remains).
    pub async fn close(
        &self,
        agreement_id: ProductAgreementId,
        repayment_source: Option<AccountId>,
        own_bank_code: &str,
    ) -> BankResult<ProductAgreement> {
        let agreement = self.find_by_id(agreement_id).await?;
        if agreement.status != ProductAgreementStatus::Active {
            return Err(BankError::InvalidStatusTransition("agreement is not active".into()));
        }

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let account = lock_account(&mut tx, agreement.account).await?;
        account.ensure_active()?;

        if account.account_type == AccountType::Loan {
            let source_id = repayment_source.ok_or_else(|| BankError::validation("loan closure requires a repayment source"))?;
            if account.balance.is_positive() {
                self.repay_loan_from_source(&mut tx, source_id, agreement.account, account.balance).await?;
            }
            self.capital.apply_delta_in_tx(&mut tx, own_bank_code, &account.balance).await?;
            self.capital
                .adjust_total_loans_in_tx(&mut tx, own_bank_code, &account.balance.negate())
                .await?;
        }

        sqlx::query("UPDATE accounts SET status = 'closed' WHERE id = $1")
            .bind(agreement.account.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

        let row = sqlx::query_as::<_, DbProductAgreement>(
            r#"
            UPDATE product_agreements SET status = 'closed', end_date = $2
            WHERE id = $1
            RETURNING id, client_id, product_id, account_id, principal, currency, status, start_date, end_date
            "#,
        )
        .bind(agreement_id.as_uuid())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;
        row.to_domain().map_err(BankError::from)
    }

    pub async fn find_by_id(&self, id: ProductAgreementId) -> BankResult<ProductAgreement> {
        let row = sqlx::query_as::<_, DbProductAgreement>(
            "SELECT id, client_id, product_id, account_id, principal, currency, status, start_date, end_date FROM product_agreements WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or(BankError::ProductAgreementNotFound)?;
        row.to_domain().map_err(BankError::from)
    }

    pub async fn list_by_client(&self, client: &ClientId) -> BankResult<Vec<ProductAgreement>> {
        let rows = sqlx::query_as::<_, DbProductAgreement>(
            "SELECT id, client_id, product_id, account_id, principal, currency, status, start_date, end_date FROM product_agreements WHERE client_id = $1 ORDER BY start_date",
        )
        .bind(client.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;
        rows.into_iter().map(|r| r.to_domain().map_err(BankError::from)).collect()
    }

    async fn fund_from_source(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        source_id: AccountId,
        dest_id: AccountId,
        amount: Money,
    ) -> BankResult<()> {
        let locked_source = lock_account(tx, source_id).await?;
        locked_source.ensure_active()?;
        if locked_source.would_underflow(&amount) {
            return Err(BankError::InsufficientFunds);
        }

        sqlx::query("UPDATE accounts SET balance = balance - $2 WHERE id = $1")
            .bind(source_id.as_uuid())
            .bind(amount.to_decimal())
            .execute(&mut **tx)
            .await
            .map_err(DbError::from)?;
        insert_transaction(
            tx,
            source_id,
            &format!("agr-fund-out-{}", Uuid::new_v4()),
            amount,
            openbank_types::TransactionDirection::Debit,
            "product agreement funding",
            "agreement open/close funding",
            None,
            None,
        )
        .await
        .map_err(BankError::from)?;

        sqlx::query("UPDATE accounts SET balance = balance + $2 WHERE id = $1")
            .bind(dest_id.as_uuid())
            .bind(amount.to_decimal())
            .execute(&mut **tx)
            .await
            .map_err(DbError::from)?;
        insert_transaction(
            tx,
            dest_id,
            &format!("agr-fund-in-{}", Uuid::new_v4()),
            amount,
            openbank_types::TransactionDirection::Credit,
            "product agreement funding",
            "agreement open/close funding",
            None,
            None,
        )
        .await
        .map_err(BankError::from)?;

        Ok(())
    }

    /// Loan closure repayment: debits the repayment source and drives the
    /// loan account's outstanding balance to zero — unlike
    /// `fund_from_source`, both legs decrease (the loan account isn't
    /// credited, it's paid off).
    async fn repay_loan_from_source(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        source_id: AccountId,
        loan_account_id: AccountId,
        outstanding: Money,
    ) -> BankResult<()> {
        let locked_source = lock_account(tx, source_id).await?;
        locked_source.ensure_active()?;
        if locked_source.would_underflow(&outstanding) {
            return Err(BankError::InsufficientFunds);
        }

        sqlx::query("UPDATE accounts SET balance = balance - $2 WHERE id = $1")
            .bind(source_id.as_uuid())
            .bind(outstanding.to_decimal())
            .execute(&mut **tx)
            .await
            .map_err(DbError::from)?;
        insert_transaction(
            tx,
            source_id,
            &format!("loan-repay-out-{}", Uuid::new_v4()),
            outstanding,
            openbank_types::TransactionDirection::Debit,
            "loan repayment",
            "loan closure repayment",
            None,
            None,
        )
        .await
        .map_err(BankError::from)?;

        sqlx::query("UPDATE accounts SET balance = balance - $2 WHERE id = $1")
            .bind(loan_account_id.as_uuid())
            .bind(outstanding.to_decimal())
            .execute(&mut **tx)
            .await
            .map_err(DbError::from)?;
        insert_transaction(
            tx,
            loan_account_id,
            &format!("loan-repay-in-{}", Uuid::new_v4()),
            outstanding,
            openbank_types::TransactionDirection::Debit,
            "loan repayment",
            "loan closure repayment",
            None,
            None,
        )
        .await
        .map_err(BankError::from)?;

        Ok(())
    }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::client::ClientRepo;
    use openbank_types::{ClientSegment, Currency};

    #[sqlx::test]
    async fn create_and_list_round_trips(pool: PgPool) {
        let repo = ProductRepo::new(pool);
        let created = repo
            .create(ProductKind::Loan, "Personal Loan", Money::new(1000_00, Currency::RUB), Money::new(20000_00, Currency::RUB))
            .await
            .unwrap();

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
        assert_eq!(repo.find_by_id(created.id).await.unwrap().name, "Personal Loan");
    }

    #[sqlx::test]
    async fn open_rejects_a_principal_outside_product_bounds(pool: PgPool) {
        let product_repo = ProductRepo::new(pool.clone());
        let client_repo = ClientRepo::new(pool.clone());
        let agreement_repo = ProductAgreementRepo::new(pool);

        let product = product_repo
            .create(ProductKind::Loan, "Personal Loan", Money::new(1000_00, Currency::RUB), Money::new(20000_00, Currency::RUB))
            .await
            .unwrap();
        let client = ClientId::new("demo-1");
        client_repo.create(client.clone(), "Demo", ClientSegment::Retail, None, None).await.unwrap();

        let result = agreement_repo.open(&client, &product, Money::new(50_00, Currency::RUB), None, "bank1").await;
        assert!(result.is_err());
    }

    #[sqlx::test]
    async fn open_then_close_a_loan_returns_capital_to_its_starting_point(pool: PgPool) {
        sqlx::query(
            "INSERT INTO bank_capital (bank_code, capital, initial_capital, total_deposits, total_loans, currency) VALUES ('bank1', 100000.00, 100000.00, 0, 0, 'RUB')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let product_repo = ProductRepo::new(pool.clone());
        let client_repo = ClientRepo::new(pool.clone());
        let agreement_repo = ProductAgreementRepo::new(pool.clone());
        let capital_repo = BankCapitalRepo::new(pool.clone());

        let product = product_repo
            .create(ProductKind::Loan, "Personal Loan", Money::new(1000_00, Currency::RUB), Money::new(20000_00, Currency::RUB))
            .await
            .unwrap();
        let client = ClientId::new("demo-1");
        client_repo.create(client.clone(), "Demo", ClientSegment::Retail, None, None).await.unwrap();

        let agreement = agreement_repo.open(&client, &product, Money::new(5000_00, Currency::RUB), None, "bank1").await.unwrap();
        let after_open = capital_repo.get("bank1").await.unwrap();
        assert_eq!(after_open.capital.to_decimal(), rust_decimal::Decimal::new(9500000, 2));
        assert_eq!(after_open.total_loans.to_decimal(), rust_decimal::Decimal::new(500000, 2));

        let repayment_source = crate::repos::account::AccountRepo::new(pool.clone())
            .create(&client, "acc-repay", AccountType::Checking, Money::new(5000_00, Currency::RUB))
            .await
            .unwrap();

        let closed = agreement_repo.close(agreement.id, Some(repayment_source.id), "bank1").await.unwrap();
        assert_eq!(closed.status, ProductAgreementStatus::Closed);

        let after_close = capital_repo.get("bank1").await.unwrap();
        assert_eq!(after_close.capital.to_decimal(), rust_decimal::Decimal::new(10000000, 2));
        assert_eq!(after_close.total_loans.to_decimal(), rust_decimal::Decimal::ZERO);

        let account_repo = crate::repos::account::AccountRepo::new(pool.clone());
        let loan_account = account_repo.find_by_id(agreement.account).await.unwrap();
        assert_eq!(loan_account.balance.cents(), 0, "repaid loan account must settle to zero, not double its principal");

        let source_after = account_repo.find_by_id(repayment_source.id).await.unwrap();
        assert_eq!(source_after.balance.cents(), 0);
    }
}
