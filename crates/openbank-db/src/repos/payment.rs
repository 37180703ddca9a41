//! Payment Engine (§4.3): single and VRP payments, intra- and inter-bank,
//! one ACID transaction covering the consent gate, the balance gate, the
//! ledger entries, and (inter-bank) the capital adjustment.
//!
//! Grounded on `openibank-db::repos::wallet` for the row-locked
//! debit/credit shape, generalized here to cover two accounts (or one
//! account plus an external leg) and a payment/transfer record inside a
//! single transaction rather than one account's balance alone.

use chrono::Utc;
use openbank_types::{
    Account, AccountId, BankError, BankResult, Consent, ConsentId, ConsentScope, InterbankTransfer,
    Money, Payment, PaymentDestination, PaymentStatus,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::DbAccount;
use crate::repos::account::insert_transaction;
use crate::repos::capital::BankCapitalRepo;
use crate::repos::consent::ConsentRepo;

pub struct PaymentRepo {
    pool: PgPool,
    consents: ConsentRepo,
    capital: BankCapitalRepo,
}

/// §4.3 step 3, the consent gate a caller declares up front: no consent
/// required (client acting on their own account), a single-shot payment
/// consent to be consumed atomically with the debit, or a VRP consent
/// whose four numeric guards are re-evaluated on every call.
pub enum PaymentGate {
    None,
    Single(ConsentId),
    Vrp(ConsentId),
}

impl PaymentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self {
            consents: ConsentRepo::new(pool.clone()),
            capital: BankCapitalRepo::new(pool.clone()),
            pool,
        }
    }

    /// §4.3 `initiate`. `own_bank_code` is this bank's code, used to
    /// route/label the inter-bank leg and to locate its capital row.
    pub async fn initiate(
        &self,
        from_account_no: &str,
        to_account_no: &str,
        to_bank_code: Option<&str>,
        amount: Money,
        description: &str,
        gate: PaymentGate,
        own_bank_code: &str,
    ) -> BankResult<Payment> {
        let source = self.find_active_by_number(from_account_no).await?;
        let target_local = self.find_by_number(to_account_no).await?.filter(|a| a.status == openbank_types::AccountStatus::Active);

        let destination = match &target_local {
            Some(acc) => PaymentDestination::Local(acc.id),
            None => PaymentDestination::External {
                account_number: to_account_no.to_string(),
                bank_code: to_bank_code
                    .ok_or_else(|| BankError::validation("destination bank code required for inter-bank payment"))?
                    .to_string(),
            },
        };

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let consent_id = self
            .apply_consent_gate(&mut tx, &gate, &source, target_local.as_ref(), &destination, &amount)
            .await?;

        let locked_source = lock_account(&mut tx, source.id).await?;
        locked_source.ensure_active()?;
        if locked_source.would_underflow(&amount) {
            return Err(BankError::InsufficientFunds);
        }

        update_balance(&mut tx, source.id, &amount.negate()).await?;
        insert_transaction(
            &mut tx,
            source.id,
            &format!("pay-out-{}", Uuid::new_v4()),
            amount,
            openbank_types::TransactionDirection::Debit,
            "payment",
            description,
            None,
            None,
        )
        .await
        .map_err(BankError::from)?;

        if let Some(target) = &target_local {
            let locked_target = lock_account(&mut tx, target.id).await?;
            locked_target.ensure_active()?;
            update_balance(&mut tx, target.id, &amount).await?;
            insert_transaction(
                &mut tx,
                target.id,
                &format!("pay-in-{}", Uuid::new_v4()),
                amount,
                openbank_types::TransactionDirection::Credit,
                "payment",
                description,
                None,
                None,
            )
            .await
            .map_err(BankError::from)?;
        }

        let payment_id = Uuid::new_v4();
        let (dest_account_id, dest_external_number, dest_bank_code) = match &destination {
            PaymentDestination::Local(id) => (Some(*id.as_uuid()), None, None),
            PaymentDestination::External { account_number, bank_code } => {
                (None, Some(account_number.clone()), Some(bank_code.clone()))
            }
        };

        let (single_consent_id, vrp_consent_id) = match &gate {
            PaymentGate::None => (None, None),
            PaymentGate::Single(id) => (Some(*id.as_uuid()), None),
            PaymentGate::Vrp(id) => (None, Some(*id.as_uuid())),
        };

        sqlx::query(
            r#"
            INSERT INTO payments
                (id, source_account_id, destination_account_id, destination_external_number, destination_bank_code,
                 amount, currency, description, status, consent_id, vrp_consent_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'completed', $9, $10)
            "#,
        )
        .bind(payment_id)
        .bind(source.id.as_uuid())
        .bind(dest_account_id)
        .bind(&dest_external_number)
        .bind(&dest_bank_code)
        .bind(amount.to_decimal())
        .bind(amount.currency().code())
        .bind(description)
        .bind(single_consent_id)
        .bind(vrp_consent_id)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        if target_local.is_none() {
            self.capital
                .apply_delta_in_tx(&mut tx, own_bank_code, &amount.negate())
                .await?;

            sqlx::query(
                r#"
                INSERT INTO interbank_transfers (id, payment_id, direction, counterparty_bank_code, amount, currency, status)
                VALUES ($1, $2, 'outbound', $3, $4, $5, 'completed')
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(payment_id)
            .bind(dest_bank_code.as_deref().unwrap_or_default())
            .bind(amount.to_decimal())
            .bind(amount.currency().code())
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;
        }

        if let Some(id) = consent_id {
            self.consents.consume_in_tx(&mut tx, id).await?;
        }

        tx.commit().await.map_err(DbError::from)?;

        Ok(Payment {
            id: openbank_types::PaymentId::from_uuid(payment_id),
            source_account: source.id,
            destination,
            amount,
            description: description.to_string(),
            status: PaymentStatus::Completed,
            consent_id: single_consent_id.map(openbank_types::ConsentId::from_uuid),
            vrp_consent_id: vrp_consent_id.map(openbank_types::ConsentId::from_uuid),
            created_at: Utc::now(),
        })
    }

    /// Records an inbound inter-bank leg initiated by a counterparty bank
    /// (the `settle` collaborator of §4.3's "Inter-bank" note), crediting
    /// the local destination account and this bank's capital.
    pub async fn settle_inbound(
        &self,
        destination_account_no: &str,
        amount: Money,
        counterparty_bank_code: &str,
        own_bank_code: &str,
        description: &str,
    ) -> BankResult<InterbankTransfer> {
        let destination = self.find_active_by_number(destination_account_no).await?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let locked = lock_account(&mut tx, destination.id).await?;
        locked.ensure_active()?;
        update_balance(&mut tx, destination.id, &amount).await?;
        insert_transaction(
            &mut tx,
            destination.id,
            &format!("xfer-in-{}", Uuid::new_v4()),
            amount,
            openbank_types::TransactionDirection::Credit,
            "inter-bank transfer",
            description,
            None,
            None,
        )
        .await
        .map_err(BankError::from)?;

        self.capital.apply_delta_in_tx(&mut tx, own_bank_code, &amount).await?;

        // The real source leg lives at the counterparty bank; this payment
        // row exists to anchor the local ledger entry, so it points
        // `source_account_id` at the same local account as the credit.
        let payment_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO payments
                (id, source_account_id, destination_account_id, amount, currency, description, status)
            VALUES ($1, $2, $2, $3, $4, $5, 'completed')
            "#,
        )
        .bind(payment_id)
        .bind(destination.id.as_uuid())
        .bind(amount.to_decimal())
        .bind(amount.currency().code())
        .bind(description)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        let transfer_id = Uuid::new_v4();
        let row = sqlx::query_as::<_, crate::models::DbInterbankTransfer>(
            r#"
            INSERT INTO interbank_transfers (id, payment_id, direction, counterparty_bank_code, amount, currency, status)
            VALUES ($1, $2, 'inbound', $3, $4, $5, 'completed')
            RETURNING id, payment_id, direction, counterparty_bank_code, amount, currency, status, created_at
            "#,
        )
        .bind(transfer_id)
        .bind(payment_id)
        .bind(counterparty_bank_code)
        .bind(amount.to_decimal())
        .bind(amount.currency().code())
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;
        row.to_domain().map_err(BankError::from)
    }

    async fn find_active_by_number(&self, account_number: &str) -> BankResult<Account> {
        let account = self
            .find_by_number(account_number)
            .await?
            .ok_or(BankError::SourceNotFound)?;
        account.ensure_active()?;
        Ok(account)
    }

    async fn find_by_number(&self, account_number: &str) -> BankResult<Option<Account>> {
        let row = sqlx::query_as::<_, DbAccount>(
            "SELECT id, account_number, client_id, account_type, balance, currency, status, created_at FROM accounts WHERE account_number = $1",
        )
        .bind(account_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;
        row.map(|r| r.to_domain().map_err(BankError::from)).transpose()
    }

    /// §4.1/§4.3 consent gate: validates the declared gate against the
    /// current payment's parameters and the VRP guards, inside the
    /// caller's open transaction to avoid TOCTOU on the period sum/count.
    /// Returns the consent id to consume on success (only for `Single`).
    async fn apply_consent_gate(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        gate: &PaymentGate,
        source: &Account,
        target_local: Option<&Account>,
        destination: &PaymentDestination,
        amount: &Money,
    ) -> BankResult<Option<ConsentId>> {
        match gate {
            PaymentGate::None => Ok(None),
            PaymentGate::Single(consent_id) => {
                let consent = self.consents.find_by_id(*consent_id).await?;
                self.check_single_binding(&consent, source, target_local, destination, amount)?;
                Ok(Some(*consent_id))
            }
            PaymentGate::Vrp(consent_id) => {
                let consent = self.consents.find_by_id(*consent_id).await?;
                self.check_vrp_guards(tx, &consent, source, amount).await?;
                Ok(None)
            }
        }
    }

    fn check_single_binding(
        &self,
        consent: &Consent,
        source: &Account,
        target_local: Option<&Account>,
        destination: &PaymentDestination,
        amount: &Money,
    ) -> BankResult<()> {
        let now = Utc::now();
        match target_local {
            Some(target) => consent.check_payment_binding(&source.id, &target.id, amount, now),
            None => {
                if !consent.is_authorized(now) {
                    return Err(BankError::InvalidConsent);
                }
                match &consent.scope {
                    ConsentScope::Payment {
                        debtor_account,
                        amount: consent_amount,
                        ..
                    } => {
                        if *debtor_account != source.id {
                            return Err(BankError::ConsentMismatch("debtor account mismatch".into()));
                        }
                        if amount.currency() != consent_amount.currency() || amount.cents() > consent_amount.cents() {
                            return Err(BankError::ConsentMismatch("amount exceeds consent".into()));
                        }
                        let _ = destination;
                        Ok(())
                    }
                    _ => Err(BankError::ConsentMismatch("not a payment consent".into())),
                }
            }
        }
    }

    async fn check_vrp_guards(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        consent: &Consent,
        source: &Account,
        amount: &Money,
    ) -> BankResult<()> {
        let now = Utc::now();
        if !consent.is_authorized(now) {
            return Err(BankError::InvalidConsent);
        }
        let (src_acc, per_payment_cap, per_period_cap, period_kind, max_payments_count, valid_from, valid_to) =
            match &consent.scope {
                ConsentScope::Vrp {
                    source_account,
                    per_payment_cap,
                    per_period_cap,
                    period_kind,
                    max_payments_count,
                    valid_from,
                    valid_to,
                } => (
                    *source_account,
                    *per_payment_cap,
                    *per_period_cap,
                    *period_kind,
                    *max_payments_count,
                    *valid_from,
                    *valid_to,
                ),
                _ => return Err(BankError::ConsentMismatch("not a VRP consent".into())),
            };

        if src_acc != source.id {
            return Err(BankError::ConsentMismatch("source account mismatch".into()));
        }
        if now < valid_from || now >= valid_to {
            return Err(BankError::VrpLimitExceeded("outside the consent's validity window".into()));
        }
        if amount.currency() != per_payment_cap.currency() || amount.cents() > per_payment_cap.cents() {
            return Err(BankError::VrpLimitExceeded("exceeds per-payment cap".into()));
        }

        let (period_start, period_end) = period_kind.window_containing(now);
        let (used_sum, used_count) = self
            .consents
            .vrp_usage_in_tx(tx, consent.id, period_start, period_end, amount.currency())
            .await?;

        let projected = used_sum.checked_add(amount)?;
        if projected.cents() > per_period_cap.cents() {
            return Err(BankError::VrpLimitExceeded("exceeds per-period cap".into()));
        }
        if used_count + 1 > max_payments_count as i64 {
            return Err(BankError::VrpLimitExceeded("exceeds max payment count for the period".into()));
        }

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

async fn update_balance(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    account_id: AccountId,
    delta: &Money,
) -> BankResult<()> {
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
    use crate::repos::account::AccountRepo;
    use crate::repos::client::ClientRepo;
    use openbank_types::{AccountType, ClientId, ClientSegment, Currency};

    async fn seed_capital(pool: &PgPool, bank_code: &str, capital: &str) {
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
    async fn initiate_moves_funds_between_two_local_accounts(pool: PgPool) {
        let client_repo = ClientRepo::new(pool.clone());
        let account_repo = AccountRepo::new(pool.clone());
        let payment_repo = PaymentRepo::new(pool);

        let client = ClientId::new("demo-1");
        client_repo.create(client.clone(), "Demo", ClientSegment::Retail, None, None).await.unwrap();
        account_repo.create(&client, "acc-src", AccountType::Checking, Money::new(100_00, Currency::RUB)).await.unwrap();
        account_repo.create(&client, "acc-dst", AccountType::Checking, Money::zero(Currency::RUB)).await.unwrap();

        let payment = payment_repo
            .initiate("acc-src", "acc-dst", None, Money::new(40_00, Currency::RUB), "test transfer", PaymentGate::None, "bank1")
            .await
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Completed);

        let src = account_repo.find_by_number("acc-src").await.unwrap().unwrap();
        let dst = account_repo.find_by_number("acc-dst").await.unwrap().unwrap();
        assert_eq!(src.balance.cents(), 60_00);
        assert_eq!(dst.balance.cents(), 40_00);
    }

    #[sqlx::test]
    async fn settle_inbound_credits_the_destination_and_bank_capital(pool: PgPool) {
        seed_capital(&pool, "bank1", "100000.00").await;
        let client_repo = ClientRepo::new(pool.clone());
        let account_repo = AccountRepo::new(pool.clone());
        let capital_repo = BankCapitalRepo::new(pool.clone());
        let payment_repo = PaymentRepo::new(pool);

        let client = ClientId::new("demo-1");
        client_repo.create(client.clone(), "Demo", ClientSegment::Retail, None, None).await.unwrap();
        account_repo.create(&client, "acc-dst", AccountType::Checking, Money::zero(Currency::RUB)).await.unwrap();

        let transfer = payment_repo
            .settle_inbound("acc-dst", Money::new(5000_00, Currency::RUB), "bank2", "bank1", "inbound top-up")
            .await
            .unwrap();
        assert_eq!(transfer.direction, openbank_types::TransferDirection::Inbound);

        let dst = account_repo.find_by_number("acc-dst").await.unwrap().unwrap();
        assert_eq!(dst.balance.cents(), 5000_00);

        let capital = capital_repo.get("bank1").await.unwrap();
        assert_eq!(capital.capital.to_decimal(), rust_decimal::Decimal::new(10500000, 2));
    }
}
