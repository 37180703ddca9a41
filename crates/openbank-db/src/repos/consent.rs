//! Consent Registry (§4.1): lifecycle of the five consent kinds and the
//! `check`/`consume` hot path the Mediator and Payment Engine call into.
//!
//! Grounded on `original_source/services/consent_service.py`'s
//! request/sign/revoke flow, generalized from the single
//! `account_access` kind there to the five kinds of `ConsentScope`, and
//! on `openibank-db::repos::wallet` for the row-locking style used by
//! `consume`.

use chrono::{DateTime, Utc};
use openbank_types::{
    BankError, BankResult, ClientId, Consent, ConsentId, ConsentRequest, ConsentRequestId,
    ConsentRequestStatus, ConsentScope, ConsentStatus, InstitutionId, Money, Permission,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{consent_status_str, parse_consent_status, DbConsent, DbConsentRequest};

pub struct ConsentRepo {
    pool: PgPool,
}

/// Outcome of §4.1 `request`: either an immediately authorized consent
/// (auto-approval) or a request awaiting the grantor's decision.
pub enum RequestOutcome {
    AutoApproved(Consent),
    AwaitingAuthorization(ConsentRequest),
}

impl ConsentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn scope_requires_permissions(scope: &ConsentScope) -> BankResult<()> {
        match scope {
            ConsentScope::AccountAccess { permissions } | ConsentScope::Offer { permissions, .. } => {
                if permissions.is_empty() {
                    return Err(BankError::InvalidScope);
                }
            }
            ConsentScope::Payment { amount, .. } => {
                if !amount.is_positive() {
                    return Err(BankError::InvalidScope);
                }
            }
            ConsentScope::Vrp {
                per_payment_cap,
                per_period_cap,
                max_payments_count,
                valid_from,
                valid_to,
                ..
            } => {
                if !per_payment_cap.is_positive()
                    || !per_period_cap.is_positive()
                    || *max_payments_count == 0
                    || valid_to <= valid_from
                {
                    return Err(BankError::InvalidScope);
                }
            }
            ConsentScope::ProductAgreement {
                can_read,
                can_open,
                can_close,
                ..
            } => {
                if !can_read && !can_open && !can_close {
                    return Err(BankError::InvalidScope);
                }
            }
        }
        Ok(())
    }

    /// §4.1 `request`. `auto_approve` is looked up by the caller against
    /// `BankSettingsRepo` for the consent kind so this method stays a
    /// pure state transition.
    pub async fn request(
        &self,
        grantor: &ClientId,
        grantee: &InstitutionId,
        grantee_name: &str,
        scope: ConsentScope,
        reason: &str,
        auto_approve: bool,
    ) -> BankResult<RequestOutcome> {
        Self::scope_requires_permissions(&scope)?;

        let request_row_id = Uuid::new_v4();
        let kind = scope.kind_name().to_string();
        let scope_json = serde_json::to_value(&scope).map_err(DbError::from)?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let status = if auto_approve { "approved" } else { "pending" };
        let responded_at = auto_approve.then(Utc::now);

        sqlx::query(
            r#"
            INSERT INTO consent_requests (id, grantor, grantee, grantee_name, kind, scope, reason, status, responded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(request_row_id)
        .bind(grantor.as_str())
        .bind(grantee.as_str())
        .bind(grantee_name)
        .bind(&kind)
        .bind(&scope_json)
        .bind(reason)
        .bind(status)
        .bind(responded_at)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        if !auto_approve {
            sqlx::query(
                r#"
                INSERT INTO notifications (id, client_id, kind, title, message, related_request_id, read)
                VALUES ($1, $2, 'consent_request', $3, $4, $5, FALSE)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(grantor.as_str())
            .bind(format!("Access request from {grantee_name}"))
            .bind(format!("{grantee_name} is requesting: {reason}"))
            .bind(request_row_id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

            tx.commit().await.map_err(DbError::from)?;

            let request_row = sqlx::query_as::<_, DbConsentRequest>(
                "SELECT id, grantor, grantee, grantee_name, kind, scope, reason, status, created_at, responded_at FROM consent_requests WHERE id = $1",
            )
            .bind(request_row_id)
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;
            return Ok(RequestOutcome::AwaitingAuthorization(
                request_row.to_domain().map_err(BankError::from)?,
            ));
        }

        let consent = self
            .create_authorized_consent(&mut tx, request_row_id, grantor, grantee, &kind, &scope)
            .await?;

        tx.commit().await.map_err(DbError::from)?;
        Ok(RequestOutcome::AutoApproved(consent))
    }

    async fn create_authorized_consent(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        request_id: Uuid,
        grantor: &ClientId,
        grantee: &InstitutionId,
        kind: &str,
        scope: &ConsentScope,
    ) -> BankResult<Consent> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(365);
        let scope_json = serde_json::to_value(scope).map_err(DbError::from)?;

        let row = sqlx::query_as::<_, DbConsent>(
            r#"
            INSERT INTO consents (id, request_id, grantor, grantee, status, kind, scope, created_at, status_updated_at, expires_at)
            VALUES ($1, $2, $3, $4, 'authorized', $5, $6, $7, $7, $8)
            RETURNING id, request_id, grantor, grantee, status, kind, scope, created_at, status_updated_at, expires_at, last_accessed_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request_id)
        .bind(grantor.as_str())
        .bind(grantee.as_str())
        .bind(kind)
        .bind(&scope_json)
        .bind(now)
        .bind(expires_at)
        .fetch_one(&mut **tx)
        .await
        .map_err(DbError::from)?;

        row.to_domain().map_err(BankError::from)
    }

    /// §4.1 `approve`.
    pub async fn approve(&self, request_id: ConsentRequestId, grantor: &ClientId) -> BankResult<Consent> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let request_row = sqlx::query_as::<_, DbConsentRequest>(
            "SELECT id, grantor, grantee, grantee_name, kind, scope, reason, status, created_at, responded_at FROM consent_requests WHERE id = $1 AND grantor = $2 FOR UPDATE",
        )
        .bind(request_id.as_uuid())
        .bind(grantor.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(DbError::from)?
        .ok_or(BankError::ConsentRequestNotFound)?;

        if request_row.status != "pending" {
            return Err(BankError::InvalidStatusTransition(format!(
                "request is {}, not pending",
                request_row.status
            )));
        }

        let scope: ConsentScope = serde_json::from_value(request_row.scope.clone()).map_err(DbError::from)?;
        let grantee = InstitutionId::new(request_row.grantee.clone());

        let consent = self
            .create_authorized_consent(&mut tx, request_row.id, grantor, &grantee, &request_row.kind, &scope)
            .await?;

        sqlx::query("UPDATE consent_requests SET status = 'approved', responded_at = $2 WHERE id = $1")
            .bind(request_id.as_uuid())
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;
        Ok(consent)
    }

    /// §4.1 `reject`.
    pub async fn reject(&self, request_id: ConsentRequestId, grantor: &ClientId) -> BankResult<ConsentRequest> {
        let row = sqlx::query_as::<_, DbConsentRequest>(
            r#"
            UPDATE consent_requests SET status = 'rejected', responded_at = $3
            WHERE id = $1 AND grantor = $2 AND status = 'pending'
            RETURNING id, grantor, grantee, grantee_name, kind, scope, reason, status, created_at, responded_at
            "#,
        )
        .bind(request_id.as_uuid())
        .bind(grantor.as_str())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or(BankError::ConsentRequestNotFound)?;
        row.to_domain().map_err(BankError::from)
    }

    /// §4.1 `revoke`: `Authorized -> Revoked`. Revoking an already-revoked
    /// consent is a no-op that returns the current state (§8
    /// "Round-trip / idempotence"), rather than an error.
    pub async fn revoke(&self, consent_id: ConsentId, grantor: &ClientId) -> BankResult<Consent> {
        let row = sqlx::query_as::<_, DbConsent>(
            r#"
            UPDATE consents SET status = 'revoked', status_updated_at = $3
            WHERE id = $1 AND grantor = $2 AND status = 'authorized'
            RETURNING id, request_id, grantor, grantee, status, kind, scope, created_at, status_updated_at, expires_at, last_accessed_at
            "#,
        )
        .bind(consent_id.as_uuid())
        .bind(grantor.as_str())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        match row {
            Some(row) => row.to_domain().map_err(BankError::from),
            None => {
                let current = self.find_by_id(consent_id).await?;
                if current.grantor != *grantor {
                    return Err(BankError::ConsentNotFound);
                }
                if current.status == ConsentStatus::Revoked {
                    Ok(current)
                } else {
                    Err(BankError::InvalidStatusTransition(format!(
                        "consent is {:?}, not authorized",
                        current.status
                    )))
                }
            }
        }
    }

    /// §4.1 `check`: the hot path. Lookup failures return `Ok(None)`,
    /// never an error — the caller (Mediator) decides the error shape.
    /// Updates `last_accessed_at` best-effort on success.
    pub async fn check(
        &self,
        grantee: &InstitutionId,
        grantor: &ClientId,
        required: &HashSet<Permission>,
        consent_id: Option<ConsentId>,
    ) -> BankResult<Option<Consent>> {
        let rows = sqlx::query_as::<_, DbConsent>(
            r#"
            SELECT id, request_id, grantor, grantee, status, kind, scope, created_at, status_updated_at, expires_at, last_accessed_at
            FROM consents
            WHERE grantee = $1 AND grantor = $2 AND status = 'authorized'
            "#,
        )
        .bind(grantee.as_str())
        .bind(grantor.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        let now = Utc::now();
        for row in rows {
            let consent = match row.to_domain() {
                Ok(c) => c,
                Err(_) => continue,
            };
            if let Some(want) = consent_id {
                if consent.id != want {
                    continue;
                }
            }
            if consent.satisfies(required, now) {
                let _ = sqlx::query("UPDATE consents SET last_accessed_at = $2 WHERE id = $1")
                    .bind(consent.id.as_uuid())
                    .bind(now)
                    .execute(&self.pool)
                    .await;
                return Ok(Some(consent));
            }
        }
        Ok(None)
    }

    pub async fn find_by_id(&self, consent_id: ConsentId) -> BankResult<Consent> {
        let row = sqlx::query_as::<_, DbConsent>(
            "SELECT id, request_id, grantor, grantee, status, kind, scope, created_at, status_updated_at, expires_at, last_accessed_at FROM consents WHERE id = $1",
        )
        .bind(consent_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or(BankError::ConsentNotFound)?;
        row.to_domain().map_err(BankError::from)
    }

    /// §4.1 `consume`: only for payment consents, `Authorized -> Consumed`,
    /// idempotent failure on an already-consumed consent. Callers that
    /// need this inside a larger ACID transaction (the Payment Engine)
    /// use `consume_in_tx` instead so it participates in their `debit`.
    pub async fn consume(&self, consent_id: ConsentId) -> BankResult<Consent> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let consent = self.consume_in_tx(&mut tx, consent_id).await?;
        tx.commit().await.map_err(DbError::from)?;
        Ok(consent)
    }

    pub async fn consume_in_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        consent_id: ConsentId,
    ) -> BankResult<Consent> {
        let row = sqlx::query_as::<_, DbConsent>(
            r#"
            UPDATE consents SET status = 'consumed', status_updated_at = $2
            WHERE id = $1 AND status = 'authorized'
            RETURNING id, request_id, grantor, grantee, status, kind, scope, created_at, status_updated_at, expires_at, last_accessed_at
            "#,
        )
        .bind(consent_id.as_uuid())
        .bind(Utc::now())
        .fetch_optional(&mut **tx)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| BankError::InvalidStatusTransition("consent already consumed or not authorized".into()))?;
        row.to_domain().map_err(BankError::from)
    }

    /// §4.1 VRP guards 2 and 3: sum and count of executed payments in the
    /// calendar-aligned period, run inside the caller's payment
    /// transaction to avoid TOCTOU against guard 1/4.
    pub async fn vrp_usage_in_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        vrp_consent_id: ConsentId,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        currency: openbank_types::Currency,
    ) -> BankResult<(Money, i64)> {
        let row: (Option<Decimal>, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(amount), 0), COUNT(*)
            FROM payments
            WHERE vrp_consent_id = $1 AND status = 'completed' AND created_at >= $2 AND created_at < $3
            "#,
        )
        .bind(vrp_consent_id.as_uuid())
        .bind(period_start)
        .bind(period_end)
        .fetch_one(&mut **tx)
        .await
        .map_err(DbError::from)?;

        let sum = Money::from_decimal(row.0.unwrap_or_default(), currency).map_err(BankError::from)?;
        Ok((sum, row.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips() {
        for s in [
            ConsentStatus::AwaitingAuthorization,
            ConsentStatus::Authorized,
            ConsentStatus::Consumed,
            ConsentStatus::Rejected,
            ConsentStatus::Revoked,
            ConsentStatus::Expired,
        ] {
            assert_eq!(parse_consent_status(consent_status_str(s)).unwrap(), s);
        }
    }
}
