//! Bank settings repository (§4.1 "Auto-approval policy"): the
//! `auto_approve_<kind>` flags the Consent Registry reads before
//! deciding whether `request` fires `approve` atomically.
//!
//! Grounded on `original_source/services/consent_service.py`'s single
//! `auto_approve_consents` key/value row, generalized to one boolean per
//! consent kind per `BankSettings` table (§3 "process-wide configuration
//! flag").

use openbank_types::BankResult;
use sqlx::PgPool;

use crate::error::DbError;
use crate::models::DbBankSettings;

pub struct BankSettingsRepo {
    pool: PgPool,
}

impl BankSettingsRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, bank_code: &str) -> BankResult<DbBankSettings> {
        let row = sqlx::query_as::<_, DbBankSettings>(
            r#"
            SELECT bank_code, auto_approve_account_access, auto_approve_payment,
                   auto_approve_product_agreement, auto_approve_vrp, auto_approve_offer
            FROM bank_settings
            WHERE bank_code = $1
            "#,
        )
        .bind(bank_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .unwrap_or(DbBankSettings {
            bank_code: bank_code.to_string(),
            auto_approve_account_access: true,
            auto_approve_payment: true,
            auto_approve_product_agreement: true,
            auto_approve_vrp: true,
            auto_approve_offer: true,
        });
        Ok(row)
    }

    /// §4.1's `auto_approve_<kind>` lookup for a given `ConsentScope::kind_name()`.
    pub fn auto_approve_for_kind(settings: &DbBankSettings, kind: &str) -> bool {
        match kind {
            "account_access" => settings.auto_approve_account_access,
            "payment" => settings.auto_approve_payment,
            "product_agreement" => settings.auto_approve_product_agreement,
            "vrp" => settings.auto_approve_vrp,
            "offer" => settings.auto_approve_offer,
            _ => true,
        }
    }

    pub async fn set_auto_approve(&self, bank_code: &str, kind: &str, value: bool) -> BankResult<()> {
        let column = match kind {
            "account_access" => "auto_approve_account_access",
            "payment" => "auto_approve_payment",
            "product_agreement" => "auto_approve_product_agreement",
            "vrp" => "auto_approve_vrp",
            "offer" => "auto_approve_offer",
            other => return Err(openbank_types::BankError::validation(format!("unknown consent kind: {other}"))),
        };
        let sql = format!("UPDATE bank_settings SET {column} = $2 WHERE bank_code = $1");
        sqlx::query(&sql)
            .bind(bank_code)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_approve_defaults_true_for_every_known_kind() {
        let settings = DbBankSettings {
            bank_code: "bank1".into(),
            auto_approve_account_access: true,
            auto_approve_payment: true,
            auto_approve_product_agreement: true,
            auto_approve_vrp: true,
            auto_approve_offer: true,
        };
        for kind in ["account_access", "payment", "product_agreement", "vrp", "offer"] {
            assert!(BankSettingsRepo::auto_approve_for_kind(&settings, kind));
        }
    }
}
