//! OpenBank Database Layer
//!
//! Persistence for the consent, ledger, and payment domains using
//! PostgreSQL, with Redis reserved for notification/consent
//! read-through caching.
//!
//! # Repository Pattern
//!
//! Each domain has its own repository. `Database::connect` wires up the
//! pools; `Database::<domain>_repo()` hands out a cheap, clonable-pool
//! handle to callers (the Mediator, the API layer) without exposing
//! `sqlx`/`deadpool_redis` types across the crate boundary.

pub mod config;
pub mod error;
pub mod models;
pub mod repos;

use deadpool_redis::{Config as RedisConfig, Pool as RedisPool, Runtime};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

pub use config::DatabaseConfig;
pub use error::{DbError, DbResult};
pub use models::*;
pub use repos::*;

/// Database connection pool and caches.
pub struct Database {
    pub pg: PgPool,
    pub redis: RedisPool,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        info!("Connecting to PostgreSQL: {}", config.postgres_url_masked());

        let pg = PgPoolOptions::new()
            .max_connections(config.pg_max_connections)
            .min_connections(config.pg_min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.pg_acquire_timeout_secs))
            .connect(&config.postgres_url)
            .await
            .map_err(|e| DbError::Connection(format!("PostgreSQL: {e}")))?;

        info!("Connected to PostgreSQL");

        info!("Connecting to Redis: {}", config.redis_url_masked());

        let redis_cfg = RedisConfig::from_url(&config.redis_url);
        let redis = redis_cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| DbError::Connection(format!("Redis: {e}")))?;

        let mut conn = redis
            .get()
            .await
            .map_err(|e| DbError::Connection(format!("Redis pool: {e}")))?;
        let _: String = deadpool_redis::redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| DbError::Connection(format!("Redis ping: {e}")))?;

        info!("Connected to Redis");

        Ok(Self { pg, redis })
    }

    pub async fn migrate(&self) -> DbResult<()> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pg)
            .await
            .map_err(|e| DbError::Migration(e.to_string()))?;
        info!("Migrations complete");
        Ok(())
    }

    pub async fn health_check(&self) -> DbResult<HealthStatus> {
        let postgres = sqlx::query("SELECT 1").fetch_one(&self.pg).await.is_ok();

        let redis = async {
            let mut conn = self.redis.get().await.ok()?;
            let result: Result<String, _> = deadpool_redis::redis::cmd("PING").query_async(&mut *conn).await;
            result.ok()
        }
        .await
        .is_some();

        Ok(HealthStatus {
            postgres,
            redis,
            healthy: postgres && redis,
        })
    }

    pub fn account_repo(&self) -> AccountRepo {
        AccountRepo::new(self.pg.clone())
    }

    pub fn card_repo(&self) -> CardRepo {
        CardRepo::new(self.pg.clone())
    }

    pub fn client_repo(&self) -> ClientRepo {
        ClientRepo::new(self.pg.clone())
    }

    pub fn consent_repo(&self) -> ConsentRepo {
        ConsentRepo::new(self.pg.clone())
    }

    pub fn payment_repo(&self) -> PaymentRepo {
        PaymentRepo::new(self.pg.clone())
    }

    pub fn product_repo(&self) -> ProductRepo {
        ProductRepo::new(self.pg.clone())
    }

    pub fn product_agreement_repo(&self) -> ProductAgreementRepo {
        ProductAgreementRepo::new(self.pg.clone())
    }

    pub fn capital_repo(&self) -> BankCapitalRepo {
        BankCapitalRepo::new(self.pg.clone())
    }

    pub fn notification_repo(&self) -> NotificationRepo {
        NotificationRepo::new(self.pg.clone())
    }

    pub fn bank_settings_repo(&self) -> BankSettingsRepo {
        BankSettingsRepo::new(self.pg.clone())
    }
}

/// Health status of the database connections.
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub postgres: bool,
    pub redis: bool,
    pub healthy: bool,
}
