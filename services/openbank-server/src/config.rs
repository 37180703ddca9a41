//! Server configuration: environment variables, an optional config file,
//! then CLI flags, in that order of increasing precedence.
//!
//! Grounded on `openibank-api-server::config::ServerConfig`, trimmed to
//! this sandbox's surface (no TLS, no separate metrics port, no optional
//! Redis block — `openbank-db`'s `DatabaseConfig` already carries
//! `redis_url` alongside `postgres_url`).

use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    /// This bank's own code (spec.md §6 "Configuration"): routes
    /// inter-bank payment legs and names this bank's capital row.
    #[serde(default = "default_bank_code")]
    pub own_bank_code: String,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("invalid socket address")
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub postgres_url: String,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl DatabaseSettings {
    pub fn to_db_config(&self) -> openbank_db::DatabaseConfig {
        openbank_db::DatabaseConfig {
            postgres_url: self.postgres_url.clone(),
            redis_url: self.redis_url.clone(),
            pg_max_connections: self.max_connections,
            pg_min_connections: self.min_connections,
            pg_acquire_timeout_secs: self.connect_timeout_secs,
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            postgres_url: "postgresql://localhost/openbank".to_string(),
            redis_url: default_redis_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    #[serde(default = "default_jwt_issuer")]
    pub jwt_issuer: String,
    #[serde(default = "default_jwt_audience")]
    pub jwt_audience: String,
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_secs: u64,
}

impl AuthSettings {
    pub fn to_token_service_config(&self) -> openbank_auth::TokenServiceConfig {
        openbank_auth::TokenServiceConfig {
            secret: self.jwt_secret.clone(),
            token_lifetime: Duration::from_secs(self.token_lifetime_secs),
            issuer: self.jwt_issuer.clone(),
            audience: self.jwt_audience.clone(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me-in-production".to_string(),
            jwt_issuer: default_jwt_issuer(),
            jwt_audience: default_jwt_audience(),
            token_lifetime_secs: default_token_lifetime(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_request_timeout() -> u64 {
    30
}
fn default_shutdown_timeout() -> u64 {
    30
}
fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    2
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_jwt_issuer() -> String {
    "openbank".to_string()
}
fn default_jwt_audience() -> String {
    "openbank-api".to_string()
}
fn default_token_lifetime() -> u64 {
    24 * 60 * 60
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}
fn default_bank_code() -> String {
    "bank1".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            database: DatabaseSettings::default(),
            auth: AuthSettings::default(),
            own_bank_code: default_bank_code(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Environment variables (`OPENBANK__SECTION__FIELD`) over an
    /// optional config file over built-in defaults.
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        builder = builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("OPENBANK")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        let server_config: ServerConfig = config.try_deserialize()?;
        Ok(server_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_settings_default_bind_address_parses() {
        let settings = ServerSettings::default();
        assert_eq!(settings.socket_addr().port(), 3000);
    }

    #[test]
    fn database_settings_map_onto_the_db_crate_config() {
        let settings = DatabaseSettings {
            postgres_url: "postgresql://x/y".to_string(),
            ..DatabaseSettings::default()
        };
        let db_config = settings.to_db_config();
        assert_eq!(db_config.postgres_url, "postgresql://x/y");
        assert_eq!(db_config.pg_max_connections, 20);
    }
}
