//! OpenBank sandbox server.
//!
//! Boots the Consent & Authorization Core and the Inter-Bank Payment
//! Engine behind a single Axum router: loads configuration, connects to
//! Postgres/Redis, runs migrations, wires up the token service, and
//! serves `openbank_api::create_router` until asked to shut down.
//!
//! Grounded on `services/openibank-api-server/src/main.rs`.

mod config;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use openbank_api::{create_router, AppState};
use openbank_auth::TokenService;
use openbank_db::Database;

use crate::config::ServerConfig;

/// OpenBank sandbox server
#[derive(Parser, Debug)]
#[command(name = "openbank-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a configuration file (TOML, JSON, or YAML)
    #[arg(short, long, env = "OPENBANK_CONFIG")]
    config: Option<String>,

    /// Host to bind to
    #[arg(long, env = "OPENBANK_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "OPENBANK_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "OPENBANK_LOG_LEVEL")]
    log_level: Option<String>,

    /// This bank's own code, used to route inter-bank payment legs
    #[arg(long, env = "OPENBANK_BANK_CODE")]
    bank_code: Option<String>,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Redis connection URL
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// JWT signing secret
    #[arg(long, env = "JWT_SECRET")]
    jwt_secret: Option<String>,

    /// Allow the default JWT secret (development only)
    #[arg(long, env = "OPENBANK_DEV_MODE")]
    dev_mode: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut server_config = ServerConfig::load(args.config.as_deref())?;

    if let Some(host) = args.host {
        server_config.server.host = host;
    }
    if let Some(port) = args.port {
        server_config.server.port = port;
    }
    if let Some(level) = args.log_level {
        server_config.logging.level = level;
    }
    if let Some(bank_code) = args.bank_code {
        server_config.own_bank_code = bank_code;
    }
    if let Some(db_url) = args.database_url {
        server_config.database.postgres_url = db_url;
    }
    if let Some(redis_url) = args.redis_url {
        server_config.database.redis_url = redis_url;
    }
    if let Some(jwt_secret) = args.jwt_secret {
        server_config.auth.jwt_secret = jwt_secret;
    }

    init_logging(&server_config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bank_code = %server_config.own_bank_code,
        "starting openbank-server"
    );

    validate_config(&server_config, args.dev_mode)?;

    let db = init_database(&server_config).await?;
    let auth = TokenService::new(server_config.auth.to_token_service_config());
    let state = AppState::new(db, auth, server_config.own_bank_code.clone());
    let app = create_router(state);

    let addr = server_config.server.socket_addr();
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(server_config.server.shutdown_timeout()))
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

fn init_logging(config: &config::LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => subscriber.with(fmt::layer().json().with_target(true)).init(),
        _ => subscriber.with(fmt::layer().pretty().with_target(true)).init(),
    }

    Ok(())
}

fn validate_config(config: &ServerConfig, dev_mode: bool) -> anyhow::Result<()> {
    if !dev_mode && config.auth.jwt_secret == "change-me-in-production" {
        anyhow::bail!("JWT secret must be changed in production. Set JWT_SECRET or pass --dev-mode.");
    }
    if config.own_bank_code.trim().is_empty() {
        anyhow::bail!("own_bank_code must not be empty");
    }
    Ok(())
}

async fn init_database(config: &ServerConfig) -> anyhow::Result<Database> {
    tracing::info!("connecting to storage...");
    let db = Database::connect(&config.database.to_db_config()).await?;

    if config.database.run_migrations {
        db.migrate().await?;
    }

    let health = db.health_check().await?;
    if !health.healthy {
        anyhow::bail!("database health check failed: {health:?}");
    }
    tracing::info!(postgres = health.postgres, redis = health.redis, "storage ready");

    Ok(db)
}

async fn shutdown_signal(timeout: std::time::Duration) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }

    tracing::info!(timeout_secs = timeout.as_secs(), "waiting for in-flight requests");
    tokio::time::sleep(timeout).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_port_override() {
        let args = Args::parse_from(["openbank-server", "--port", "8080"]);
        assert_eq!(args.port, Some(8080));
    }

    #[test]
    fn rejects_default_jwt_secret_outside_dev_mode() {
        let config = ServerConfig::default();
        assert!(validate_config(&config, false).is_err());
        assert!(validate_config(&config, true).is_ok());
    }
}
