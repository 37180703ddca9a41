//! End-to-end scenarios over the real HTTP surface (spec.md §8, literal
//! scenarios 1-6), each run against a fresh per-test Postgres database
//! with migrations applied.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use openbank_api::state::AppState;
use openbank_auth::{TokenClass, TokenService, TokenServiceConfig};
use openbank_db::Database;
use openbank_types::{AccountType, ClientId, ClientSegment, Currency, Money};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

const OWN_BANK_CODE: &str = "bank1";

fn test_database(pool: PgPool) -> Database {
    let redis_cfg = deadpool_redis::Config::from_url("redis://127.0.0.1:1/0");
    let redis = redis_cfg
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .expect("lazy redis pool construction never dials out");
    Database { pg: pool, redis }
}

fn test_auth() -> TokenService {
    TokenService::new(TokenServiceConfig {
        secret: "integration-test-secret".to_string(),
        ..TokenServiceConfig::default()
    })
}

async fn seed_client(db: &Database, id: &str) -> ClientId {
    let client_id = ClientId::new(id);
    db.client_repo()
        .create(client_id.clone(), id, ClientSegment::Retail, None, None)
        .await
        .expect("seed client");
    client_id
}

async fn seed_bank_capital(pool: &PgPool, bank_code: &str, capital: &str, currency: &str) {
    sqlx::query("INSERT INTO bank_capital (bank_code, capital, initial_capital, total_deposits, total_loans, currency) VALUES ($1, $2, $2, 0, 0, $3)")
        .bind(bank_code)
        .bind(capital.parse::<rust_decimal::Decimal>().unwrap())
        .bind(currency)
        .execute(pool)
        .await
        .expect("seed bank capital");
}

async fn json_request(
    router: axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri).header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let body = match body {
        Some(v) => Body::from(serde_json::to_vec(&v).unwrap()),
        None => Body::empty(),
    };
    let response = router.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Scenario 1: intra-bank self-payment, happy path.
#[sqlx::test(migrations = "../openbank-db/migrations")]
async fn intra_bank_self_payment_moves_the_full_amount(pool: PgPool) {
    let db = test_database(pool);
    let auth = test_auth();
    let client = seed_client(&db, "demo-1").await;

    let source = db
        .account_repo()
        .create(&client, "acc-100", AccountType::Checking, Money::from_major(dec!(1000.00), Currency::RUB).unwrap())
        .await
        .unwrap();
    let dest = db
        .account_repo()
        .create(&client, "acc-101", AccountType::Checking, Money::zero(Currency::RUB))
        .await
        .unwrap();

    let token = auth.issue(TokenClass::Client, client.as_str()).unwrap();
    let state = AppState::new(db, auth, OWN_BANK_CODE);
    let router = openbank_api::create_router(state.clone());

    let (status, body) = json_request(
        router,
        "POST",
        "/api/v1/payments",
        Some(&token),
        &[],
        Some(json!({
            "from_account_number": "acc-100",
            "to_account_number": "acc-101",
            "amount": {"amount": "250.00", "currency": "RUB"},
            "description": "rent"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "completed");

    let refreshed_source = state.db.account_repo().find_by_id(source.id).await.unwrap();
    let refreshed_dest = state.db.account_repo().find_by_id(dest.id).await.unwrap();
    assert_eq!(refreshed_source.balance.to_decimal(), dec!(750.00));
    assert_eq!(refreshed_dest.balance.to_decimal(), dec!(250.00));
}

#[sqlx::test(migrations = "../openbank-db/migrations")]
async fn third_party_read_without_consent_is_denied(pool: PgPool) {
    let db = test_database(pool);
    let auth = test_auth();
    let client = seed_client(&db, "demo-1").await;
    db.account_repo()
        .create(&client, "acc-200", AccountType::Checking, Money::zero(Currency::RUB))
        .await
        .unwrap();

    let institution_token = auth.issue(TokenClass::Institution, "team200").unwrap();
    let state = AppState::new(db, auth, OWN_BANK_CODE);
    let router = openbank_api::create_router(state);

    let (status, body) = json_request(
        router,
        "GET",
        "/api/v1/accounts?client_id=demo-1",
        Some(&institution_token),
        &[("x-requesting-institution", "team200")],
        None,
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "CONSENT_REQUIRED");
    assert!(body["hint"].as_str().unwrap().contains("ReadAccountsDetail"));
}

#[sqlx::test(migrations = "../openbank-db/migrations")]
async fn third_party_read_with_authorized_consent_succeeds(pool: PgPool) {
    let db = test_database(pool);
    let auth = test_auth();
    let client = seed_client(&db, "demo-1").await;
    db.account_repo()
        .create(&client, "acc-300", AccountType::Checking, Money::zero(Currency::RUB))
        .await
        .unwrap();

    let client_token = auth.issue(TokenClass::Client, client.as_str()).unwrap();
    let institution_token = auth.issue(TokenClass::Institution, "team200").unwrap();
    let state = AppState::new(db, auth, OWN_BANK_CODE);
    let router = openbank_api::create_router(state);

    let (status, body) = json_request(
        router.clone(),
        "POST",
        "/api/v1/account-consents/request",
        Some(&client_token),
        &[],
        Some(json!({
            "grantee": "team200",
            "grantee_name": "Team 200",
            "reason": "read my accounts",
            "scope": {"kind": "account_access", "permissions": ["ReadAccountsDetail"]}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let consent_id = body["data"]["id"].as_str().expect("auto-approved consent").to_string();

    let (status, body) = json_request(
        router,
        "GET",
        "/api/v1/accounts?client_id=demo-1",
        Some(&institution_token),
        &[("x-requesting-institution", "team200"), ("x-consent-id", &consent_id)],
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../openbank-db/migrations")]
async fn payment_consent_is_single_shot(pool: PgPool) {
    let db = test_database(pool);
    let auth = test_auth();
    let client = seed_client(&db, "demo-1").await;
    db.account_repo()
        .create(&client, "acc-100", AccountType::Checking, Money::from_major(dec!(1000.00), Currency::RUB).unwrap())
        .await
        .unwrap();

    let source = db
        .account_repo()
        .find_active_source("acc-100")
        .await
        .unwrap();

    let client_token = auth.issue(TokenClass::Client, client.as_str()).unwrap();
    let institution_token = auth.issue(TokenClass::Institution, "team200").unwrap();
    let state = AppState::new(db, auth, OWN_BANK_CODE);
    let router = openbank_api::create_router(state);

    let (status, body) = json_request(
        router.clone(),
        "POST",
        "/api/v1/payment-consents/request",
        Some(&client_token),
        &[],
        Some(json!({
            "grantee": "team200",
            "grantee_name": "Team 200",
            "reason": "one-off payment",
            "scope": {
                "kind": "payment",
                "debtor_account": source.id.to_string(),
                "creditor_account": openbank_types::AccountId::new().to_string(),
                "creditor_name": "External",
                "amount": {"amount": "500.00", "currency": "RUB"},
                "reference": "invoice-1"
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let consent_id = body["data"]["id"].as_str().unwrap().to_string();

    let pay_body = json!({
        "from_account_number": "acc-100",
        "to_account_number": "acc-999",
        "to_bank_code": "bank2",
        "amount": {"amount": "500.00", "currency": "RUB"},
        "description": "invoice-1"
    });

    let (status, body) = json_request(
        router.clone(),
        "POST",
        "/api/v1/payments",
        Some(&institution_token),
        &[("x-requesting-institution", "team200"), ("x-payment-consent-id", &consent_id)],
        Some(pay_body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = json_request(
        router,
        "POST",
        "/api/v1/payments",
        Some(&institution_token),
        &[("x-requesting-institution", "team200"), ("x-payment-consent-id", &consent_id)],
        Some(pay_body),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
}

#[sqlx::test(migrations = "../openbank-db/migrations")]
async fn loan_open_then_close_returns_capital_to_its_starting_point(pool: PgPool) {
    seed_bank_capital(&pool, OWN_BANK_CODE, "100000.00", "RUB").await;
    let db = test_database(pool);
    let auth = test_auth();
    let client = seed_client(&db, "demo-1").await;
    let funding = db
        .account_repo()
        .create(&client, "acc-checking", AccountType::Checking, Money::from_major(dec!(50000.00), Currency::RUB).unwrap())
        .await
        .unwrap();

    let product = db
        .product_repo()
        .create(
            openbank_types::ProductKind::Loan,
            "Personal Loan",
            Money::from_major(dec!(1000.00), Currency::RUB).unwrap(),
            Money::from_major(dec!(20000.00), Currency::RUB).unwrap(),
        )
        .await
        .unwrap();

    let client_token = auth.issue(TokenClass::Client, client.as_str()).unwrap();
    let state = AppState::new(db, auth, OWN_BANK_CODE);
    let router = openbank_api::create_router(state.clone());

    let (status, body) = json_request(
        router.clone(),
        "POST",
        "/api/v1/product-agreements",
        Some(&client_token),
        &[],
        Some(json!({
            "product_id": product.id.to_string(),
            "principal": {"amount": "10000.00", "currency": "RUB"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let agreement_id = body["data"]["id"].as_str().unwrap().to_string();

    let capital_after_open = state.db.capital_repo().get(OWN_BANK_CODE).await.unwrap();
    assert_eq!(capital_after_open.capital.to_decimal(), dec!(90000.00));
    assert_eq!(capital_after_open.total_loans.to_decimal(), dec!(10000.00));

    let (status, body) = json_request(
        router,
        "POST",
        &format!("/api/v1/product-agreements/{agreement_id}/close"),
        Some(&client_token),
        &[],
        Some(json!({"repayment_source": funding.id.to_string()})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let capital_after_close = state.db.capital_repo().get(OWN_BANK_CODE).await.unwrap();
    assert_eq!(capital_after_close.capital.to_decimal(), dec!(100000.00));
    assert_eq!(capital_after_close.total_loans.to_decimal(), dec!(0));
}

/// Scenario 5: a VRP consent capped at 5000.00 per payment and 20000.00
/// per period admits four payments and rejects the fifth on the period cap.
#[sqlx::test(migrations = "../openbank-db/migrations")]
async fn vrp_period_cap_rejects_the_fifth_payment(pool: PgPool) {
    let db = test_database(pool);
    let auth = test_auth();
    let client = seed_client(&db, "demo-1").await;
    let source = db
        .account_repo()
        .create(&client, "acc-vrp-source", AccountType::Checking, Money::from_major(dec!(100000.00), Currency::RUB).unwrap())
        .await
        .unwrap();

    let client_token = auth.issue(TokenClass::Client, client.as_str()).unwrap();
    let institution_token = auth.issue(TokenClass::Institution, "team200").unwrap();
    let state = AppState::new(db, auth, OWN_BANK_CODE);
    let router = openbank_api::create_router(state);

    let (status, body) = json_request(
        router.clone(),
        "POST",
        "/api/v1/vrp-consents/request",
        Some(&client_token),
        &[],
        Some(json!({
            "grantee": "team200",
            "grantee_name": "Team 200",
            "reason": "recurring top-ups",
            "scope": {
                "kind": "vrp",
                "source_account": source.id.to_string(),
                "per_payment_cap": {"amount": "5000.00", "currency": "RUB"},
                "per_period_cap": {"amount": "20000.00", "currency": "RUB"},
                "period_kind": "month",
                "max_payments_count": 10,
                "valid_from": "2026-01-01T00:00:00Z",
                "valid_to": "2030-01-01T00:00:00Z"
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let consent_id = body["data"]["id"].as_str().expect("auto-approved consent").to_string();

    for i in 0..4 {
        let (status, body) = json_request(
            router.clone(),
            "POST",
            "/api/v1/payments/vrp",
            Some(&institution_token),
            &[("x-requesting-institution", "team200"), ("x-payment-consent-id", &consent_id)],
            Some(json!({
                "to_account_number": "acc-external",
                "to_bank_code": "bank2",
                "amount": {"amount": "5000.00", "currency": "RUB"},
                "description": format!("top-up {i}")
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "payment {i}: {body}");
    }

    let (status, body) = json_request(
        router,
        "POST",
        "/api/v1/payments/vrp",
        Some(&institution_token),
        &[("x-requesting-institution", "team200"), ("x-payment-consent-id", &consent_id)],
        Some(json!({
            "to_account_number": "acc-external",
            "to_bank_code": "bank2",
            "amount": {"amount": "5000.00", "currency": "RUB"},
            "description": "fifth top-up"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(body["error"], "INVALID_CONSENT");
}
