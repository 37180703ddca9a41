//! Route tables, grouped by resource (§6).

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/accounts", account_routes())
        .nest("/cards", card_routes())
        .nest("/account-consents", consent_routes("account_access"))
        .nest("/payment-consents", consent_routes("payment"))
        .nest("/product-agreement-consents", consent_routes("product_agreement"))
        .nest("/vrp-consents", consent_routes("vrp"))
        .nest("/offer-consents", consent_routes("offer"))
        .nest("/consents", consent_management_routes())
        .nest("/consent-requests", consent_request_routes())
        .nest("/notifications", notification_routes())
        .nest("/payments", payment_routes())
        .nest("/products", product_routes())
        .nest("/product-agreements", product_agreement_routes())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/client-token", post(handlers::tokens::issue_client_token))
        .route("/institution-token", post(handlers::tokens::issue_institution_token))
        .route("/staff-token", post(handlers::tokens::issue_staff_token))
}

fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::accounts::list_accounts).post(handlers::accounts::create_account))
        .route("/{id}", get(handlers::accounts::get_account))
        .route("/{id}/close", post(handlers::accounts::close_account))
        .route("/{id}/balance", get(handlers::accounts::get_balance))
        .route("/{id}/transactions", get(handlers::accounts::get_transactions))
        .route("/{id}/cards", get(handlers::cards::list_cards))
}

fn card_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::cards::issue_card))
        .route("/{id}/status", post(handlers::cards::update_card_status))
}

/// Every consent kind shares the same request shape (§4.1); `_kind` only
/// documents the mount point, since the body's `scope.kind` drives the
/// actual branch.
fn consent_routes(_kind: &'static str) -> Router<AppState> {
    Router::new().route("/request", post(handlers::consents::request_consent))
}

fn consent_management_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(handlers::consents::get_consent))
        .route("/{id}/revoke", post(handlers::consents::revoke_consent))
}

fn consent_request_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}/approve", post(handlers::consents::approve_consent))
        .route("/{id}/reject", post(handlers::consents::reject_consent))
}

fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::notifications::list_unread))
        .route("/{id}/read", post(handlers::notifications::mark_read))
}

fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::payments::initiate_payment))
        .route("/vrp", post(handlers::payments::initiate_vrp_payment))
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::products::list_products).post(handlers::products::create_product))
}

fn product_agreement_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::products::list_agreements).post(handlers::products::open_agreement))
        .route("/{id}", get(handlers::products::get_agreement))
        .route("/{id}/close", post(handlers::products::close_agreement))
}
