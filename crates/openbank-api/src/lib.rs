//! OpenBank API - the Axum HTTP surface for the Consent & Authorization
//! Core and the Inter-Bank Payment Engine (§6).

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use state::AppState;

/// §5 "Cancellation and timeouts": every request is bounded by a fixed
/// wall-clock timeout regardless of what it's doing underneath.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .nest("/api/v1", routes::api_v1_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(cors)
        .with_state(state)
}
