//! Shared application state, grounded on `openibank-api::state::AppState`.

use std::sync::Arc;

use openbank_db::Database;
use openbank_mediator::Mediator;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub auth: Arc<openbank_auth::TokenService>,
    pub mediator: Arc<Mediator>,
    /// This bank's own code (§6 "Configuration"), used to route inter-bank
    /// payment legs and to locate this bank's own capital row.
    pub own_bank_code: Arc<str>,
}

impl AppState {
    pub fn new(db: Database, auth: openbank_auth::TokenService, own_bank_code: impl Into<Arc<str>>) -> Self {
        let mediator = Mediator::new(db.consent_repo());
        Self {
            db: Arc::new(db),
            auth: Arc::new(auth),
            mediator: Arc::new(mediator),
            own_bank_code: own_bank_code.into(),
        }
    }
}
