pub mod accounts;
pub mod cards;
pub mod consents;
pub mod notifications;
pub mod payments;
pub mod products;
pub mod tokens;

use openbank_auth::TokenClass;
use openbank_mediator::{MediatorDecision, Operation};
use openbank_types::{BankResult, ClientId};

use crate::extractors::AuthContext;
use crate::state::AppState;

/// The one authorization chokepoint every handler calls through: run the
/// Mediator's decision, then collapse a denial into the right error shape
/// for the caller's token class (§4.2, §9).
pub async fn authorize(
    state: &AppState,
    ctx: &AuthContext,
    op: Operation,
    subject: &ClientId,
) -> BankResult<MediatorDecision> {
    let decision = state
        .mediator
        .decide(
            &ctx.token,
            op,
            subject,
            ctx.requesting_institution.as_ref(),
            ctx.consent_id,
        )
        .await?;

    let hint = (ctx.token.class == TokenClass::Institution).then(|| {
        let required = op.permissions();
        format!("request a consent granting {required:?} for this subject")
    });

    decision.into_result(hint)
}
