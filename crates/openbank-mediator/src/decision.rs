//! The decision algorithm (§4.2) and its tagged result.

use openbank_auth::{TokenClass, VerifiedToken};
use openbank_db::ConsentRepo;
use openbank_types::{BankError, BankResult, ClientId, Consent, ConsentId, InstitutionId};

use crate::operation::Operation;

/// The outcome of a Mediator decision. Resource components match on this
/// instead of branching on token class inline (§9 "Dynamic per-call type
/// branching").
#[derive(Debug, Clone)]
pub enum MediatorDecision {
    /// The caller is the client acting on themselves.
    AllowClient,
    /// A third-party institution, authorized by the given consent.
    AllowInstitution(Consent),
    /// An internal operator performing a back-office action.
    AllowStaff,
    /// Not authorized, with a human-readable reason.
    Deny { reason: String },
}

/// The single per-call authorization chokepoint. Never reads resource
/// state beyond the consent it is deciding over — callers consult it
/// before any read or write crosses the API boundary.
pub struct Mediator {
    consents: ConsentRepo,
}

impl Mediator {
    pub fn new(consents: ConsentRepo) -> Self {
        Self { consents }
    }

    /// §4.2's decision algorithm for `op` on subject client `subject`.
    ///
    /// `requesting_institution` is the `X-Requesting-Institution` header
    /// value, required (and matched against the token's `sub`) for
    /// institution-class tokens. `consent_id` is an optional header
    /// naming the specific consent to check against.
    pub async fn decide(
        &self,
        token: &VerifiedToken,
        op: Operation,
        subject: &ClientId,
        requesting_institution: Option<&InstitutionId>,
        consent_id: Option<ConsentId>,
    ) -> BankResult<MediatorDecision> {
        match token.class {
            TokenClass::Client => {
                if token.subject == subject.as_str() {
                    Ok(MediatorDecision::AllowClient)
                } else {
                    Ok(MediatorDecision::Deny {
                        reason: "client token does not match the requested subject".into(),
                    })
                }
            }
            TokenClass::Institution => {
                let institution = InstitutionId::new(token.subject.clone());
                match requesting_institution {
                    Some(header) if header.as_str() == institution.as_str() => {
                        let required = op.permissions();
                        match self.consents.check(&institution, subject, &required, consent_id).await? {
                            Some(consent) => Ok(MediatorDecision::AllowInstitution(consent)),
                            None => Ok(MediatorDecision::Deny {
                                reason: format!(
                                    "no {} consent grants {:?} to {institution}",
                                    op.target_kind_name(),
                                    required
                                ),
                            }),
                        }
                    }
                    _ => Ok(MediatorDecision::Deny {
                        reason: "X-Requesting-Institution header missing or does not match token subject".into(),
                    }),
                }
            }
            TokenClass::Staff => {
                if op.is_back_office() {
                    Ok(MediatorDecision::AllowStaff)
                } else {
                    Ok(MediatorDecision::Deny {
                        reason: "staff tokens may only perform back-office actions".into(),
                    })
                }
            }
        }
    }
}

impl MediatorDecision {
    /// Converts a deny into the API error envelope (§4.2's
    /// `CONSENT_REQUIRED` hint for the institution path, plain `Forbidden`
    /// otherwise).
    pub fn into_result(self, institution_hint: Option<String>) -> BankResult<MediatorDecision> {
        match self {
            MediatorDecision::Deny { reason } => match institution_hint {
                Some(hint) => Err(BankError::ConsentRequired { hint }),
                None => {
                    tracing::debug!(%reason, "mediator denied");
                    Err(BankError::Forbidden)
                }
            },
            allowed => Ok(allowed),
        }
    }
}

impl Operation {
    fn target_kind_name(&self) -> &'static str {
        match self.target_kind() {
            crate::operation::TargetKind::Account => "account",
            crate::operation::TargetKind::Balance => "balance",
            crate::operation::TargetKind::Transaction => "transaction",
            crate::operation::TargetKind::Card => "card",
            crate::operation::TargetKind::Payment => "payment",
            crate::operation::TargetKind::Vrp => "vrp",
            crate::operation::TargetKind::ProductAgreement => "product_agreement",
            crate::operation::TargetKind::Product => "product",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A pool that never actually connects — fine for decision paths that
    /// return before touching storage (client self-access, staff denial).
    fn unconnected_pool() -> sqlx::PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/openbank_test_unused")
            .expect("lazy pool construction does not dial out")
    }

    fn client_token(subject: &str) -> VerifiedToken {
        VerifiedToken {
            class: TokenClass::Client,
            subject: subject.to_string(),
            jti: "jti-1".into(),
            expires_at_unix: i64::MAX,
        }
    }

    #[tokio::test]
    async fn client_acting_on_themselves_is_allowed_without_consent() {
        let pool = unconnected_pool();
        let mediator = Mediator::new(ConsentRepo::new(pool));
        let token = client_token("demo-1");
        let decision = mediator
            .decide(&token, Operation::GetBalance, &ClientId::new("demo-1"), None, None)
            .await
            .unwrap();
        assert!(matches!(decision, MediatorDecision::AllowClient));
    }

    #[tokio::test]
    async fn client_acting_on_another_client_is_denied() {
        let pool = unconnected_pool();
        let mediator = Mediator::new(ConsentRepo::new(pool));
        let token = client_token("demo-1");
        let decision = mediator
            .decide(&token, Operation::GetBalance, &ClientId::new("demo-2"), None, None)
            .await
            .unwrap();
        assert!(matches!(decision, MediatorDecision::Deny { .. }));
    }

    #[tokio::test]
    async fn staff_token_denied_on_non_back_office_operation() {
        let pool = unconnected_pool();
        let mediator = Mediator::new(ConsentRepo::new(pool));
        let token = VerifiedToken {
            class: TokenClass::Staff,
            subject: "operator-1".into(),
            jti: "jti-2".into(),
            expires_at_unix: i64::MAX,
        };
        let decision = mediator
            .decide(&token, Operation::GetBalance, &ClientId::new("demo-1"), None, None)
            .await
            .unwrap();
        assert!(matches!(decision, MediatorDecision::Deny { .. }));
    }
}
