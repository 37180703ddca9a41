//! Authorization Mediator (§4.2): the single per-call
//! `(caller, operation, subject) -> decision` chokepoint every resource
//! component calls before a read or write crosses the API boundary.
//!
//! Grounded on `openibank-auth::middleware`'s `AuthenticatedUser`/
//! extractor pattern, generalized from "is there a session" to "does a
//! consent satisfy this operation's permission set", and modeled as a
//! tagged decision value per §9 ("Dynamic per-call type branching") so
//! handlers match on `MediatorDecision` instead of branching on token
//! class inline.

pub mod decision;
pub mod operation;

pub use decision::{Mediator, MediatorDecision};
pub use operation::{Operation, TargetKind};
