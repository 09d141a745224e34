//! Capability traits at the seams of the gateway.

mod backend;
mod identity;
mod observe;

pub use backend::BackendClient;
pub use identity::{AuthOutcome, IdentityProvider};
pub use observe::OutcomeObserver;
