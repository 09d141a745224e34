//! External identity collaborator.

use async_trait::async_trait;

use crate::types::Principal;

/// Result of validating a caller's credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Credential accepted; the gateway acts for this principal.
    Authorized(Principal),
    /// Credential rejected or unverifiable.
    Unauthenticated,
}

/// Token validation, delegated to an external identity provider.
///
/// Called exactly once per request, before any backend work. Implementations
/// fail closed: if the provider cannot be reached, the outcome is
/// `Unauthenticated`.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn validate(&self, token: &str) -> AuthOutcome;
}
