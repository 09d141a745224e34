//! Backend capability trait.

use std::time::Duration;

use async_trait::async_trait;

use crate::types::{BackendCallResult, BackendInput, BackendKind};

/// Adapter for one external AI capability (QA, Vision, or Speech).
///
/// Implementations are stateless with respect to requests and safe to share
/// across concurrent dispatches. One `invoke` makes at most one outbound
/// call; retry policy lives in the dispatcher, not here.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Which capability this client adapts.
    fn kind(&self) -> BackendKind;

    /// Invoke the backend with a normalized input.
    ///
    /// Returns within `timeout` or yields `BackendCallResult::TimedOut`.
    /// Ordinary backend errors come back as `Failure { kind, .. }` rather
    /// than an `Err`, so the dispatcher can apply uniform handling. An input
    /// variant that does not match the capability yields
    /// `Failure { kind: InvalidInput }` without any outbound call.
    async fn invoke(&self, input: &BackendInput, timeout: Duration) -> BackendCallResult;
}
