//! Mock implementations of core traits for testing.
//!
//! These scripted mocks are shared across the workspace so dispatcher,
//! aggregator, and gateway tests can run against deterministic backends
//! without any network.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::traits::{AuthOutcome, BackendClient, IdentityProvider, OutcomeObserver};
use crate::types::{
    BackendCallResult, BackendInput, BackendKind, FailureKind, OutcomeSummary, Principal,
};

// =============================================================================
// Call Log
// =============================================================================

/// Shared record of backend invocations, in invocation order.
///
/// Cloning shares the underlying log, so one log can observe several mocks.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<(BackendKind, BackendInput)>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, backend: BackendKind, input: BackendInput) {
        self.calls.lock().unwrap().push((backend, input));
    }

    /// All invocations so far.
    pub fn invocations(&self) -> Vec<(BackendKind, BackendInput)> {
        self.calls.lock().unwrap().clone()
    }

    /// Backends invoked, in order.
    pub fn backends(&self) -> Vec<BackendKind> {
        self.calls.lock().unwrap().iter().map(|(b, _)| *b).collect()
    }

    /// Total number of invocations.
    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of invocations of one backend.
    pub fn count_for(&self, backend: BackendKind) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(b, _)| *b == backend)
            .count()
    }
}

// =============================================================================
// Mock Backend
// =============================================================================

/// Scripted backend that returns predefined results.
///
/// Results are consumed front-to-back; the last one repeats once the script
/// runs dry, so a single-entry script behaves like a constant backend.
pub struct MockBackend {
    kind: BackendKind,
    script: Mutex<Vec<BackendCallResult>>,
    log: CallLog,
    delay: Option<Duration>,
}

impl MockBackend {
    /// Create a mock with a queue of results.
    pub fn scripted(kind: BackendKind, script: Vec<BackendCallResult>, log: CallLog) -> Self {
        Self {
            kind,
            script: Mutex::new(script),
            log,
            delay: None,
        }
    }

    /// A backend that always succeeds with the given answer.
    pub fn succeeding(kind: BackendKind, answer: &str, confidence: f64, log: CallLog) -> Self {
        Self::scripted(
            kind,
            vec![BackendCallResult::Success {
                answer: answer.to_string(),
                confidence,
                latency_ms: 5,
            }],
            log,
        )
    }

    /// A backend that always fails with the given kind.
    pub fn failing(kind: BackendKind, failure: FailureKind, log: CallLog) -> Self {
        Self::scripted(
            kind,
            vec![BackendCallResult::Failure {
                kind: failure,
                message: "mock failure".to_string(),
            }],
            log,
        )
    }

    /// A backend that never responds within any timeout.
    pub fn hanging(kind: BackendKind, log: CallLog) -> Self {
        Self::scripted(kind, Vec::new(), log).with_delay(Duration::from_secs(3600))
    }

    /// Delay every response by `delay`; responses slower than the caller's
    /// timeout come back as `TimedOut`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn next_result(&self) -> BackendCallResult {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.remove(0)
        } else {
            script.first().cloned().unwrap_or(BackendCallResult::Success {
                answer: "mock answer".to_string(),
                confidence: 1.0,
                latency_ms: 1,
            })
        }
    }

    fn input_matches(&self, input: &BackendInput) -> bool {
        matches!(
            (self.kind, input),
            (BackendKind::Qa, BackendInput::Text(_))
                | (BackendKind::Vision, BackendInput::ImageRef(_))
                | (BackendKind::Speech, BackendInput::AudioRef(_))
        )
    }
}

#[async_trait]
impl BackendClient for MockBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn invoke(&self, input: &BackendInput, timeout: Duration) -> BackendCallResult {
        if !self.input_matches(input) {
            return BackendCallResult::Failure {
                kind: FailureKind::InvalidInput,
                message: format!("{} backend got mismatched input", self.kind),
            };
        }

        self.log.push(self.kind, input.clone());

        if let Some(delay) = self.delay {
            if delay >= timeout {
                tokio::time::sleep(timeout).await;
                return BackendCallResult::TimedOut;
            }
            tokio::time::sleep(delay).await;
        }

        self.next_result()
    }
}

// =============================================================================
// Mock Identity Provider
// =============================================================================

/// Identity provider backed by a fixed token table.
#[derive(Default)]
pub struct MockIdentity {
    tokens: HashMap<String, String>,
}

impl MockIdentity {
    /// A provider that rejects every token.
    pub fn denying() -> Self {
        Self::default()
    }

    /// A provider accepting one token for one subject.
    pub fn allowing(token: &str, subject: &str) -> Self {
        let mut tokens = HashMap::new();
        tokens.insert(token.to_string(), subject.to_string());
        Self { tokens }
    }
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn validate(&self, token: &str) -> AuthOutcome {
        match self.tokens.get(token) {
            Some(subject) => AuthOutcome::Authorized(Principal::new(subject)),
            None => AuthOutcome::Unauthenticated,
        }
    }
}

// =============================================================================
// Mock Observer
// =============================================================================

/// Observer that records every summary it receives.
#[derive(Default)]
pub struct MockObserver {
    records: Mutex<Vec<(String, OutcomeSummary)>>,
}

impl MockObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded summaries.
    pub fn recorded(&self) -> Vec<(String, OutcomeSummary)> {
        self.records.lock().unwrap().clone()
    }
}

impl OutcomeObserver for MockObserver {
    fn record(&self, request_id: &str, summary: &OutcomeSummary) {
        self.records
            .lock()
            .unwrap()
            .push((request_id.to_string(), summary.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_backend_consumes_results_in_order() {
        let log = CallLog::new();
        let backend = MockBackend::scripted(
            BackendKind::Qa,
            vec![
                BackendCallResult::Failure {
                    kind: FailureKind::Transient,
                    message: "503".into(),
                },
                BackendCallResult::Success {
                    answer: "recovered".into(),
                    confidence: 0.8,
                    latency_ms: 2,
                },
            ],
            log.clone(),
        );

        let input = BackendInput::Text("hello".into());
        let first = backend.invoke(&input, Duration::from_secs(1)).await;
        assert!(first.is_retryable());

        let second = backend.invoke(&input, Duration::from_secs(1)).await;
        assert!(second.is_success());
        assert_eq!(log.count_for(BackendKind::Qa), 2);
    }

    #[tokio::test]
    async fn mismatched_input_is_rejected_without_logging() {
        let log = CallLog::new();
        let backend = MockBackend::succeeding(BackendKind::Vision, "a cat", 0.9, log.clone());

        let result = backend
            .invoke(&BackendInput::Text("not an image".into()), Duration::from_secs(1))
            .await;

        assert!(matches!(
            result,
            BackendCallResult::Failure {
                kind: FailureKind::InvalidInput,
                ..
            }
        ));
        assert_eq!(log.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_backend_times_out() {
        let log = CallLog::new();
        let backend = MockBackend::hanging(BackendKind::Speech, log);

        let result = backend
            .invoke(
                &BackendInput::AudioRef("https://blobs.example.com/a.wav".into()),
                Duration::from_millis(50),
            )
            .await;

        assert_eq!(result, BackendCallResult::TimedOut);
    }
}
