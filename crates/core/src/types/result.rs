use serde::{Deserialize, Serialize};

// =============================================================================
// Backend Call Types
// =============================================================================

/// Identifier for an external AI capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Speech-to-text transcription.
    Speech,
    /// Image analysis / captioning.
    Vision,
    /// Question answering.
    Qa,
}

impl BackendKind {
    /// Stable name for logs and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Speech => "speech",
            BackendKind::Vision => "vision",
            BackendKind::Qa => "qa",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized input handed to a backend client.
///
/// Each client accepts exactly one variant; anything else is rejected as
/// invalid input without an outbound call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum BackendInput {
    /// Question text for QA.
    Text(String),
    /// Image reference for Vision.
    ImageRef(String),
    /// Audio reference for Speech.
    AudioRef(String),
}

/// Classification of a backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Worth retrying (connect errors, 5xx, rate limits).
    Transient,
    /// Not worth retrying (4xx, malformed backend response).
    Permanent,
    /// The input did not match the capability's expected shape.
    InvalidInput,
}

/// Terminal result of one backend invocation.
///
/// Produced once per invocation and never mutated afterwards. Ordinary
/// backend trouble is folded in here rather than surfaced as an error, so
/// the dispatcher can apply uniform handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BackendCallResult {
    Success {
        /// Normalized answer text (answer, caption, or transcript).
        answer: String,
        /// Backend-reported confidence in [0, 1].
        confidence: f64,
        /// Wall-clock latency of the call.
        latency_ms: u64,
    },
    Failure {
        kind: FailureKind,
        message: String,
    },
    TimedOut,
}

impl BackendCallResult {
    /// Whether this result is a success.
    pub fn is_success(&self) -> bool {
        matches!(self, BackendCallResult::Success { .. })
    }

    /// Whether the dispatcher may retry after this result.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BackendCallResult::Failure {
                kind: FailureKind::Transient,
                ..
            } | BackendCallResult::TimedOut
        )
    }

    /// Coarse outcome kind for logs and metrics.
    pub fn outcome_kind(&self) -> OutcomeKind {
        match self {
            BackendCallResult::Success { .. } => OutcomeKind::Success,
            BackendCallResult::Failure { kind, .. } => OutcomeKind::Failure(*kind),
            BackendCallResult::TimedOut => OutcomeKind::TimedOut,
        }
    }
}

/// One backend's terminal outcome within a dispatched request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendOutcome {
    /// Which backend produced this result.
    pub backend: BackendKind,
    /// The terminal call result.
    pub result: BackendCallResult,
    /// Invocation attempts made (0 when the backend was never invoked).
    pub attempts: u32,
}

// =============================================================================
// Aggregated Response
// =============================================================================

/// The unified response returned to the caller.
///
/// `results` preserves dispatch order; `degraded` is true whenever any
/// required backend did not end in success, or no usable answer could be
/// produced at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResponse {
    pub request_id: String,
    pub results: Vec<BackendOutcome>,
    pub primary_answer: String,
    pub degraded: bool,
}

// =============================================================================
// Observability Summary
// =============================================================================

/// Outcome kind without payload, safe for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    Failure(FailureKind),
    TimedOut,
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeKind::Success => f.write_str("success"),
            OutcomeKind::Failure(FailureKind::Transient) => f.write_str("transient_failure"),
            OutcomeKind::Failure(FailureKind::Permanent) => f.write_str("permanent_failure"),
            OutcomeKind::Failure(FailureKind::InvalidInput) => f.write_str("invalid_input"),
            OutcomeKind::TimedOut => f.write_str("timed_out"),
        }
    }
}

/// Per-request summary handed to the observability collaborator.
///
/// Carries outcome kinds only — never raw answer content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSummary {
    pub degraded: bool,
    pub deadline_exceeded: bool,
    pub backends: Vec<(BackendKind, OutcomeKind)>,
}

impl OutcomeSummary {
    /// Build a summary from an aggregated response.
    pub fn from_response(response: &AggregatedResponse, deadline_exceeded: bool) -> Self {
        Self {
            degraded: response.degraded,
            deadline_exceeded,
            backends: response
                .results
                .iter()
                .map(|o| (o.backend, o.result.outcome_kind()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_results() {
        assert!(BackendCallResult::TimedOut.is_retryable());
        assert!(BackendCallResult::Failure {
            kind: FailureKind::Transient,
            message: "503".into()
        }
        .is_retryable());
        assert!(!BackendCallResult::Failure {
            kind: FailureKind::Permanent,
            message: "bad response".into()
        }
        .is_retryable());
        assert!(!BackendCallResult::Success {
            answer: "ok".into(),
            confidence: 0.9,
            latency_ms: 12
        }
        .is_retryable());
    }

    #[test]
    fn summary_drops_raw_content() {
        let response = AggregatedResponse {
            request_id: "r1".into(),
            results: vec![BackendOutcome {
                backend: BackendKind::Qa,
                result: BackendCallResult::Success {
                    answer: "secret customer detail".into(),
                    confidence: 0.9,
                    latency_ms: 3,
                },
                attempts: 1,
            }],
            primary_answer: "secret customer detail".into(),
            degraded: false,
        };

        let summary = OutcomeSummary::from_response(&response, false);
        let rendered = serde_json::to_string(&summary).unwrap();
        assert!(!rendered.contains("secret"));
        assert_eq!(summary.backends, vec![(BackendKind::Qa, OutcomeKind::Success)]);
    }
}
