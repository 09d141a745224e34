//! Deterministic merge of backend results into one response.

use helpdesk_core::config::AggregatorSettings;
use helpdesk_core::types::{
    AggregatedResponse, BackendCallResult, BackendKind, BackendOutcome, DispatchPlan, Modality,
    Necessity,
};

/// Merges per-backend results by precedence: QA > Vision caption >
/// Speech-only transcript > fixed fallback sentinel.
#[derive(Debug, Clone)]
pub struct ResponseAggregator {
    /// QA successes below this confidence fall through to the next source,
    /// but stay recorded verbatim in the result sequence.
    confidence_threshold: f64,
    /// Sentinel answer when no planned backend produced a usable one.
    fallback_answer: String,
}

impl ResponseAggregator {
    pub fn new(confidence_threshold: f64, fallback_answer: impl Into<String>) -> Self {
        Self {
            confidence_threshold,
            fallback_answer: fallback_answer.into(),
        }
    }

    pub fn from_settings(settings: &AggregatorSettings) -> Self {
        Self::new(settings.confidence_threshold, settings.fallback_answer.clone())
    }

    /// Whether an answer is the fallback sentinel.
    pub fn is_fallback(&self, answer: &str) -> bool {
        answer == self.fallback_answer
    }

    /// Merge `outcomes` (plan order preserved) into one response.
    pub fn aggregate(
        &self,
        request_id: &str,
        plan: &DispatchPlan,
        outcomes: Vec<BackendOutcome>,
    ) -> AggregatedResponse {
        let answer_of = |kind: BackendKind| -> Option<(&str, f64)> {
            outcomes.iter().find(|o| o.backend == kind).and_then(|o| match &o.result {
                BackendCallResult::Success {
                    answer, confidence, ..
                } => Some((answer.as_str(), *confidence)),
                _ => None,
            })
        };

        let qa_usable = answer_of(BackendKind::Qa)
            .filter(|(_, confidence)| *confidence >= self.confidence_threshold);
        let vision_usable =
            answer_of(BackendKind::Vision).filter(|_| plan.dominant == Modality::Image);
        let speech_usable =
            answer_of(BackendKind::Speech).filter(|_| plan.dominant == Modality::Audio);

        let primary_answer = qa_usable
            .or(vision_usable)
            .or(speech_usable)
            .map(|(answer, _)| answer.to_string())
            .unwrap_or_else(|| self.fallback_answer.clone());

        let required_missed = plan.entries.iter().any(|entry| {
            entry.necessity == Necessity::Required
                && !outcomes
                    .iter()
                    .find(|o| o.backend == entry.backend)
                    .map(|o| o.result.is_success())
                    .unwrap_or(false)
        });

        let degraded = required_missed || self.is_fallback(&primary_answer);

        AggregatedResponse {
            request_id: request_id.to_string(),
            results: outcomes,
            primary_answer,
            degraded,
        }
    }
}
