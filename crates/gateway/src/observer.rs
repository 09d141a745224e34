//! Outcome recording for the observability collaborator.

use helpdesk_core::traits::OutcomeObserver;
use helpdesk_core::types::OutcomeSummary;

/// Observer that emits a structured tracing event and bumps metrics.
///
/// Emission is synchronous but cheap (no I/O on the response path); sinks
/// are wired up externally via the tracing subscriber and the metrics
/// recorder.
#[derive(Default)]
pub struct TracingObserver;

impl TracingObserver {
    pub fn new() -> Self {
        Self
    }
}

impl OutcomeObserver for TracingObserver {
    fn record(&self, request_id: &str, summary: &OutcomeSummary) {
        tracing::info!(
            request_id = %request_id,
            degraded = summary.degraded,
            deadline_exceeded = summary.deadline_exceeded,
            backends = ?summary.backends,
            "Recorded request outcome"
        );

        metrics::counter!("support_requests_total").increment(1);
        if summary.degraded {
            metrics::counter!("support_requests_degraded_total").increment(1);
        }
        if summary.deadline_exceeded {
            metrics::counter!("support_requests_deadline_exceeded_total").increment(1);
        }
        for (backend, outcome) in &summary.backends {
            metrics::counter!(
                "backend_outcomes_total",
                "backend" => backend.as_str(),
                "outcome" => outcome.to_string()
            )
            .increment(1);
        }
    }
}
