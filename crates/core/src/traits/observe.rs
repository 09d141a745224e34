//! External observability collaborator.

use crate::types::OutcomeSummary;

/// Fire-and-forget outcome recording.
///
/// `record` must not block the response path; implementations that ship
/// summaries elsewhere do so on their own task.
pub trait OutcomeObserver: Send + Sync {
    fn record(&self, request_id: &str, summary: &OutcomeSummary);
}
