use serde::{Deserialize, Serialize};

use super::request::{Modality, SupportRequest};
use super::result::BackendKind;

// =============================================================================
// Dispatch Plan
// =============================================================================

/// Whether a planned backend must succeed for a non-degraded response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Necessity {
    Required,
    Optional,
}

/// One backend in a dispatch plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub backend: BackendKind,
    pub necessity: Necessity,
}

/// Per-request decision of which backends to call and with what necessity.
///
/// Derived deterministically from the request's modalities and discarded
/// after dispatch. The Speech→QA transcript dependency is an explicit
/// property of the plan rather than implicit call-order coupling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchPlan {
    /// Planned backends in dispatch order: Speech, Vision, QA.
    pub entries: Vec<PlanEntry>,
    /// The modality that dominates answer precedence for this request.
    pub dominant: Modality,
}

impl DispatchPlan {
    /// Compute the plan for a request.
    ///
    /// Text → QA required. Image → Vision required. Audio → Speech required,
    /// and QA required as the consumer of the transcript.
    pub fn for_request(request: &SupportRequest) -> Self {
        let modalities = request.modalities();
        let has_text = modalities.contains(&Modality::Text);
        let has_image = modalities.contains(&Modality::Image);
        let has_audio = modalities.contains(&Modality::Audio);

        let mut entries = Vec::with_capacity(3);
        if has_audio {
            entries.push(PlanEntry {
                backend: BackendKind::Speech,
                necessity: Necessity::Required,
            });
        }
        if has_image {
            entries.push(PlanEntry {
                backend: BackendKind::Vision,
                necessity: Necessity::Required,
            });
        }
        if has_text || has_audio {
            entries.push(PlanEntry {
                backend: BackendKind::Qa,
                necessity: Necessity::Required,
            });
        }

        let dominant = if has_text {
            Modality::Text
        } else if has_image {
            Modality::Image
        } else {
            Modality::Audio
        };

        Self { entries, dominant }
    }

    /// Whether the plan includes the given backend.
    pub fn contains(&self, backend: BackendKind) -> bool {
        self.entries.iter().any(|e| e.backend == backend)
    }

    /// Necessity of the given backend, if planned.
    pub fn necessity(&self, backend: BackendKind) -> Option<Necessity> {
        self.entries
            .iter()
            .find(|e| e.backend == backend)
            .map(|e| e.necessity)
    }

    /// Whether Speech must complete before QA is invoked.
    pub fn speech_feeds_qa(&self) -> bool {
        self.contains(BackendKind::Speech) && self.contains(BackendKind::Qa)
    }
}
