//! Shared data model for the support gateway.

mod plan;
mod request;
mod result;

pub use plan::{DispatchPlan, Necessity, PlanEntry};
pub use request::{Modality, Principal, SupportRequest};
pub use result::{
    AggregatedResponse, BackendCallResult, BackendInput, BackendKind, BackendOutcome, FailureKind,
    OutcomeKind, OutcomeSummary,
};
