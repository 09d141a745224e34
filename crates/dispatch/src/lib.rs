#![deny(unused)]
//! Dispatch and aggregation layer for the helpdesk gateway.
//!
//! The dispatcher executes a `DispatchPlan` against the backend clients with
//! bounded concurrency, per-call timeouts, retry with backoff, and a global
//! deadline. The aggregator then merges whatever terminal results exist into
//! one response. Dispatcher collects, aggregator decides.

pub mod aggregator;
pub mod dispatcher;

pub use aggregator::ResponseAggregator;
pub use dispatcher::{DispatchOutcome, DispatchPolicy, Dispatcher};
