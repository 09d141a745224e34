#![deny(unused)]
//! HTTP boundary for the helpdesk gateway.
//!
//! This crate provides the public entry point: credential validation via the
//! external identity collaborator, request-shape validation, dispatch and
//! aggregation, and the mapping of outcomes onto HTTP status codes.

pub mod identity;
pub mod observer;
pub mod server;
pub mod telemetry;

pub use identity::{provider_from_config, HttpIdentityProvider, StaticTokenProvider};
pub use observer::TracingObserver;
pub use server::{GatewayConfig, GatewayServer, SupportPayload};
pub use telemetry::configure_tracing;
