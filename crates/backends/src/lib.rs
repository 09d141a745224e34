#![deny(unused)]
//! Backend capability adapters for the helpdesk gateway.
//!
//! One HTTP adapter per external AI capability (QA, Vision, Speech). Each
//! adapter translates a normalized input into its backend's wire shape and
//! normalizes whatever comes back into a `BackendCallResult`, so the
//! dispatcher never sees backend-specific fields.

mod http;
mod qa;
mod speech;
mod vision;

use std::collections::HashMap;
use std::sync::Arc;

use helpdesk_core::config::BackendsConfig;
use helpdesk_core::traits::BackendClient;
use helpdesk_core::types::BackendKind;

pub use qa::QaClient;
pub use speech::SpeechClient;
pub use vision::VisionClient;

/// Build the three capability clients from configuration.
pub fn clients_from_config(config: &BackendsConfig) -> HashMap<BackendKind, Arc<dyn BackendClient>> {
    let mut clients: HashMap<BackendKind, Arc<dyn BackendClient>> = HashMap::new();
    clients.insert(BackendKind::Qa, Arc::new(QaClient::new(config.qa.clone())));
    clients.insert(
        BackendKind::Vision,
        Arc::new(VisionClient::new(config.vision.clone())),
    );
    clients.insert(
        BackendKind::Speech,
        Arc::new(SpeechClient::new(config.speech.clone())),
    );
    clients
}
