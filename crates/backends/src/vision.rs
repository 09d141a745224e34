//! Image-analysis capability adapter.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use helpdesk_core::config::BackendEndpoint;
use helpdesk_core::traits::BackendClient;
use helpdesk_core::types::{BackendCallResult, BackendInput, BackendKind, FailureKind};

use crate::http::HttpCapability;

#[derive(Serialize)]
struct VisionWireRequest<'a> {
    image_ref: &'a str,
}

#[derive(Deserialize)]
struct VisionWireResponse {
    caption: String,
    #[serde(default = "default_confidence")]
    confidence: f64,
}

fn default_confidence() -> f64 {
    1.0
}

/// Adapter for the image-analysis backend.
pub struct VisionClient {
    http: HttpCapability,
}

impl VisionClient {
    pub fn new(endpoint: BackendEndpoint) -> Self {
        Self {
            http: HttpCapability::new(endpoint),
        }
    }
}

#[async_trait]
impl BackendClient for VisionClient {
    fn kind(&self) -> BackendKind {
        BackendKind::Vision
    }

    async fn invoke(&self, input: &BackendInput, timeout: Duration) -> BackendCallResult {
        let image_ref = match input {
            BackendInput::ImageRef(image_ref) => image_ref,
            _ => {
                return BackendCallResult::Failure {
                    kind: FailureKind::InvalidInput,
                    message: "vision backend expects an image reference".to_string(),
                }
            }
        };

        tracing::debug!("Invoking vision backend");

        self.http
            .post_json(
                &VisionWireRequest { image_ref },
                timeout,
                |body: VisionWireResponse, latency_ms| BackendCallResult::Success {
                    answer: body.caption,
                    confidence: body.confidence,
                    latency_ms,
                },
            )
            .await
    }
}
