//! Question-answering capability adapter.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use helpdesk_core::config::BackendEndpoint;
use helpdesk_core::traits::BackendClient;
use helpdesk_core::types::{BackendCallResult, BackendInput, BackendKind, FailureKind};

use crate::http::HttpCapability;

#[derive(Serialize)]
struct QaWireRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct QaWireResponse {
    answer: String,
    #[serde(default = "default_confidence")]
    confidence: f64,
}

fn default_confidence() -> f64 {
    1.0
}

/// Adapter for the question-answering backend.
pub struct QaClient {
    http: HttpCapability,
}

impl QaClient {
    pub fn new(endpoint: BackendEndpoint) -> Self {
        Self {
            http: HttpCapability::new(endpoint),
        }
    }
}

#[async_trait]
impl BackendClient for QaClient {
    fn kind(&self) -> BackendKind {
        BackendKind::Qa
    }

    async fn invoke(&self, input: &BackendInput, timeout: Duration) -> BackendCallResult {
        let query = match input {
            BackendInput::Text(query) => query,
            other => {
                return BackendCallResult::Failure {
                    kind: FailureKind::InvalidInput,
                    message: format!("QA backend expects text input, got {:?}", variant_name(other)),
                }
            }
        };

        tracing::debug!(query_len = query.len(), "Invoking QA backend");

        self.http
            .post_json(
                &QaWireRequest { query },
                timeout,
                |body: QaWireResponse, latency_ms| BackendCallResult::Success {
                    answer: body.answer,
                    confidence: body.confidence,
                    latency_ms,
                },
            )
            .await
    }
}

fn variant_name(input: &BackendInput) -> &'static str {
    match input {
        BackendInput::Text(_) => "text",
        BackendInput::ImageRef(_) => "image_ref",
        BackendInput::AudioRef(_) => "audio_ref",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/v1/answer", addr)
    }

    #[tokio::test]
    async fn normalizes_backend_answer() {
        let url = serve(Router::new().route(
            "/v1/answer",
            post(|| async {
                Json(serde_json::json!({ "answer": "Reset via settings.", "confidence": 0.92 }))
            }),
        ))
        .await;

        let client = QaClient::new(BackendEndpoint { url, api_key: None });
        let result = client
            .invoke(
                &BackendInput::Text("how do I reset my password".into()),
                Duration::from_secs(2),
            )
            .await;

        match result {
            BackendCallResult::Success {
                answer, confidence, ..
            } => {
                assert_eq!(answer, "Reset via settings.");
                assert!((confidence - 0.92).abs() < f64::EPSILON);
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn server_error_maps_to_transient() {
        let url = serve(Router::new().route(
            "/v1/answer",
            post(|| async { axum::http::StatusCode::SERVICE_UNAVAILABLE }),
        ))
        .await;

        let client = QaClient::new(BackendEndpoint { url, api_key: None });
        let result = client
            .invoke(&BackendInput::Text("hello".into()), Duration::from_secs(2))
            .await;

        assert!(matches!(
            result,
            BackendCallResult::Failure {
                kind: FailureKind::Transient,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn undecodable_body_maps_to_permanent() {
        let url = serve(Router::new().route(
            "/v1/answer",
            post(|| async { Json(serde_json::json!({ "unexpected": true })) }),
        ))
        .await;

        let client = QaClient::new(BackendEndpoint { url, api_key: None });
        let result = client
            .invoke(&BackendInput::Text("hello".into()), Duration::from_secs(2))
            .await;

        assert!(matches!(
            result,
            BackendCallResult::Failure {
                kind: FailureKind::Permanent,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn rejects_non_text_input_without_calling_out() {
        let client = QaClient::new(BackendEndpoint {
            // Unroutable on purpose: the call must never leave the adapter.
            url: "http://127.0.0.1:1/v1/answer".into(),
            api_key: None,
        });

        let result = client
            .invoke(
                &BackendInput::ImageRef("https://blobs.example.com/x.png".into()),
                Duration::from_secs(1),
            )
            .await;

        assert!(matches!(
            result,
            BackendCallResult::Failure {
                kind: FailureKind::InvalidInput,
                ..
            }
        ));
    }
}
