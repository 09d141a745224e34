//! Speech-to-text capability adapter.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use helpdesk_core::config::BackendEndpoint;
use helpdesk_core::traits::BackendClient;
use helpdesk_core::types::{BackendCallResult, BackendInput, BackendKind, FailureKind};

use crate::http::HttpCapability;

#[derive(Serialize)]
struct SpeechWireRequest<'a> {
    audio_ref: &'a str,
}

#[derive(Deserialize)]
struct SpeechWireResponse {
    transcript: String,
    // Transcription services rarely score whole utterances; treat a missing
    // score as full confidence.
    #[serde(default = "default_confidence")]
    confidence: f64,
}

fn default_confidence() -> f64 {
    1.0
}

/// Adapter for the speech-to-text backend.
pub struct SpeechClient {
    http: HttpCapability,
}

impl SpeechClient {
    pub fn new(endpoint: BackendEndpoint) -> Self {
        Self {
            http: HttpCapability::new(endpoint),
        }
    }
}

#[async_trait]
impl BackendClient for SpeechClient {
    fn kind(&self) -> BackendKind {
        BackendKind::Speech
    }

    async fn invoke(&self, input: &BackendInput, timeout: Duration) -> BackendCallResult {
        let audio_ref = match input {
            BackendInput::AudioRef(audio_ref) => audio_ref,
            _ => {
                return BackendCallResult::Failure {
                    kind: FailureKind::InvalidInput,
                    message: "speech backend expects an audio reference".to_string(),
                }
            }
        };

        tracing::debug!("Invoking speech backend");

        self.http
            .post_json(
                &SpeechWireRequest { audio_ref },
                timeout,
                |body: SpeechWireResponse, latency_ms| BackendCallResult::Success {
                    answer: body.transcript,
                    confidence: body.confidence,
                    latency_ms,
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};

    #[tokio::test]
    async fn normalizes_transcript_into_answer() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let router = Router::new().route(
                "/v1/transcribe",
                post(|| async {
                    Json(serde_json::json!({ "transcript": "my order never arrived" }))
                }),
            );
            axum::serve(listener, router).await.unwrap();
        });

        let client = SpeechClient::new(BackendEndpoint {
            url: format!("http://{}/v1/transcribe", addr),
            api_key: None,
        });

        let result = client
            .invoke(
                &BackendInput::AudioRef("https://blobs.example.com/clip.wav".into()),
                Duration::from_secs(2),
            )
            .await;

        match result {
            BackendCallResult::Success {
                answer, confidence, ..
            } => {
                assert_eq!(answer, "my order never arrived");
                assert!((confidence - 1.0).abs() < f64::EPSILON);
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn rejects_text_input() {
        let client = SpeechClient::new(BackendEndpoint {
            url: "http://127.0.0.1:1/v1/transcribe".into(),
            api_key: None,
        });

        let result = client
            .invoke(&BackendInput::Text("not audio".into()), Duration::from_secs(1))
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
