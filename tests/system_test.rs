//! End-to-end pipeline tests over deterministic backend stubs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

use helpdesk_core::mocks::{CallLog, MockBackend, MockIdentity, MockObserver};
use helpdesk_core::traits::BackendClient;
use helpdesk_core::types::{BackendInput, BackendKind, FailureKind};
use helpdesk_dispatch::{DispatchPolicy, Dispatcher, ResponseAggregator};
use helpdesk_gateway::{GatewayConfig, GatewayServer};

fn gateway(
    backends: Vec<(BackendKind, MockBackend)>,
    observer: Arc<MockObserver>,
) -> axum::Router {
    let clients: HashMap<BackendKind, Arc<dyn BackendClient>> = backends
        .into_iter()
        .map(|(kind, client)| (kind, Arc::new(client) as Arc<dyn BackendClient>))
        .collect();

    let policy = DispatchPolicy {
        call_timeout: Duration::from_millis(500),
        global_deadline: Duration::from_secs(2),
        max_retries: 2,
        backoff_base: Duration::from_millis(5),
    };

    GatewayServer::new(
        GatewayConfig::default(),
        Arc::new(MockIdentity::allowing("tok-1", "agent-7")),
        Arc::new(Dispatcher::new(clients, policy)),
        ResponseAggregator::new(0.5, "We were unable to answer your request."),
        observer,
    )
    .build_router()
}

fn authed(payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/support")
        .header("Content-Type", "application/json")
        .header("Authorization", "Bearer tok-1")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn all_three_modalities_flow_through_the_pipeline() {
    let log = CallLog::new();
    let observer = Arc::new(MockObserver::new());
    let app = gateway(
        vec![
            (
                BackendKind::Speech,
                MockBackend::succeeding(BackendKind::Speech, "it rattles when I shake it", 0.9, log.clone()),
            ),
            (
                BackendKind::Vision,
                MockBackend::succeeding(BackendKind::Vision, "A dented laptop.", 0.85, log.clone()),
            ),
            (
                BackendKind::Qa,
                MockBackend::succeeding(BackendKind::Qa, "Send it in for repair.", 0.95, log.clone()),
            ),
        ],
        observer.clone(),
    );

    let response = app
        .oneshot(authed(json!({
            "request_id": "r-multi",
            "text_query": "my laptop is broken",
            "image_ref": "https://blobs.example.com/laptop.png",
            "audio_ref": "https://blobs.example.com/rattle.wav",
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["primary_answer"], "Send it in for repair.");
    assert_eq!(body["degraded"], false);

    // Results come back in plan order: Speech, Vision, QA.
    let kinds: Vec<&str> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["backend"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["speech", "vision", "qa"]);

    // QA saw both the text and the transcript, and ran after Speech.
    let invocations = log.invocations();
    let qa_input = invocations
        .iter()
        .find(|(kind, _)| *kind == BackendKind::Qa)
        .map(|(_, input)| input.clone())
        .unwrap();
    match qa_input {
        BackendInput::Text(text) => {
            assert!(text.contains("my laptop is broken"));
            assert!(text.contains("it rattles when I shake it"));
        }
        other => panic!("expected text input for QA, got {:?}", other),
    }
    let order = log.backends();
    let speech_pos = order.iter().position(|k| *k == BackendKind::Speech).unwrap();
    let qa_pos = order.iter().position(|k| *k == BackendKind::Qa).unwrap();
    assert!(speech_pos < qa_pos);

    let recorded = observer.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].0, "r-multi");
}

#[tokio::test]
async fn voice_note_is_answered_via_transcription() {
    let log = CallLog::new();
    let observer = Arc::new(MockObserver::new());
    let app = gateway(
        vec![
            (
                BackendKind::Speech,
                MockBackend::succeeding(BackendKind::Speech, "where is my refund", 0.9, log.clone()),
            ),
            (
                BackendKind::Qa,
                MockBackend::succeeding(BackendKind::Qa, "Refunds take 5 business days.", 0.9, log.clone()),
            ),
        ],
        observer,
    );

    let response = app
        .oneshot(authed(json!({
            "audio_ref": "https://blobs.example.com/voice-note.ogg",
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["primary_answer"], "Refunds take 5 business days.");
    assert_eq!(body["degraded"], false);

    assert_eq!(
        log.invocations()[1].1,
        BackendInput::Text("where is my refund".into())
    );
}

#[tokio::test]
async fn transient_backend_trouble_is_absorbed_by_retry() {
    let log = CallLog::new();
    let observer = Arc::new(MockObserver::new());
    let app = gateway(
        vec![(
            BackendKind::Qa,
            MockBackend::scripted(
                BackendKind::Qa,
                vec![
                    helpdesk_core::types::BackendCallResult::Failure {
                        kind: FailureKind::Transient,
                        message: "502".into(),
                    },
                    helpdesk_core::types::BackendCallResult::Success {
                        answer: "Recovered answer.".into(),
                        confidence: 0.9,
                        latency_ms: 4,
                    },
                ],
                log.clone(),
            ),
        )],
        observer,
    );

    let response = app
        .oneshot(authed(json!({ "text_query": "flaky?" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["primary_answer"], "Recovered answer.");
    assert_eq!(body["degraded"], false);
    assert_eq!(body["results"][0]["attempts"], 2);
    assert_eq!(log.count_for(BackendKind::Qa), 2);
}
