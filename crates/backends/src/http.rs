//! Shared HTTP plumbing for capability adapters.

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Serialize;

use helpdesk_core::config::BackendEndpoint;
use helpdesk_core::types::{BackendCallResult, FailureKind};

/// One capability endpoint reached over HTTP JSON.
pub(crate) struct HttpCapability {
    client: reqwest::Client,
    endpoint: BackendEndpoint,
}

impl HttpCapability {
    pub(crate) fn new(endpoint: BackendEndpoint) -> Self {
        Self {
            // Per-call timeouts are applied by the caller; the client itself
            // carries no default timeout.
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// POST a JSON request and decode a JSON response within `timeout`.
    ///
    /// All outcomes are folded into the closure result: transport and
    /// protocol trouble becomes a classified `Failure`, elapsed time a
    /// `TimedOut`. On success `normalize` maps the decoded body plus the
    /// observed latency into a call result.
    pub(crate) async fn post_json<Req, Resp>(
        &self,
        request: &Req,
        timeout: Duration,
        normalize: impl FnOnce(Resp, u64) -> BackendCallResult,
    ) -> BackendCallResult
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let started = Instant::now();

        let mut builder = self.client.post(&self.endpoint.url).json(request);
        if let Some(ref key) = self.endpoint.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = match tokio::time::timeout(timeout, builder.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return BackendCallResult::Failure {
                    kind: classify_request_error(&e),
                    message: e.to_string(),
                }
            }
            Err(_) => return BackendCallResult::TimedOut,
        };

        let status = response.status();
        if !status.is_success() {
            return BackendCallResult::Failure {
                kind: classify_status(status),
                message: format!("backend returned {}", status),
            };
        }

        let remaining = timeout.saturating_sub(started.elapsed());
        let body = match tokio::time::timeout(remaining, response.json::<Resp>()).await {
            Ok(Ok(body)) => body,
            Ok(Err(e)) => {
                return BackendCallResult::Failure {
                    kind: FailureKind::Permanent,
                    message: format!("undecodable backend response: {}", e),
                }
            }
            Err(_) => return BackendCallResult::TimedOut,
        };

        let latency_ms = started.elapsed().as_millis() as u64;
        normalize(body, latency_ms)
    }
}

/// HTTP status classification: 5xx and 429 are worth retrying, every other
/// non-success status is not.
pub(crate) fn classify_status(status: StatusCode) -> FailureKind {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        FailureKind::Transient
    } else {
        FailureKind::Permanent
    }
}

fn classify_request_error(error: &reqwest::Error) -> FailureKind {
    if error.is_connect() || error.is_timeout() || error.is_request() {
        FailureKind::Transient
    } else {
        FailureKind::Permanent
    }
}
