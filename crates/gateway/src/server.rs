//! Axum-based HTTP server for the gateway.

use axum::{
    extract::{Json, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use helpdesk_core::{
    traits::{AuthOutcome, IdentityProvider, OutcomeObserver},
    types::{DispatchPlan, OutcomeSummary, SupportRequest},
    Error,
};
use helpdesk_dispatch::{Dispatcher, ResponseAggregator};

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Enable CORS.
    pub enable_cors: bool,
    /// Enable request tracing.
    pub enable_tracing: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            enable_cors: true,
            enable_tracing: true,
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// External identity collaborator.
    pub identity: Arc<dyn IdentityProvider>,
    /// Plan executor.
    pub dispatcher: Arc<Dispatcher>,
    /// Result merger.
    pub aggregator: ResponseAggregator,
    /// External observability collaborator.
    pub observer: Arc<dyn OutcomeObserver>,
}

use metrics_exporter_prometheus::PrometheusHandle;

/// Gateway server.
pub struct GatewayServer {
    config: GatewayConfig,
    state: Arc<AppState>,
    metrics_handle: Option<PrometheusHandle>,
}

impl GatewayServer {
    /// Create a new gateway server.
    pub fn new(
        config: GatewayConfig,
        identity: Arc<dyn IdentityProvider>,
        dispatcher: Arc<Dispatcher>,
        aggregator: ResponseAggregator,
        observer: Arc<dyn OutcomeObserver>,
    ) -> Self {
        Self {
            config,
            state: Arc::new(AppState {
                identity,
                dispatcher,
                aggregator,
                observer,
            }),
            metrics_handle: None,
        }
    }

    /// Set metrics handle.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Build the Axum router.
    pub fn build_router(&self) -> Router {
        let mut router = Router::new()
            .route("/health", get(health_handler))
            .route("/v1/support", post(support_handler))
            .with_state(self.state.clone());

        if let Some(handle) = &self.metrics_handle {
            let handle = handle.clone();
            router = router.route("/metrics", get(move || async move { handle.render() }));
        }

        if self.config.enable_cors {
            router = router.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any));
        }

        if self.config.enable_tracing {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Run the server.
    pub async fn run(self) -> helpdesk_core::Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::gateway(format!("Failed to bind: {}", e)))?;

        tracing::info!(addr = %addr, "Gateway server starting");

        axum::serve(listener, self.build_router())
            .await
            .map_err(|e| Error::gateway(format!("Server error: {}", e)))?;

        Ok(())
    }
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Inbound support request payload.
#[derive(Debug, Deserialize)]
pub struct SupportPayload {
    /// Caller-supplied request ID; generated when absent.
    pub request_id: Option<String>,
    /// Free-text question.
    pub text_query: Option<String>,
    /// Image reference (http(s) URL or data: blob).
    pub image_ref: Option<String>,
    /// Audio reference (http(s) URL or data: blob).
    pub audio_ref: Option<String>,
}

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
    /// Request ID, when one was established.
    pub request_id: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Support request handler.
///
/// Authenticates first (zero backend calls on rejection), validates the
/// request shape, then delegates to dispatcher and aggregator. Partial
/// backend failure is a 200 with `degraded = true`; 504 is reserved for a
/// global deadline with no usable partial answer.
async fn support_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SupportPayload>,
) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return error_response(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "missing bearer credential",
            None,
        );
    };

    let principal = match state.identity.validate(token).await {
        AuthOutcome::Authorized(principal) => principal,
        AuthOutcome::Unauthenticated => {
            return error_response(
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "credential rejected",
                None,
            );
        }
    };

    let request_id = payload
        .request_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let request = SupportRequest {
        request_id: request_id.clone(),
        text_query: payload.text_query,
        image_ref: payload.image_ref,
        audio_ref: payload.audio_ref,
        caller: principal,
    };

    if let Err(e) = request.validate() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_input",
            &e.to_string(),
            Some(request_id),
        );
    }

    let plan = DispatchPlan::for_request(&request);
    tracing::info!(
        request_id = %request_id,
        caller = %request.caller.subject,
        planned_backends = plan.entries.len(),
        "Dispatching support request"
    );

    let dispatched = state.dispatcher.dispatch(&request, &plan).await;
    let response = state
        .aggregator
        .aggregate(&request_id, &plan, dispatched.outcomes);

    let summary = OutcomeSummary::from_response(&response, dispatched.deadline_exceeded);
    state.observer.record(&request_id, &summary);

    tracing::info!(
        request_id = %request_id,
        degraded = response.degraded,
        deadline_exceeded = dispatched.deadline_exceeded,
        outcomes = ?summary.backends,
        "Support request completed"
    );

    if dispatched.deadline_exceeded && state.aggregator.is_fallback(&response.primary_answer) {
        return error_response(
            StatusCode::GATEWAY_TIMEOUT,
            "timeout",
            "global deadline exceeded with no usable partial answer",
            Some(request_id),
        );
    }

    (StatusCode::OK, Json(response)).into_response()
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

fn error_response(
    status: StatusCode,
    code: &str,
    message: &str,
    request_id: Option<String>,
) -> Response {
    (
        status,
        Json(ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
            request_id,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(header::AUTHORIZATION, "Basic abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }
}
