//! Identity provider adapters.
//!
//! Token validation is delegated to an external identity provider; the
//! gateway only needs a yes/no plus a principal. Both adapters fail closed.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use helpdesk_core::config::IdentityConfig;
use helpdesk_core::traits::{AuthOutcome, IdentityProvider};
use helpdesk_core::types::Principal;
use helpdesk_core::{Error, Result};

/// Identity provider backed by a config-listed token table.
///
/// Lets the gateway run without a remote IdP in development and tests.
pub struct StaticTokenProvider {
    tokens: HashMap<String, String>,
}

impl StaticTokenProvider {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenProvider {
    async fn validate(&self, token: &str) -> AuthOutcome {
        match self.tokens.get(token) {
            Some(subject) => AuthOutcome::Authorized(Principal::new(subject)),
            None => AuthOutcome::Unauthenticated,
        }
    }
}

#[derive(Deserialize)]
struct IntrospectionResponse {
    active: bool,
    #[serde(default)]
    subject: Option<String>,
}

/// Identity provider that POSTs tokens to a remote introspection endpoint.
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    url: String,
}

impl HttpIdentityProvider {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn validate(&self, token: &str) -> AuthOutcome {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Identity provider unreachable, rejecting credential");
                return AuthOutcome::Unauthenticated;
            }
        };

        if !response.status().is_success() {
            return AuthOutcome::Unauthenticated;
        }

        match response.json::<IntrospectionResponse>().await {
            Ok(body) if body.active => {
                let subject = body.subject.unwrap_or_else(|| "unknown".to_string());
                AuthOutcome::Authorized(Principal::new(subject))
            }
            Ok(_) => AuthOutcome::Unauthenticated,
            Err(e) => {
                tracing::warn!(error = %e, "Undecodable introspection response, rejecting credential");
                AuthOutcome::Unauthenticated
            }
        }
    }
}

/// Build the provider selected by configuration.
pub fn provider_from_config(config: &IdentityConfig) -> Result<Box<dyn IdentityProvider>> {
    match config.mode.as_str() {
        "static" => Ok(Box::new(StaticTokenProvider::new(
            config.static_tokens.clone(),
        ))),
        "http" => {
            let url = config
                .introspection_url
                .clone()
                .ok_or_else(|| Error::config("identity.mode = \"http\" requires identity.introspection_url"))?;
            Ok(Box::new(HttpIdentityProvider::new(url)))
        }
        other => Err(Error::config(format!("unknown identity mode '{}'", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};

    #[tokio::test]
    async fn static_provider_matches_exact_tokens() {
        let mut tokens = HashMap::new();
        tokens.insert("tok-1".to_string(), "agent-7".to_string());
        let provider = StaticTokenProvider::new(tokens);

        assert_eq!(
            provider.validate("tok-1").await,
            AuthOutcome::Authorized(Principal::new("agent-7"))
        );
        assert_eq!(provider.validate("tok-2").await, AuthOutcome::Unauthenticated);
    }

    #[tokio::test]
    async fn http_provider_accepts_active_tokens() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let router = Router::new().route(
                "/introspect",
                post(|| async {
                    Json(serde_json::json!({ "active": true, "subject": "agent-7" }))
                }),
            );
            axum::serve(listener, router).await.unwrap();
        });

        let provider = HttpIdentityProvider::new(format!("http://{}/introspect", addr));
        assert_eq!(
            provider.validate("tok-1").await,
            AuthOutcome::Authorized(Principal::new("agent-7"))
        );
    }

    #[tokio::test]
    async fn http_provider_fails_closed_when_unreachable() {
        let provider = HttpIdentityProvider::new("http://127.0.0.1:1/introspect");
        assert_eq!(provider.validate("tok-1").await, AuthOutcome::Unauthenticated);
    }

    #[test]
    fn config_selects_provider_mode() {
        let mut config = IdentityConfig {
            mode: "http".into(),
            introspection_url: None,
            static_tokens: HashMap::new(),
        };
        assert!(provider_from_config(&config).is_err());

        config.introspection_url = Some("http://idp.internal/introspect".into());
        assert!(provider_from_config(&config).is_ok());

        config.mode = "static".into();
        assert!(provider_from_config(&config).is_ok());

        config.mode = "oauth".into();
        assert!(provider_from_config(&config).is_err());
    }
}
