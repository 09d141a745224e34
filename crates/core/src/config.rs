use config::{Config, ConfigError, Environment, File};
use secrecy::Secret;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub gateway: GatewaySettings,
    pub dispatch: DispatchSettings,
    pub aggregator: AggregatorSettings,
    pub backends: BackendsConfig,
    pub identity: IdentityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewaySettings {
    pub enable_cors: bool,
    pub enable_tracing: bool,
    pub enable_metrics: bool,
    pub json_logs: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DispatchSettings {
    /// Upper bound for one backend call, in milliseconds.
    pub call_timeout_ms: u64,
    /// Upper bound for the whole dispatch, in milliseconds.
    pub global_deadline_ms: u64,
    /// Retries after the first attempt for required backends.
    pub max_retries: u32,
    /// Base delay for exponential backoff, in milliseconds.
    pub backoff_base_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AggregatorSettings {
    /// QA confidence below this is a soft failure for precedence.
    pub confidence_threshold: f64,
    /// Sentinel answer when no backend produced a usable one.
    pub fallback_answer: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendsConfig {
    pub qa: BackendEndpoint,
    pub vision: BackendEndpoint,
    pub speech: BackendEndpoint,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendEndpoint {
    pub url: String,
    pub api_key: Option<Secret<String>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    /// "static" for config-listed tokens, "http" for remote introspection.
    pub mode: String,
    /// Introspection endpoint when mode = "http".
    pub introspection_url: Option<String>,
    /// Accepted tokens when mode = "static", mapped to principal subjects.
    pub static_tokens: std::collections::HashMap<String, String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("HELPDESK_ENV").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Map APP__SERVER__PORT=3000 to app.server.port
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 3000,
            },
            gateway: GatewaySettings {
                enable_cors: true,
                enable_tracing: true,
                enable_metrics: false,
                json_logs: false,
            },
            dispatch: DispatchSettings {
                call_timeout_ms: 10_000,
                global_deadline_ms: 25_000,
                max_retries: 2,
                backoff_base_ms: 100,
            },
            aggregator: AggregatorSettings {
                confidence_threshold: 0.5,
                fallback_answer: "We were unable to answer your request.".into(),
            },
            backends: BackendsConfig {
                qa: BackendEndpoint {
                    url: "http://localhost:8081/v1/answer".into(),
                    api_key: None,
                },
                vision: BackendEndpoint {
                    url: "http://localhost:8082/v1/caption".into(),
                    api_key: None,
                },
                speech: BackendEndpoint {
                    url: "http://localhost:8083/v1/transcribe".into(),
                    api_key: None,
                },
            },
            identity: IdentityConfig {
                mode: "static".into(),
                introspection_url: None,
                static_tokens: std::collections::HashMap::new(),
            },
        }
    }
}
