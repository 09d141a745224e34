//! Logging configuration.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Configure the global tracing subscriber.
///
/// Honors `RUST_LOG`; defaults to info with debug for the workspace crates.
/// With `json_logs` set, events are emitted as JSON lines for log shippers.
pub fn configure_tracing(json_logs: bool) -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,helpdesk=debug".into()),
    );

    let registry = tracing_subscriber::registry().with(env_filter);

    if json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()?;
    }

    Ok(())
}
