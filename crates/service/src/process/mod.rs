use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Install the global subscriber: compact lines on stdout, filtered by
///  `RUST_LOG` with `level` as the default directive.
///
/// Returns an error if a global subscriber is already set.
pub fn init_tracing(level: tracing::Level) -> Result<(), TracingSetupError> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stdout)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(stdout_layer)
        .try_init()
        .map_err(|e| TracingSetupError(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
#[error("failed to install tracing subscriber: {0}")]
pub struct TracingSetupError(String);
