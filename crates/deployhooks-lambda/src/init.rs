// Logging setup

use deployhooks_config::{LogConfig, LogFormat};

/// Initialize tracing from the log configuration.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(config: &LogConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Ignore the error if a subscriber is already set (warm starts, tests)
    let _ = match config.format {
        // CloudWatch already timestamps every line
        LogFormat::Json => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().json().without_time().with_current_span(false)),
        ),
        LogFormat::Text => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().without_time().with_ansi(false)),
        ),
    };
}
