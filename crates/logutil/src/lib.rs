//! Utilities for logging.
use clap::ValueEnum;
use tracing::Level;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::SubscriberBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    HumanReadable,
    Compact,
    Json,
}

/// Build the filter for the global subscriber. `RUST_LOG` directives take
/// precedence over `level`.
pub fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

/// Install a global subscriber writing to stderr.
///
/// Fails if a global subscriber was already set.
pub fn try_configure_global_logger(
    level: Level,
    format: LogFormat,
) -> Result<(), SetGlobalDefaultError> {
    let builder = SubscriberBuilder::default()
        .with_env_filter(env_filter(level))
        .with_writer(std::io::stderr);

    match format {
        LogFormat::HumanReadable => tracing::subscriber::set_global_default(
            builder.with_file(true).with_line_number(true).finish(),
        ),
        LogFormat::Compact => tracing::subscriber::set_global_default(
            builder.compact().with_target(false).finish(),
        ),
        LogFormat::Json => {
            tracing::subscriber::set_global_default(builder.json().with_current_span(false).finish())
        }
    }
}

/// Install a global subscriber, ignoring an already installed one.
pub fn configure_global_logger(level: Level, format: LogFormat) {
    let _ = try_configure_global_logger(level, format);
}
