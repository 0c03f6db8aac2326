//! Tracing subscriber setup for binaries.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "parley=info";

/// Keeps the background file writer alive; drop it last.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber: stderr always, plus a daily-rotated file
/// under [`crate::parley_dirs::logs_dir`] when enabled.
///
/// Calling this twice is harmless; the second call leaves the first
/// subscriber in place.
pub fn init(config: &LoggingConfig) -> LogGuard {
    let (file_layer, guard) = if config.file_output {
        let appender = tracing_appender::rolling::daily(crate::parley_dirs::logs_dir(), "parley.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init();

    LogGuard { _file: guard }
}
