pub mod config;
pub mod convert;
pub mod directory;
pub mod domain;
pub mod error;
pub mod mcx;
pub mod profile;

use tracing_appender::non_blocking::WorkerGuard;

/// Install the global tracing subscriber.
///
/// Logs go to stderr alongside the final diagnostic, so they never mix with
/// anything a caller pipes from stdout.
///
/// Log level is controlled by the RUST_LOG environment variable; defaults to
/// WARN when the variable is absent. The returned guard flushes buffered
/// records when dropped and must be held until the process exits.
pub fn init_tracing() -> WorkerGuard {
    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(non_blocking)
        .with_target(false)
        .init();

    guard
}
