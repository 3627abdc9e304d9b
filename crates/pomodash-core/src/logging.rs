//! Logging configuration using tracing.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// Logs go to stderr so stdout stays machine-readable. The level is
/// controlled by the `POMODASH_LOG` environment variable.
///
/// # Examples
/// ```bash
/// POMODASH_LOG=debug pomodash run
/// POMODASH_LOG=pomodash_core=trace pomodash run
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_env("POMODASH_LOG")
        .unwrap_or_else(|_| EnvFilter::new("pomodash_core=info,pomodash_cli=info,warn"));

    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .try_init();

    if result.is_ok() {
        tracing::debug!("logging initialized");
    }
}
