//! Logging utilities for the Paddle gateway service.
//!
//! Provides a standardized approach to logging across all crates: the binary
//! calls [`init`] once at startup and everything else uses the `tracing`
//! macros directly.

use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber with the default log level (INFO).
pub fn init() {
    init_with_level(Level::INFO);
}

/// Initialize the tracing subscriber with a specific log level.
///
/// Formats log messages with timestamps, log levels, targets and file/line
/// information. `RUST_LOG`-style directives from the environment still apply
/// on top of the given level.
pub fn init_with_level(level: Level) {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("paddle={}", level).parse().unwrap());

    // Use try_init to handle the case where a global default subscriber has
    // already been set (e.g. in tests)
    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}
