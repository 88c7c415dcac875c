//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::defaults;

static INIT: Once = Once::new();

/// Initialize the Vigil tracing/logging system.
///
/// Reads the `VIGIL_LOG` environment variable for per-module log levels.
/// Format: `VIGIL_LOG=vigil_engine=debug,vigil_storage=warn`
///
/// Falls back to `vigil=info` if `VIGIL_LOG` is not set or is invalid.
///
/// This function is idempotent: calling it multiple times is safe.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("VIGIL_LOG")
            .unwrap_or_else(|_| EnvFilter::new(defaults::DEFAULT_LOG_FILTER));
        install(filter);
    });
}

/// Initialize tracing with an explicit filter string (config-driven or tests).
/// `VIGIL_LOG` still wins when set.
pub fn init_tracing_with_filter(filter: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("VIGIL_LOG")
            .or_else(|_| EnvFilter::try_new(filter))
            .unwrap_or_else(|_| EnvFilter::new(defaults::DEFAULT_LOG_FILTER));
        install(filter);
    });
}

fn install(filter: EnvFilter) {
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter)
        .try_init();
}
