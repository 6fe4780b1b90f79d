//! Tracing subscriber setup

use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_DIRECTIVE: &str = "warn,ffc_core=info,ffc_datablock=info,ffc_pipeline=info";

/// Initialize logging with the default filter
///
/// Use the `RUST_LOG` environment variable to override it. Returns false if a
/// global subscriber was already installed.
pub fn init_tracing() -> bool {
    init_tracing_with(DEFAULT_DIRECTIVE)
}

/// Initialize logging with a fallback filter directive
pub fn init_tracing_with(default_directive: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
