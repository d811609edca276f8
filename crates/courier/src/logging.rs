//! Logging setup for host applications

use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Filter for `level`, falling back to `"info"` when it does not parse
pub(crate) fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Whether [`init_logging`] already ran
pub(crate) fn is_initialized() -> bool {
    INIT.is_completed()
}

/// Install a stdout `tracing` subscriber
///
/// `level` is an `EnvFilter` directive such as `"debug"` or
/// `"courier=trace,info"`; an invalid one falls back to `"info"`. Only the
/// first call has an effect.
pub fn init_logging(level: &str) {
    INIT.call_once(|| {
        if fmt()
            .with_env_filter(env_filter(level))
            .with_target(true)
            .with_ansi(false)
            .try_init()
            .is_err()
        {
            tracing::debug!("A global subscriber is already installed");
        }
    });
}
