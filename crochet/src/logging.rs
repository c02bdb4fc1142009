//! Log output for hosts that want the core's `tracing` events.
//!
//! The library only emits events. A host (or a test binary) opts into seeing
//! them by calling `init_logging` once, with a filter directive such as
//! `"info"` or `"crochet=debug"`.

use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

use crate::interface::CrochetError;

static LOGGING_INIT: Once = Once::new();

/// Install a stderr subscriber filtered by `directives`.
///
/// Only the first successful call installs anything; later calls (or a
/// subscriber installed by the host) are left alone.
#[uniffi::export]
pub fn init_logging(directives: String) -> Result<(), CrochetError> {
    let filter = EnvFilter::try_new(directives.trim())
        .map_err(|e| CrochetError::InvalidInput(format!("invalid log filter: {}", e)))?;

    LOGGING_INIT.call_once(|| {
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init();
    });
    Ok(())
}
