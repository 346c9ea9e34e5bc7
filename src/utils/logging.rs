// src/utils/logging.rs
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset. Debug runs also show the
/// per-row rejects and rule traces of this crate.
fn default_filter(debug: bool) -> &'static str {
    if debug {
        "info,listing_harvester=debug"
    } else {
        "info"
    }
}

/// Installs the global `tracing` subscriber. `RUST_LOG` always wins over
/// the `--debug` default.
pub fn setup_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let debug_defaults = debug;
    tracing::debug!("Logging initialised (debug defaults: {})", debug_defaults);
}
