//! Logging setup for the `spf` binary.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `level` nor `RUST_LOG` is given.
pub const DEFAULT_FILTER: &str = "warn";

/// Build the filter: explicit `level` first, then `RUST_LOG`, then [`DEFAULT_FILTER`].
pub fn filter(level: Option<&str>) -> EnvFilter {
    level
        .and_then(|l| EnvFilter::try_new(l).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a stderr subscriber. Calling it twice is harmless.
pub fn init(level: Option<&str>) {
    let _ = tracing_subscriber::registry()
        .with(filter(level))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}
