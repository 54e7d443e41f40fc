// lingua-coach/crates/lingua-coach/src/telemetry.rs

use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset. Request spans from the HTTP layer
/// are only interesting at debug level.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=warn";

pub fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    init_tracing_with(&filter);
}

/// Installs the global subscriber with `filter`. Returns `false` when one was
/// already installed, in which case the existing subscriber stays.
pub fn init_tracing_with(filter: &str) -> bool {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_level(true)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).is_ok()
}
