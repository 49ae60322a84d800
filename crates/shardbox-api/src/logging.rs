//! Tracing subscriber initialization.

use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Install the global tracing subscriber.
///
/// Console output is compact without targets or timestamps; RUST_LOG overrides
/// the default filter.
pub fn init_logging() {
    let console_fmt = tracing_subscriber::fmt::layer().event_format(
        Format::default()
            .compact()
            .with_target(false)
            .without_time(),
    );
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shardbox=debug,tower_http=debug".into()),
        )
        .with(console_fmt)
        .init();
}
