//! Tracing setup for binaries embedding the server.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initializes the tracing subscriber.
///
/// Honors `RUST_LOG` when set; otherwise falls back to the given default
/// directive (e.g. `"info"` or `"tavern=debug"`).
pub fn init(default_directive: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(default_directive)
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
