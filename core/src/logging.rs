//! Console logging for hosts embedding the core.
//!
//! # Design
//! The library only emits `tracing` events; installing a subscriber is the
//! host's call. `init` is the default setup, driven by `[logging] level` in
//! `LumoConfig` with `RUST_LOG` taking precedence.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install a console subscriber for the `lumo_core` target.
///
/// `RUST_LOG` takes precedence over `level`. Safe to call more than once;
/// later calls leave the first subscriber in place.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lumo_core={level},warn")));

    let initialized = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .with(filter)
        .try_init()
        .is_ok();

    if initialized {
        tracing::info!(level, "logging initialized");
    }
}
