use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging for binaries and tests.
///
/// Honors `RUST_LOG` when set, otherwise logs `info` globally with debug
/// detail for this crate. Calling it again once a subscriber is installed
/// is a no-op, so tests can call it freely.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info").add_directive("paperdoll=debug".parse().unwrap())
    });

    let initialized = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .try_init()
        .is_ok();

    if initialized {
        tracing::info!("logging initialized");
    }
}
