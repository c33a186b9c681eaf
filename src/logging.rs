use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding an `EnvFilter` directive, e.g. `alice_sdk=debug`.
pub const LOG_ENV: &str = "ALICE_LOG";

/// Install the global subscriber. Logs go to stderr so stdout stays the report.
pub fn init(verbose: bool) {
    let fallback = if verbose { "warn,alice_sdk=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
