use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Console tracing for the non-interactive commands
///
/// Output goes to stderr so command results on stdout stay pipeable.
/// `RUST_LOG` controls the level; the default only shows warnings.
pub fn init_tracing_subscriber(verbose: bool) {
    let default_level = if verbose { "crawlterm=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
