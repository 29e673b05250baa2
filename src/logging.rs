//! Tracing subscriber setup for the binary

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber writing to stderr. `RUST_LOG` takes
/// precedence over `default_filter`. Calling this twice is a no-op.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("interactome=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
