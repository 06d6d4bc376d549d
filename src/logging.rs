use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Console logging on stderr so stdout stays free for tables and JSON.
/// `RUST_LOG` overrides the default `fob_tracker=info` filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fob_tracker=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
