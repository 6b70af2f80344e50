//! Tracing subscriber setup for the `oc-yedit` binary.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a stderr subscriber. `RUST_LOG` takes precedence over `debug`.
pub fn init(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(debug)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn default_level(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "warn"
    }
}
