//! Log output.

use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: OnceLock<()> = OnceLock::new();

const DEFAULT_FILTER: &str = "vmplan=info,vmplan_solver=info";

/// Prints the scheduler events on stderr.
///
/// The filter comes from `RUST_LOG`, `vmplan_solver=info` otherwise.
/// Safe to call multiple times - only the first call has effect.
pub fn init_tracing() {
    INIT.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init();
    });
}
