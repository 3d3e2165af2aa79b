//! Tracing setup for tests that want to see what the driver is doing.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "client_driver=info";

/// Install a fmt subscriber filtered by `RUST_LOG` (default `client_driver=info`).
///
/// Output goes through the test writer so it is captured per test. Safe to
/// call from every test; only the first call installs anything.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_target(true)
        .with_ansi(false)
        .try_init();
}
