//! Tracing initialisation helpers for tests.
//!
//! Index builds log every manifest they apply at `debug`; call
//! [`init_test_tracing`] at the top of a test to see them under
//! `RUST_LOG=classmap_core=debug`.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_TEST_FILTER: &str = "warn,classmap_core=info";

/// Initialise a subscriber writing to the test-harness writer.
///
/// Idempotent: later calls in the same process are ignored.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_TEST_FILTER)),
        )
        .with_test_writer()
        .try_init();
}
