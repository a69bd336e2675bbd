pub mod fake_backend;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

pub use fake_backend::{max_concurrent, ChildEvent, FakeBackend};

/// Upper bound for any single awaited step in a test.
///
/// Paused-clock tests auto-advance virtual time, so this bound is measured on
/// the same clock as the supervisor's backoff windows. It has to stay well
/// above the longest window a test waits out (10s by default).
pub const TEST_TIMEOUT: Duration = Duration::from_secs(60);

static TRACING: Once = Once::new();

/// Route supervisor logs into the test harness capture.
///
/// Filter comes from `RUST_LOG`, `info` otherwise. Only the first call
/// installs the subscriber; later calls are no-ops.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Await `f`, panicking if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_TIMEOUT, f)
        .await
        .unwrap_or_else(|_| panic!("test step timed out after {TEST_TIMEOUT:?}"))
}
