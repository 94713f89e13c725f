pub mod builders;
pub mod fake_source;
pub mod recording_backend;

pub use builders::{make_device, make_device_mock, Harness};
pub use fake_source::FakeWatchSource;
pub use recording_backend::RecordingBackend;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Logs go through `with_test_writer()`, so the harness only shows them
///   for failing tests (or with `-- --nocapture`).
/// - `RUST_LOG` overrides the default of `simwatch=debug,warn`, e.g.
///   `RUST_LOG=simwatch::engine=trace cargo test`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("simwatch=debug,warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Poll `condition` every 20ms until it holds, failing after 5 seconds.
///
/// For tests driven by real OS notifications, where there is no event to
/// await directly.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    with_timeout(async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
}
