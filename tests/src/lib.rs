pub mod nodes;

// std
use std::time::Duration;

pub use nodes::TestNode;

const SLOW_ENV_VAR: &str = "SLOW_TEST_ENV";

/// Stretches `d` on slow CI runners.
#[must_use]
pub fn adjust_timeout(d: Duration) -> Duration {
    if std::env::var(SLOW_ENV_VAR).is_ok_and(|s| s == "true") {
        d.saturating_mul(4)
    } else {
        d
    }
}

/// Polls `condition` every 10ms until it holds or `timeout` elapses.
pub async fn wait_for<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    tokio::time::timeout(adjust_timeout(timeout), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok()
}
