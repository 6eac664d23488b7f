use std::time::Duration;

use locator_common::LocatorError;
use tracing::{debug, info};

/// How often and how long to wait for the mapping library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for ReadyPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            max_attempts: 100,
        }
    }
}

/// Poll `is_loaded` on a fixed interval until it reports ready. Resolves once,
/// with the number of checks made. The first check runs immediately.
pub async fn wait_for_library<F>(mut is_loaded: F, policy: ReadyPolicy) -> Result<u32, LocatorError>
where
    F: FnMut() -> bool,
{
    let mut ticker = tokio::time::interval(policy.interval);
    for attempt in 1..=policy.max_attempts {
        ticker.tick().await;
        if is_loaded() {
            info!(attempt, "Map library ready");
            return Ok(attempt);
        }
        debug!(attempt, "Map library not loaded yet");
    }
    Err(LocatorError::LibraryNotReady {
        attempts: policy.max_attempts,
    })
}
