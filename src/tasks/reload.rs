//! Periodic tab reload background task

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::host::TabHost;
use crate::state::TabId;

/// Ownership token for a scheduled periodic reload task.
///
/// Dropping the handle aborts the task. The token is owned exclusively by
/// the tab-timer table, so release happens exactly once: on unregistration
/// or when a replacement handle displaces it.
#[derive(Debug)]
pub struct IntervalHandle {
    handle: JoinHandle<()>,
}

impl Drop for IntervalHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawn a task that requests a reload of `tab` every `seconds` seconds
/// until the returned handle is dropped.
pub fn spawn_reload_interval<H>(host: H, tab: TabId, seconds: u32) -> IntervalHandle
where
    H: TabHost + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let period = Duration::from_secs(u64::from(seconds));
        loop {
            tokio::time::sleep(period).await;
            debug!("Reloading tab {}", tab);
            host.reload(tab);
        }
    });
    IntervalHandle { handle }
}
