use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::device::status_cache::DeviceStatusCache;
use crate::{debug, info, warn};

const LOG_TAG: &str = "status-refresh-worker";

/// status refresh worker
/// refresh the status of `device_ids` at a regular interval until `cancel` fires.
/// the first tick runs right away, a failed refresh is logged and retried on the next tick
pub fn status_refresh_worker(
    interval: Duration,
    cache: Arc<DeviceStatusCache>,
    device_ids: Vec<String>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(LOG_TAG, "status refresh worker starting, devices: {}, interval: {:?}", device_ids.len(), interval);
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            // timer ticks are explicit refreshes, the ttl only guards ad hoc callers
            match cache.refresh_if_stale(&device_ids, true).await {
                Ok(outcome) => debug!(LOG_TAG, "refresh tick: {:?}", outcome),
                Err(e) => warn!(LOG_TAG, "refresh tick failed: {}", e),
            }
        }
        info!(LOG_TAG, "status refresh worker stopped");
    })
}
