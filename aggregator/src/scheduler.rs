//! Periodic refresh driver
//!
//! One background task per service instance: wait out a short startup delay
//! so the host finishes initializing, then fire `refresh_all` on a fixed
//! interval. The timer never waits for responses; a slow proxy simply means
//! overlapping in-flight requests whose responses overwrite each other in
//! arrival order. The task is bound to the service lifetime and aborted on
//! stop or reload, so a reconfigured service never leaves a stale timer
//! running behind the new one.

use crate::requester::CountRequester;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Delay before the first refresh after startup.
pub const STARTUP_DELAY: Duration = Duration::from_secs(1);

/// Cancellable repeating refresh timer.
pub struct RefreshScheduler {
    handle: JoinHandle<()>,
}

impl RefreshScheduler {
    /// Spawns the refresh loop with the given period.
    pub fn start(requester: Arc<CountRequester>, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(STARTUP_DELAY).await;

            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                // The first tick completes immediately, so the initial
                // refresh happens right after the startup delay.
                ticker.tick().await;
                requester.refresh_all();
            }
        });
        Self { handle }
    }

    /// Stops the timer. Requests already handed to the transport are not
    /// recalled; their responses still apply when they arrive.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
