//! Background monitoring of player state changes.
//!
//! The monitor samples the player at a fixed cadence, diffs each
//! snapshot against the previous one, and hands any resulting event to
//! the broadcaster. It runs as a single dedicated task, independent of
//! the request path; a failed cycle is logged and the loop simply tries
//! again next tick.

use crate::broadcast::EventBroadcaster;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tunebridge_core::{detect, PlayerDriver, Snapshot};

/// Poll cadence of the monitor loop.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// How long `stop` waits for the loop to wind down before aborting it.
const STOP_GRACE: Duration = Duration::from_secs(2);

/// Polls the player and broadcasts classified state changes.
pub struct MusicMonitor {
    driver: Arc<dyn PlayerDriver>,
    broadcaster: EventBroadcaster,
    poll_interval: Duration,
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    latest: Arc<RwLock<Option<Snapshot>>>,
    task: Option<JoinHandle<()>>,
}

impl MusicMonitor {
    pub fn new(driver: Arc<dyn PlayerDriver>, broadcaster: EventBroadcaster) -> Self {
        Self::with_interval(driver, broadcaster, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_interval(
        driver: Arc<dyn PlayerDriver>,
        broadcaster: EventBroadcaster,
        poll_interval: Duration,
    ) -> Self {
        Self {
            driver,
            broadcaster,
            poll_interval,
            running: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
            latest: Arc::new(RwLock::new(None)),
            task: None,
        }
    }

    /// Shared handle to the most recent snapshot, for late joiners that
    /// need a synthetic initial state without touching the driver.
    pub fn latest(&self) -> Arc<RwLock<Option<Snapshot>>> {
        self.latest.clone()
    }

    /// Start the monitor loop. No-op when already running.
    ///
    /// Every start begins from a cleared baseline, so the first cycle
    /// always broadcasts a full update.
    pub fn start(&mut self) {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("music monitor already running");
            return;
        }

        let driver = self.driver.clone();
        let broadcaster = self.broadcaster.clone();
        let latest = self.latest.clone();
        let running = self.running.clone();
        let shutdown = self.shutdown.clone();
        let interval = self.poll_interval;

        self.task = Some(tokio::spawn(async move {
            monitor_loop(driver, broadcaster, latest, running, shutdown, interval).await;
        }));

        info!("music monitor started");
    }

    /// Signal the loop to terminate and wait for it to exit.
    ///
    /// The wait is bounded: a loop stuck inside a driver call past the
    /// grace period is aborted rather than hung on.
    pub async fn stop(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        self.shutdown.notify_one();

        if let Some(mut task) = self.task.take() {
            if tokio::time::timeout(STOP_GRACE, &mut task).await.is_err() {
                warn!("monitor loop did not exit within grace period, aborting");
                task.abort();
            }
        }

        info!("music monitor stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

async fn monitor_loop(
    driver: Arc<dyn PlayerDriver>,
    broadcaster: EventBroadcaster,
    latest: Arc<RwLock<Option<Snapshot>>>,
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    interval: Duration,
) {
    let mut previous: Option<Snapshot> = None;

    while running.load(Ordering::SeqCst) {
        let current = acquire(driver.as_ref()).await;

        if let Some(event) = detect(previous.as_ref(), &current) {
            debug!(kind = event.kind(), "player state changed");
            broadcaster.publish(event);
        }

        *latest.write().await = Some(current.clone());
        // Stored even when nothing changed, so a transient read failure
        // cannot re-emit an old event once the bridge recovers.
        previous = Some(current);

        // The notify arm only cuts the sleep short; the running flag is
        // what actually terminates the loop, so a stale wake-up permit
        // cannot kill a restarted monitor.
        tokio::select! {
            _ = shutdown.notified() => {}
            _ = tokio::time::sleep(interval) => {}
        }
    }

    debug!("monitor loop exited");
}

/// Sample the player once. All-or-nothing: any failed read degrades the
/// whole cycle to the idle sentinel instead of mixing stale and fresh
/// fields.
async fn acquire(driver: &dyn PlayerDriver) -> Snapshot {
    let track = match driver.current_track().await {
        Ok(track) => track,
        Err(e) => {
            warn!("monitor: track read failed: {e}");
            return Snapshot::idle();
        }
    };

    let state = match driver.playback_state().await {
        Ok(state) => state,
        Err(e) => {
            warn!("monitor: state read failed: {e}");
            return Snapshot::idle();
        }
    };

    let volume = match driver.volume().await {
        Ok(volume) => volume,
        Err(e) => {
            warn!("monitor: volume read failed: {e}");
            return Snapshot::idle();
        }
    };

    Snapshot::observed(track, state, volume)
}
