//! Self-correcting repeating task driver
//!
//! A [`Schedule`] runs one async action over and over, waiting at least `min_period`
//! between the *starts* of consecutive iterations. When an iteration overruns the
//! period the next one starts straight away, so slow iterations lower the effective
//! rate instead of queueing a backlog. Iterations of one loop never overlap.
//!
//! The action owns its own error handling: the scheduler neither retries nor looks
//! at results.
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

type Action = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

pub struct Schedule {
    action: Action,
    min_period: Duration,
    stop_tx: watch::Sender<bool>,
}

impl Schedule {
    pub fn new<F, Fut>(action: F, min_period: Duration) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (stop_tx, _) = watch::channel(false);
        Self {
            action: Arc::new(move || action().boxed()),
            min_period,
            stop_tx,
        }
    }

    /// Spawn the loop on the current runtime
    ///
    /// The returned handle completes once the loop has been stopped and its last
    /// iteration has finished. Every call spawns an independent loop; callers that
    /// want single-flight must call this once.
    pub fn start(&self) -> JoinHandle<()> {
        let action = self.action.clone();
        let min_period = self.min_period;
        let stop_rx = self.stop_tx.subscribe();
        tokio::spawn(run(action, min_period, stop_rx))
    }

    /// Prevent any further iteration from being scheduled
    ///
    /// An iteration already in flight runs to completion; only the wait before the
    /// next one is cut short. Calling this more than once is harmless.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }

    pub fn min_period(&self) -> Duration {
        self.min_period
    }
}

fn stopped(stop_rx: &watch::Receiver<bool>) -> bool {
    // A dropped Schedule can never be stopped explicitly, so treat it as stopped
    *stop_rx.borrow() || stop_rx.has_changed().is_err()
}

async fn run(action: Action, min_period: Duration, mut stop_rx: watch::Receiver<bool>) {
    loop {
        let started = Instant::now();
        action().await;

        let remaining = min_period.saturating_sub(started.elapsed());
        if !remaining.is_zero() && !stopped(&stop_rx) {
            tokio::select! {
                _ = sleep(remaining) => {}
                _ = stop_rx.changed() => {}
            }
        }

        if stopped(&stop_rx) {
            log::debug!("Schedule stopped");
            return;
        }
    }
}
