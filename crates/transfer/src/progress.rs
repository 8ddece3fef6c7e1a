use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::rate::{DEFAULT_ALPHA, RateEstimator};
use crate::render::{ProgressRenderer, ProgressSnapshot, SharedRenderer};
use crate::types::TransferSession;

/// Default redraw period.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Periodically samples a session's byte counter, updates the rate
/// estimate, and redraws the status line.
///
/// The tick task is stopped by [`finish`](Self::finish),
/// [`abort`](Self::abort), or by dropping the ticker.
pub struct ProgressTicker<W: Write + Send + 'static> {
    session: TransferSession,
    estimator: Arc<Mutex<RateEstimator>>,
    renderer: SharedRenderer<W>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl<W: Write + Send + 'static> ProgressTicker<W> {
    /// Starts ticking every `interval` in a background tokio task.
    ///
    /// The first tick fires immediately. Must be called from within a
    /// tokio runtime.
    pub fn start(
        session: TransferSession,
        renderer: SharedRenderer<W>,
        interval: Duration,
    ) -> Self {
        let estimator = Arc::new(Mutex::new(RateEstimator::starting_at(
            DEFAULT_ALPHA,
            session.started_at(),
            session.uploaded_bytes(),
        )));
        let cancel = CancellationToken::new();

        let handle = {
            let session = session.clone();
            let estimator = Arc::clone(&estimator);
            let renderer = Arc::clone(&renderer);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

                loop {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => tick(&session, &estimator, &renderer),
                    }
                }
            })
        };

        Self {
            session,
            estimator,
            renderer,
            cancel,
            handle: Some(handle),
        }
    }

    /// Smoothed rate in bytes/sec as of the last tick.
    pub fn smoothed_rate(&self) -> f64 {
        self.estimator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .smoothed()
    }

    /// Stops ticking, draws a final line, and ends it.
    pub async fn finish(mut self) {
        self.stop().await;
        tick(&self.session, &self.estimator, &self.renderer);
        self.end_line();
    }

    /// Stops ticking without a final draw.
    pub async fn abort(mut self) {
        self.stop().await;
        self.end_line();
    }

    async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::debug!("progress task ended abnormally: {e}");
            }
        }
    }

    fn end_line(&self) {
        let mut r = self.renderer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = r.finish() {
            tracing::debug!("failed to end progress line: {e}");
        }
    }
}

impl<W: Write + Send + 'static> Drop for ProgressTicker<W> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn tick<W: Write>(
    session: &TransferSession,
    estimator: &Mutex<RateEstimator>,
    renderer: &Mutex<ProgressRenderer<W>>,
) {
    let done = session.uploaded_bytes();
    let total = session.total_bytes();

    let snapshot = {
        let mut est = estimator.lock().unwrap_or_else(PoisonError::into_inner);
        est.sample(done, Instant::now());
        ProgressSnapshot {
            done,
            total,
            rate: est.smoothed(),
            eta: est.eta(total, done),
        }
    };

    let mut r = renderer.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(e) = r.draw(&snapshot) {
        tracing::debug!("failed to draw progress: {e}");
    }
}
