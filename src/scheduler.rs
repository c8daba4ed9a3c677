use crate::collector::ChannelCollector;
use crate::error::{Result, StrokeError};
use crate::window::SensorWindow;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// Consumer of scheduler output
#[async_trait]
pub trait WindowSink: Send + Sync {
    /// Handle one window. Deliveries may overlap when this is slower than
    /// the tick interval.
    async fn on_window(&self, window: Arc<SensorWindow>);

    /// The timer died without `stop()` being called
    fn on_scheduler_failure(&self, reason: String);
}

/// Counters describing scheduler activity
#[derive(Debug, Default)]
pub struct SchedulerMetrics {
    ticks: AtomicU64,
    in_flight: AtomicU64,
    completed: AtomicU64,
}

impl SchedulerMetrics {
    /// Timer ticks fired, one window per tick
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Deliveries currently being handled by the sink
    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Deliveries the sink finished (not counting cancelled ones)
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }
}

/// Periodic timer that snapshots the collector into windows.
///
/// Every `interval` the scheduler takes one [`SensorWindow`] and hands it to
/// the sink on its own task, so a slow sink never delays the next tick.
/// Stopping cancels the timer and every delivery still in progress.
pub struct WindowScheduler {
    interval: Duration,
    collector: Arc<ChannelCollector>,
    token: Mutex<Option<CancellationToken>>,
    timer: Mutex<Option<AbortHandle>>,
    metrics: Arc<SchedulerMetrics>,
}

impl WindowScheduler {
    pub fn new(interval: Duration, collector: Arc<ChannelCollector>) -> Result<Self> {
        if interval.is_zero() {
            return Err(StrokeError::invalid_config(
                "Window interval must be greater than 0",
            ));
        }

        Ok(Self {
            interval,
            collector,
            token: Mutex::new(None),
            timer: Mutex::new(None),
            metrics: Arc::new(SchedulerMetrics::default()),
        })
    }

    /// Start ticking. Returns `false` without doing anything if already
    /// running. Must be called within a Tokio runtime.
    pub fn start(&self, sink: Arc<dyn WindowSink>) -> bool {
        let mut slot = self.token.lock();
        if slot.as_ref().is_some_and(|t| !t.is_cancelled()) {
            warn!("Window scheduler is already running");
            return false;
        }

        let token = CancellationToken::new();
        *slot = Some(token.clone());
        drop(slot);

        info!("Starting window scheduler ({:?} interval)", self.interval);

        let timer = tokio::spawn(tick_loop(
            self.interval,
            Arc::clone(&self.collector),
            Arc::clone(&sink),
            token.clone(),
            Arc::clone(&self.metrics),
        ));
        *self.timer.lock() = Some(timer.abort_handle());

        // Watchdog: a timer that ends on its own is a failure.
        tokio::spawn(async move {
            let outcome = timer.await;
            if token.is_cancelled() {
                return;
            }

            let reason = match outcome {
                Ok(()) => "window timer exited unexpectedly".to_string(),
                Err(e) if e.is_panic() => format!("window timer panicked: {}", e),
                Err(e) => format!("window timer aborted: {}", e),
            };
            error!("{}", reason);
            token.cancel();
            sink.on_scheduler_failure(reason);
        });

        true
    }

    /// Cancel the timer and in-flight deliveries. Idempotent, never blocks.
    pub fn stop(&self) {
        if let Some(token) = self.token.lock().take() {
            token.cancel();
            info!("Window scheduler stopped");
        }
        if let Some(timer) = self.timer.lock().take() {
            timer.abort();
        }
    }

    /// Kill the timer task without going through `stop()`
    #[cfg(test)]
    pub(crate) fn abort_timer(&self) {
        if let Some(timer) = self.timer.lock().take() {
            timer.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.token
            .lock()
            .as_ref()
            .is_some_and(|t| !t.is_cancelled())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn metrics(&self) -> Arc<SchedulerMetrics> {
        Arc::clone(&self.metrics)
    }
}

impl Drop for WindowScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn tick_loop(
    period: Duration,
    collector: Arc<ChannelCollector>,
    sink: Arc<dyn WindowSink>,
    token: CancellationToken,
    metrics: Arc<SchedulerMetrics>,
) {
    // First window one full interval after start.
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = interval.tick() => {}
        }

        let window = Arc::new(collector.snapshot());
        let tick = metrics.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(
            "Tick {}: window of {} samples [{}, {}]",
            tick,
            window.total_samples(),
            window.window_start,
            window.window_end
        );

        let sink = Arc::clone(&sink);
        let delivery = token.child_token();
        let metrics = Arc::clone(&metrics);
        metrics.in_flight.fetch_add(1, Ordering::Relaxed);

        tokio::spawn(async move {
            tokio::select! {
                _ = delivery.cancelled() => {
                    trace!("Window delivery {} cancelled", tick);
                }
                _ = sink.on_window(window) => {
                    metrics.completed.fetch_add(1, Ordering::Relaxed);
                }
            }
            metrics.in_flight.fetch_sub(1, Ordering::Relaxed);
        });
    }

    debug!("Window timer loop ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::ChannelAvailability;
    use crate::sample::Channel;
    use parking_lot::Mutex as PlMutex;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct RecordingSink {
        windows: PlMutex<Vec<Arc<SensorWindow>>>,
        delay: Option<Duration>,
        concurrent: AtomicUsize,
        max_concurrent: AtomicUsize,
        failures: PlMutex<Vec<String>>,
    }

    #[async_trait]
    impl WindowSink for RecordingSink {
        async fn on_window(&self, window: Arc<SensorWindow>) {
            let now = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_concurrent.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.windows.lock().push(window);
            self.concurrent.fetch_sub(1, Ordering::SeqCst);
        }

        fn on_scheduler_failure(&self, reason: String) {
            self.failures.lock().push(reason);
        }
    }

    fn collector() -> Arc<ChannelCollector> {
        Arc::new(ChannelCollector::new(50, ChannelAvailability::all()).unwrap())
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(WindowScheduler::new(Duration::ZERO, collector()).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_interval() {
        let collector = collector();
        collector.on_sample(10, Channel::Acceleration, &[0.0, 0.0, 9.8], 3);
        let scheduler = WindowScheduler::new(Duration::from_millis(300), Arc::clone(&collector)).unwrap();
        let sink = Arc::new(RecordingSink::default());

        assert!(scheduler.start(sink.clone()));
        tokio::time::sleep(Duration::from_millis(950)).await;

        assert_eq!(scheduler.metrics().ticks(), 3);
        let windows = sink.windows.lock();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].window_end, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_is_noop_and_stop_is_idempotent() {
        let scheduler = WindowScheduler::new(Duration::from_millis(100), collector()).unwrap();
        let sink = Arc::new(RecordingSink::default());

        assert!(scheduler.start(sink.clone()));
        assert!(!scheduler.start(sink.clone()));
        assert!(scheduler.is_running());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(scheduler.metrics().ticks(), 2);

        scheduler.stop();
        scheduler.stop();
        assert!(!scheduler.is_running());

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(scheduler.metrics().ticks(), 2);
        assert!(sink.failures.lock().is_empty());

        // Can be restarted after stop
        assert!(scheduler.start(sink.clone()));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(scheduler.metrics().ticks(), 3);
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_sink_does_not_delay_ticks() {
        let scheduler = WindowScheduler::new(Duration::from_millis(100), collector()).unwrap();
        let sink = Arc::new(RecordingSink {
            delay: Some(Duration::from_millis(350)),
            ..Default::default()
        });

        scheduler.start(sink.clone());
        tokio::time::sleep(Duration::from_millis(1_050)).await;

        assert_eq!(scheduler.metrics().ticks(), 10);
        assert!(sink.max_concurrent.load(Ordering::SeqCst) >= 3);
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_in_flight_deliveries() {
        let scheduler = WindowScheduler::new(Duration::from_millis(100), collector()).unwrap();
        let sink = Arc::new(RecordingSink {
            delay: Some(Duration::from_secs(10)),
            ..Default::default()
        });

        scheduler.start(sink.clone());
        tokio::time::sleep(Duration::from_millis(350)).await;
        let metrics = scheduler.metrics();
        assert_eq!(metrics.in_flight(), 3);

        scheduler.stop();
        tokio::time::sleep(Duration::from_secs(20)).await;

        assert_eq!(metrics.in_flight(), 0);
        assert_eq!(metrics.completed(), 0);
        assert!(sink.windows.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dead_timer_reports_failure() {
        let scheduler = WindowScheduler::new(Duration::from_millis(100), collector()).unwrap();
        let sink = Arc::new(RecordingSink::default());

        scheduler.start(sink.clone());
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(scheduler.metrics().ticks(), 1);

        scheduler.abort_timer();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let failures = sink.failures.lock().clone();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].contains("window timer aborted"));
        assert!(!scheduler.is_running());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(scheduler.metrics().ticks(), 1);

        // A failed scheduler can be started again
        assert!(scheduler.start(sink.clone()));
        tokio::time::sleep(Duration::from_millis(110)).await;
        assert_eq!(scheduler.metrics().ticks(), 2);
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_does_not_report_failure() {
        let scheduler = WindowScheduler::new(Duration::from_millis(100), collector()).unwrap();
        let sink = Arc::new(RecordingSink::default());

        scheduler.start(sink.clone());
        tokio::time::sleep(Duration::from_millis(150)).await;
        scheduler.stop();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(sink.failures.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_windows_are_independent_snapshots() {
        let collector = collector();
        let scheduler = WindowScheduler::new(Duration::from_millis(100), Arc::clone(&collector)).unwrap();
        let sink = Arc::new(RecordingSink::default());

        collector.on_sample(1, Channel::Acceleration, &[0.0, 0.0, 9.8], 3);
        scheduler.start(sink.clone());
        tokio::time::sleep(Duration::from_millis(150)).await;

        collector.on_sample(2, Channel::Acceleration, &[0.0, 0.0, 9.8], 3);
        tokio::time::sleep(Duration::from_millis(100)).await;
        collector.clear_all();
        scheduler.stop();

        let windows = sink.windows.lock();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].acceleration_samples().len(), 1);
        assert_eq!(windows[1].acceleration_samples().len(), 2);
        assert_eq!(windows[1].window_end, 2);
    }
}
