use crate::classifier::{create_classifier, Classifier};
use crate::collector::ChannelCollector;
use crate::config::StrokeSenseConfig;
use crate::error::Result;
use crate::events::{PipelineState, StrokeEvent};
use crate::scheduler::{SchedulerMetrics, WindowScheduler};
use crate::sensor::SensorDriver;
use crate::signal::{Diagnostics, Signal, SignalReceiver};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// One `start`..`stop` span
#[derive(Debug, Clone)]
pub(super) struct Session {
    pub token: CancellationToken,
    pub test_mode: bool,
}

/// State shared with in-flight window deliveries
pub(super) struct Shared {
    pub classifier: Arc<dyn Classifier>,
    pub state: Signal<PipelineState>,
    pub last_event: Signal<Option<StrokeEvent>>,
    pub diagnostics: Diagnostics,
    /// Held while a session is ended and while session-bound results are applied
    pub gate: Mutex<()>,
}

impl Shared {
    /// Run `apply` only if `session` has not been ended. Returns whether it ran.
    pub fn apply_live<F: FnOnce(&Self)>(&self, session: &CancellationToken, apply: F) -> bool {
        let _gate = self.gate.lock();
        if session.is_cancelled() {
            return false;
        }
        apply(self);
        true
    }

    /// Cancel `session`; waits for any result currently being applied.
    pub fn end_session(&self, session: &CancellationToken) {
        let _gate = self.gate.lock();
        session.cancel();
    }

    pub fn publish_event(&self, event: StrokeEvent) {
        info!("Stroke detected: {}", event.description());
        self.diagnostics.push(format!("event: {}", event.description()));
        self.last_event.set(Some(event));
    }

    pub fn fail(&self, message: String) {
        error!("Pipeline error: {}", message);
        self.diagnostics.push(format!("error: {}", message));
        self.state.set(PipelineState::Error(message));
    }
}

/// Owns the pipeline and its lifecycle.
///
/// Created `Idle`. The orchestrator is the only writer of the published
/// signals; everything else observes them through the `subscribe_*`
/// methods, which replay the latest value and then follow updates.
pub struct PipelineOrchestrator {
    pub(super) config: StrokeSenseConfig,
    pub(super) shared: Arc<Shared>,
    pub(super) collector: Arc<ChannelCollector>,
    pub(super) scheduler: WindowScheduler,
    pub(super) driver: Arc<dyn SensorDriver>,
    pub(super) session: Mutex<Option<Session>>,
    /// Serialises start/stop
    pub(super) lifecycle: tokio::sync::Mutex<()>,
    pub(super) clock_origin: Instant,
}

impl PipelineOrchestrator {
    /// Build a pipeline using the classifier named in `config`
    pub fn new(config: StrokeSenseConfig, driver: Arc<dyn SensorDriver>) -> Result<Self> {
        config.validate()?;
        let classifier = create_classifier(&config.classifier)?;
        Self::with_classifier(config, driver, classifier)
    }

    /// Build a pipeline around an explicit classifier
    pub fn with_classifier(
        config: StrokeSenseConfig,
        driver: Arc<dyn SensorDriver>,
        classifier: Arc<dyn Classifier>,
    ) -> Result<Self> {
        config.validate()?;

        let availability = driver.available_channels();
        let collector = Arc::new(ChannelCollector::new(
            config.buffer_capacity(),
            availability,
        )?);
        let scheduler = WindowScheduler::new(config.window_interval(), Arc::clone(&collector))?;
        let diagnostics = Diagnostics::new(config.system.diagnostic_lines)?;

        info!(
            "Pipeline created: driver '{}', classifier '{}', {} samples per channel",
            driver.name(),
            classifier.name(),
            config.buffer_capacity()
        );

        Ok(Self {
            config,
            shared: Arc::new(Shared {
                classifier,
                state: Signal::new(PipelineState::Idle),
                last_event: Signal::new(None),
                diagnostics,
                gate: Mutex::new(()),
            }),
            collector,
            scheduler,
            driver,
            session: Mutex::new(None),
            lifecycle: tokio::sync::Mutex::new(()),
            clock_origin: Instant::now(),
        })
    }

    pub fn state(&self) -> PipelineState {
        self.shared.state.get()
    }

    pub fn last_event(&self) -> Option<StrokeEvent> {
        self.shared.last_event.get()
    }

    pub fn diagnostics(&self) -> String {
        self.shared.diagnostics.text()
    }

    pub fn subscribe_state(&self) -> SignalReceiver<PipelineState> {
        self.shared.state.subscribe()
    }

    pub fn subscribe_last_event(&self) -> SignalReceiver<Option<StrokeEvent>> {
        self.shared.last_event.subscribe()
    }

    pub fn subscribe_diagnostics(&self) -> SignalReceiver<String> {
        self.shared.diagnostics.subscribe()
    }

    /// Sample buffers, for inspection
    pub fn collector(&self) -> &Arc<ChannelCollector> {
        &self.collector
    }

    pub fn scheduler_metrics(&self) -> Arc<SchedulerMetrics> {
        self.scheduler.metrics()
    }

    pub fn config(&self) -> &StrokeSenseConfig {
        &self.config
    }

    /// Whether a session started with `start` is active
    pub fn is_active(&self) -> bool {
        self.session.lock().is_some()
    }

    /// Whether the active session runs in test mode
    pub fn is_test_mode(&self) -> bool {
        self.session.lock().as_ref().is_some_and(|s| s.test_mode)
    }

    /// Nanoseconds on the pipeline clock
    pub(super) fn now_nanos(&self) -> i64 {
        self.clock_origin.elapsed().as_nanos() as i64
    }
}

impl Drop for PipelineOrchestrator {
    fn drop(&mut self) {
        if let Some(session) = self.session.lock().take() {
            self.shared.end_session(&session.token);
        }
        self.driver.unregister();
        self.scheduler.stop();
    }
}
