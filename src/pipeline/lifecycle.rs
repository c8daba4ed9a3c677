use super::dispatch::SessionSink;
use super::orchestrator::{PipelineOrchestrator, Session};
use crate::collector::ChannelAvailability;
use crate::error::{Result, StrokeError};
use crate::events::{Actor, PipelineState, StrokeEvent, StrokeKind};
use crate::sample::Sample;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

impl PipelineOrchestrator {
    /// Start sampling and classification.
    ///
    /// Without the required sensors, `start(false)` moves to `Error` and
    /// leaves the scheduler stopped; `start(true)` runs anyway so events can
    /// be simulated. Calling `start` on an active pipeline does nothing.
    pub async fn start(&self, test_mode: bool) -> Result<()> {
        let _lifecycle = self.lifecycle.lock().await;

        if self.session.lock().is_some() {
            warn!("Pipeline already started, ignoring start request");
            return Ok(());
        }

        info!("Starting pipeline (test mode: {})", test_mode);

        let availability = self.collector.availability();
        let missing = availability.missing(&self.config.required_channels());

        if !missing.is_empty() {
            let err = StrokeError::CapabilityUnavailable { missing };
            if !test_mode {
                self.shared.fail(err.to_string());
                return Err(err);
            }
            warn!("Test mode: continuing despite {}", err);
            self.shared
                .diagnostics
                .push(format!("test mode: continuing despite {}", err));
        }

        let hardware_present = availability != ChannelAvailability::none();
        if hardware_present {
            self.collector.set_callback(Arc::new(|sample: &Sample| {
                trace!(
                    "{} {:?} @ {}",
                    sample.channel.label(),
                    sample.values(),
                    sample.timestamp
                );
            }));

            if let Err(e) = self.driver.register(Arc::clone(&self.collector)).await {
                self.collector.clear_callback();
                self.shared.fail(e.to_string());
                return Err(e);
            }
            debug!("Sensor driver '{}' registered", self.driver.name());
        }

        let token = CancellationToken::new();
        let sink = Arc::new(SessionSink {
            shared: Arc::clone(&self.shared),
            session: token.clone(),
        });
        self.scheduler.start(sink);

        *self.session.lock() = Some(Session { token, test_mode });

        self.shared.diagnostics.push(if test_mode {
            "pipeline started in test mode"
        } else {
            "pipeline started"
        });
        self.shared.state.set(PipelineState::Running);
        info!("Pipeline running");

        Ok(())
    }

    /// Unregister sensors, stop the scheduler, drop buffered samples and go
    /// back to `Idle`. Idempotent. In-flight classifications are cancelled
    /// and their results discarded.
    pub async fn stop(&self) {
        let _lifecycle = self.lifecycle.lock().await;

        let session = self.session.lock().take();
        if let Some(session) = &session {
            self.shared.end_session(&session.token);
        }

        self.driver.unregister();
        self.collector.clear_callback();
        self.scheduler.stop();
        self.collector.clear_all();

        if session.is_some() {
            self.shared.diagnostics.push("pipeline stopped");
            info!("Pipeline stopped");
        }
        self.shared.state.set(PipelineState::Idle);
    }

    /// Publish a synthetic stroke without touching the sensor path.
    ///
    /// Only honoured while a test-mode session is `Running`; returns whether
    /// the event was published.
    pub fn simulate(&self, kind: StrokeKind, actor: Actor) -> bool {
        let session = self.session.lock().clone();
        let Some(session) = session.filter(|s| s.test_mode) else {
            debug!("Ignoring simulate({:?}, {:?}) outside test mode", kind, actor);
            return false;
        };

        let state = self.state();
        if !state.is_running() {
            debug!("Ignoring simulate({:?}, {:?}) while {}", kind, actor, state);
            return false;
        }

        let event = StrokeEvent::new(
            self.now_nanos(),
            kind,
            self.config.classifier.simulated_confidence,
            actor,
        );
        self.shared.apply_live(&session.token, |shared| {
            shared
                .diagnostics
                .push(format!("simulated {:?} for player {:?}", kind, actor));
            shared.publish_event(event);
        })
    }
}
