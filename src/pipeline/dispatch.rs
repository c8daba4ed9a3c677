use super::orchestrator::Shared;
use crate::error::StrokeError;
use crate::scheduler::WindowSink;
use crate::window::SensorWindow;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Scheduler sink bound to one session.
///
/// Results are applied only while the session is live; anything that
/// finishes after `stop()` is dropped.
pub(super) struct SessionSink {
    pub shared: Arc<Shared>,
    pub session: CancellationToken,
}

/// Aborts the classification task if the delivery is cancelled
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[async_trait]
impl WindowSink for SessionSink {
    async fn on_window(&self, window: Arc<SensorWindow>) {
        // Separate task so a panicking classifier is reported, not fatal.
        let classifier = Arc::clone(&self.shared.classifier);
        let handle = tokio::spawn(async move { classifier.classify(&window).await });
        let _guard = AbortOnDrop(handle.abort_handle());

        let outcome = tokio::select! {
            _ = self.session.cancelled() => None,
            joined = handle => Some(joined),
        };

        let Some(outcome) = outcome else {
            debug!("Classification cancelled by stop");
            return;
        };

        let applied = match outcome {
            Ok(Ok(Some(event))) => self
                .shared
                .apply_live(&self.session, |shared| shared.publish_event(event)),
            Ok(Ok(None)) => {
                debug!("No stroke in window");
                true
            }
            Ok(Err(e)) => {
                let message = match e {
                    StrokeError::ClassificationFault { message } => message,
                    other => other.to_string(),
                };
                let message = StrokeError::classification(message).to_string();
                self.shared
                    .apply_live(&self.session, |shared| shared.fail(message))
            }
            Err(e) if e.is_panic() => {
                let message = StrokeError::classification(format!(
                    "{} classifier panicked",
                    self.shared.classifier.name()
                ))
                .to_string();
                self.shared
                    .apply_live(&self.session, |shared| shared.fail(message))
            }
            Err(e) => {
                debug!("Classification task ended early: {}", e);
                true
            }
        };

        if !applied {
            warn!("Discarding classification result that arrived after stop");
        }
    }

    fn on_scheduler_failure(&self, reason: String) {
        if !self
            .shared
            .apply_live(&self.session, |shared| shared.fail(reason))
        {
            debug!("Ignoring scheduler failure after stop");
        }
    }
}
