use super::Classifier;
use crate::error::Result;
use crate::events::StrokeEvent;
use crate::window::SensorWindow;
use async_trait::async_trait;
use tracing::trace;

/// Slot for a trained stroke model.
///
/// No model ships with the crate yet, so every window classifies as "no
/// stroke".
#[derive(Debug, Default)]
pub struct ModelClassifier;

impl ModelClassifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Classifier for ModelClassifier {
    async fn classify(&self, window: &SensorWindow) -> Result<Option<StrokeEvent>> {
        trace!(
            "Model classifier received {} samples",
            window.total_samples()
        );
        Ok(None)
    }

    fn name(&self) -> &str {
        "model"
    }
}
