//! Stroke classification stage.
//!
//! A [`Classifier`] turns one [`SensorWindow`] into at most one
//! [`StrokeEvent`]. Which implementation runs is decided once, when the
//! pipeline is built, through [`create_classifier`].

mod mock;
mod model;

pub use mock::MockClassifier;
pub use model::ModelClassifier;

use crate::config::ClassifierConfig;
use crate::error::Result;
use crate::events::StrokeEvent;
use crate::window::SensorWindow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Window to optional stroke.
///
/// Implementations must not mutate the window and must tolerate concurrent
/// calls with independent windows. Returning `Ok(None)` means nothing was
/// detected; `Err` is a classification fault.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, window: &SensorWindow) -> Result<Option<StrokeEvent>>;

    /// Name used in logs and diagnostics
    fn name(&self) -> &str;
}

/// Classifier implementations selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClassifierKind {
    /// Random detections, for development and tests
    #[default]
    Mock,
    /// Trained model
    Model,
}

/// Build the classifier described by `config`
pub fn create_classifier(config: &ClassifierConfig) -> Result<Arc<dyn Classifier>> {
    info!("Creating {:?} classifier", config.variant);

    let classifier: Arc<dyn Classifier> = match config.variant {
        ClassifierKind::Mock => Arc::new(MockClassifier::new(
            config.detection_probability,
            config.seed,
        )?),
        ClassifierKind::Model => Arc::new(ModelClassifier::new()),
    };

    Ok(classifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrokeSenseConfig;

    #[tokio::test]
    async fn test_factory_selects_variant() {
        let mut config = StrokeSenseConfig::default().classifier;

        config.variant = ClassifierKind::Mock;
        assert_eq!(create_classifier(&config).unwrap().name(), "mock");

        config.variant = ClassifierKind::Model;
        let model = create_classifier(&config).unwrap();
        assert_eq!(model.name(), "model");
        assert_eq!(model.classify(&SensorWindow::empty()).await.unwrap(), None);
    }

    #[test]
    fn test_factory_rejects_bad_probability() {
        let mut config = StrokeSenseConfig::default().classifier;
        config.detection_probability = -0.1;
        assert!(create_classifier(&config).is_err());
    }
}
