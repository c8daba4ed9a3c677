use super::Classifier;
use crate::rng::SeededRng;
use crate::error::{Result, StrokeError};
use crate::events::{Actor, StrokeEvent, StrokeKind};
use crate::window::SensorWindow;
use async_trait::async_trait;
use tracing::{debug, trace};

/// Lowest confidence the mock reports
const MIN_CONFIDENCE: f32 = 0.5;

/// Classifier that detects strokes at random.
///
/// Each call draws a detection with probability `detection_probability`; a
/// detection gets a uniform stroke kind, actor and a confidence in
/// [0.5, 1.0]. The event is stamped with the window end.
#[derive(Debug)]
pub struct MockClassifier {
    rng: SeededRng,
    detection_probability: f64,
}

impl MockClassifier {
    pub fn new(detection_probability: f64, seed: Option<u64>) -> Result<Self> {
        Self::with_rng(detection_probability, SeededRng::new(seed))
    }

    /// Use an injected random source
    pub fn with_rng(detection_probability: f64, rng: SeededRng) -> Result<Self> {
        if !(0.0..=1.0).contains(&detection_probability) {
            return Err(StrokeError::invalid_config(format!(
                "detection probability must be within [0, 1], got {}",
                detection_probability
            )));
        }

        debug!(
            "Mock classifier ready (detection probability {})",
            detection_probability
        );

        Ok(Self {
            rng,
            detection_probability,
        })
    }

    pub fn detection_probability(&self) -> f64 {
        self.detection_probability
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(&self, window: &SensorWindow) -> Result<Option<StrokeEvent>> {
        if !self.rng.chance(self.detection_probability) {
            trace!("Mock classifier: nothing in window ending {}", window.window_end);
            return Ok(None);
        }

        let kind = self
            .rng
            .choose(&StrokeKind::DETECTABLE)
            .unwrap_or(StrokeKind::Unknown);
        let actor = self.rng.choose(&Actor::ALL).unwrap_or(Actor::A);
        let confidence = self.rng.gen_range(MIN_CONFIDENCE..=1.0f32);

        Ok(Some(StrokeEvent::new(
            window.window_end,
            kind,
            confidence,
            actor,
        )))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
