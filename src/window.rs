use crate::sample::{Channel, Sample};
use std::sync::Arc;

/// Immutable snapshot of every channel buffer taken at one scheduler tick.
///
/// Sequences are ordered oldest to newest. The window is shared behind an
/// `Arc` between the classifier and diagnostics and is never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorWindow {
    acceleration: Arc<[Sample]>,
    angular_rate: Arc<[Sample]>,
    heart_rate: Arc<[Sample]>,
    /// Smallest timestamp across all sequences, 0 when empty
    pub window_start: i64,
    /// Largest timestamp across all sequences, 0 when empty
    pub window_end: i64,
}

impl SensorWindow {
    pub fn new(
        acceleration: Vec<Sample>,
        angular_rate: Vec<Sample>,
        heart_rate: Vec<Sample>,
    ) -> Self {
        let (window_start, window_end) = acceleration
            .iter()
            .chain(angular_rate.iter())
            .chain(heart_rate.iter())
            .map(|s| s.timestamp)
            .fold(None, |acc: Option<(i64, i64)>, ts| match acc {
                None => Some((ts, ts)),
                Some((lo, hi)) => Some((lo.min(ts), hi.max(ts))),
            })
            .unwrap_or((0, 0));

        Self {
            acceleration: acceleration.into(),
            angular_rate: angular_rate.into(),
            heart_rate: heart_rate.into(),
            window_start,
            window_end,
        }
    }

    /// A window with no samples
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new())
    }

    pub fn acceleration_samples(&self) -> &[Sample] {
        &self.acceleration
    }

    pub fn angular_rate_samples(&self) -> &[Sample] {
        &self.angular_rate
    }

    pub fn heart_rate_samples(&self) -> &[Sample] {
        &self.heart_rate
    }

    pub fn samples(&self, channel: Channel) -> &[Sample] {
        match channel {
            Channel::Acceleration => &self.acceleration,
            Channel::AngularRate => &self.angular_rate,
            Channel::HeartRate => &self.heart_rate,
            Channel::Unknown => &[],
        }
    }

    pub fn total_samples(&self) -> usize {
        self.acceleration.len() + self.angular_rate.len() + self.heart_rate.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_samples() == 0
    }

    /// Span covered by the window in nanoseconds
    pub fn span_nanos(&self) -> i64 {
        self.window_end - self.window_start
    }
}
