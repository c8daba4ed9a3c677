use crate::error::Result;
use crate::ring_buffer::{RingBuffer, RingBufferStatsSnapshot};
use crate::sample::{Channel, Sample};
use crate::window::SensorWindow;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Callback invoked for every routed sample, for live diagnostics
pub type SampleCallback = Arc<dyn Fn(&Sample) + Send + Sync>;

/// Which sensor channels the hardware provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelAvailability {
    pub acceleration: bool,
    pub angular_rate: bool,
    pub heart_rate: bool,
}

impl ChannelAvailability {
    pub fn all() -> Self {
        Self {
            acceleration: true,
            angular_rate: true,
            heart_rate: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn has(&self, channel: Channel) -> bool {
        match channel {
            Channel::Acceleration => self.acceleration,
            Channel::AngularRate => self.angular_rate,
            Channel::HeartRate => self.heart_rate,
            Channel::Unknown => false,
        }
    }

    /// Channels from `required` the hardware does not offer
    pub fn missing(&self, required: &[Channel]) -> Vec<Channel> {
        required.iter().copied().filter(|c| !self.has(*c)).collect()
    }
}

/// Routes raw samples into one ring buffer per channel.
///
/// Each buffer has its own lock, so writers on different channels never
/// contend with each other.
pub struct ChannelCollector {
    acceleration: RingBuffer<Sample>,
    angular_rate: RingBuffer<Sample>,
    heart_rate: RingBuffer<Sample>,
    availability: ChannelAvailability,
    callback: RwLock<Option<SampleCallback>>,
    dropped_samples: AtomicU64,
}

impl ChannelCollector {
    /// Create a collector whose buffers each hold `capacity` samples.
    ///
    /// `availability` comes from probing the hardware once and never changes.
    pub fn new(capacity: usize, availability: ChannelAvailability) -> Result<Self> {
        debug!(
            "Creating channel collector (capacity {}, availability {:?})",
            capacity, availability
        );

        Ok(Self {
            acceleration: RingBuffer::new(capacity)?,
            angular_rate: RingBuffer::new(capacity)?,
            heart_rate: RingBuffer::new(capacity)?,
            availability,
            callback: RwLock::new(None),
            dropped_samples: AtomicU64::new(0),
        })
    }

    /// Install the per-sample callback, replacing any previous one
    pub fn set_callback(&self, callback: SampleCallback) {
        *self.callback.write() = Some(callback);
    }

    pub fn clear_callback(&self) {
        *self.callback.write() = None;
    }

    /// Entry point for the raw sample source
    pub fn on_sample(&self, timestamp: i64, channel: Channel, values: &[f32], accuracy: u8) {
        self.push(Sample::new(timestamp, channel, values, accuracy));
    }

    /// Route an already-built sample to its channel buffer
    pub fn push(&self, sample: Sample) {
        let Some(buffer) = self.buffer(sample.channel) else {
            self.dropped_samples.fetch_add(1, Ordering::Relaxed);
            trace!("Dropping sample on unbuffered channel {:?}", sample.channel);
            return;
        };

        if !sample.is_well_formed() {
            warn!(
                "Sample on {} has {} values, expected {:?}",
                sample.channel.label(),
                sample.values().len(),
                sample.channel.arity()
            );
        }

        // Clone the callback out so the lock is not held while it runs.
        let callback = self.callback.read().clone();
        if let Some(callback) = callback {
            callback(&sample);
        }

        trace!(
            "Buffering {} sample at {}",
            sample.channel.label(),
            sample.timestamp
        );
        buffer.add(sample);
    }

    /// Buffer backing a channel; `None` for [`Channel::Unknown`]
    pub fn buffer(&self, channel: Channel) -> Option<&RingBuffer<Sample>> {
        match channel {
            Channel::Acceleration => Some(&self.acceleration),
            Channel::AngularRate => Some(&self.angular_rate),
            Channel::HeartRate => Some(&self.heart_rate),
            Channel::Unknown => None,
        }
    }

    /// Snapshot every buffer into one window
    pub fn snapshot(&self) -> SensorWindow {
        SensorWindow::new(
            self.acceleration.get_all(),
            self.angular_rate.get_all(),
            self.heart_rate.get_all(),
        )
    }

    /// Drop all buffered history
    pub fn clear_all(&self) {
        for channel in Channel::BUFFERED {
            if let Some(buffer) = self.buffer(channel) {
                buffer.clear();
            }
        }
        debug!("Cleared all channel buffers");
    }

    pub fn availability(&self) -> ChannelAvailability {
        self.availability
    }

    pub fn is_available(&self, channel: Channel) -> bool {
        self.availability.has(channel)
    }

    /// Number of samples currently buffered per channel
    pub fn len(&self, channel: Channel) -> usize {
        self.buffer(channel).map_or(0, |b| b.len())
    }

    /// True when no channel holds any sample
    pub fn is_empty(&self) -> bool {
        Channel::BUFFERED.iter().all(|c| self.len(*c) == 0)
    }

    pub fn stats(&self, channel: Channel) -> Option<RingBufferStatsSnapshot> {
        self.buffer(channel).map(|b| b.stats())
    }

    pub fn dropped_samples(&self) -> u64 {
        self.dropped_samples.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_routes_samples_by_channel() {
        let collector = ChannelCollector::new(10, ChannelAvailability::all()).unwrap();

        collector.on_sample(1, Channel::Acceleration, &[0.0, 0.0, 9.8], 3);
        collector.on_sample(2, Channel::AngularRate, &[0.1, 0.2, 0.3], 3);
        collector.on_sample(3, Channel::HeartRate, &[88.0], 2);
        collector.on_sample(4, Channel::Acceleration, &[0.1, 0.0, 9.7], 3);

        assert_eq!(collector.len(Channel::Acceleration), 2);
        assert_eq!(collector.len(Channel::AngularRate), 1);
        assert_eq!(collector.len(Channel::HeartRate), 1);
    }

    #[test]
    fn test_unknown_channel_is_dropped() {
        let collector = ChannelCollector::new(10, ChannelAvailability::all()).unwrap();
        collector.on_sample(1, Channel::Unknown, &[1.0], 0);

        assert!(collector.is_empty());
        assert_eq!(collector.dropped_samples(), 1);
        assert_eq!(collector.len(Channel::Unknown), 0);
    }

    #[test]
    fn test_callback_sees_every_routed_sample() {
        let collector = ChannelCollector::new(4, ChannelAvailability::all()).unwrap();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        collector.set_callback(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        }));

        for i in 0..6 {
            collector.on_sample(i, Channel::Acceleration, &[0.0, 0.0, 1.0], 3);
        }
        collector.on_sample(7, Channel::Unknown, &[0.0], 0);

        assert_eq!(seen.load(Ordering::Relaxed), 6);

        collector.clear_callback();
        collector.on_sample(8, Channel::HeartRate, &[70.0], 3);
        assert_eq!(seen.load(Ordering::Relaxed), 6);
    }

    #[test]
    fn test_snapshot_and_clear_all() {
        let collector = ChannelCollector::new(3, ChannelAvailability::all()).unwrap();
        for i in 0..5 {
            collector.on_sample(i * 10, Channel::Acceleration, &[i as f32, 0.0, 0.0], 3);
        }
        collector.on_sample(5, Channel::HeartRate, &[60.0], 3);

        let window = collector.snapshot();
        let timestamps: Vec<i64> = window
            .acceleration_samples()
            .iter()
            .map(|s| s.timestamp)
            .collect();
        assert_eq!(timestamps, vec![20, 30, 40]);
        assert_eq!(window.window_start, 5);
        assert_eq!(window.window_end, 40);

        collector.clear_all();
        assert!(collector.is_empty());
        // Previously taken window is untouched
        assert_eq!(window.acceleration_samples().len(), 3);
    }

    #[test]
    fn test_availability_missing() {
        let availability = ChannelAvailability {
            acceleration: true,
            angular_rate: false,
            heart_rate: false,
        };
        let collector = ChannelCollector::new(5, availability).unwrap();

        assert!(collector.is_available(Channel::Acceleration));
        assert!(!collector.is_available(Channel::HeartRate));
        assert_eq!(
            availability.missing(&[Channel::Acceleration, Channel::AngularRate]),
            vec![Channel::AngularRate]
        );
        assert!(ChannelAvailability::all()
            .missing(&Channel::BUFFERED)
            .is_empty());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(ChannelCollector::new(0, ChannelAvailability::all()).is_err());
    }
}
