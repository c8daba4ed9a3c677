use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Logical sensor stream a sample belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// Linear acceleration, three axes
    Acceleration,
    /// Gyroscope angular rate, three axes
    AngularRate,
    /// Heart rate, scalar
    HeartRate,
    /// Anything the hardware reports that we do not buffer
    Unknown,
}

impl Channel {
    /// Channels that own a ring buffer, in window order
    pub const BUFFERED: [Channel; 3] = [
        Channel::Acceleration,
        Channel::AngularRate,
        Channel::HeartRate,
    ];

    /// Number of values a well-formed sample on this channel carries
    pub fn arity(&self) -> Option<usize> {
        match self {
            Channel::Acceleration | Channel::AngularRate => Some(3),
            Channel::HeartRate => Some(1),
            Channel::Unknown => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Channel::Acceleration => "acceleration",
            Channel::AngularRate => "angular_rate",
            Channel::HeartRate => "heart_rate",
            Channel::Unknown => "unknown",
        }
    }
}

/// One raw reading from a sensor channel.
///
/// Immutable once built; the value vector is shared so that buffer snapshots
/// clone a pointer rather than the readings themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Monotonic timestamp in nanoseconds
    pub timestamp: i64,
    pub channel: Channel,
    values: Arc<[f32]>,
    /// Hardware quality code (0 = unreliable, 3 = high)
    pub accuracy: u8,
}

impl Sample {
    pub fn new(timestamp: i64, channel: Channel, values: &[f32], accuracy: u8) -> Self {
        Self {
            timestamp,
            channel,
            values: Arc::from(values),
            accuracy,
        }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Euclidean norm of the value vector
    pub fn magnitude(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Whether the value count matches what the channel expects
    pub fn is_well_formed(&self) -> bool {
        match self.channel.arity() {
            Some(n) => self.values.len() == n,
            None => true,
        }
    }
}
