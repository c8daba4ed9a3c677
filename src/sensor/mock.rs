use super::SensorDriver;
use crate::collector::{ChannelAvailability, ChannelCollector};
use crate::error::{Result, StrokeError};
use crate::sample::Channel;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Scriptable sensor driver for tests without hardware
pub struct MockSensorDriver {
    availability: ChannelAvailability,
    fail_registration: AtomicBool,
    registrations: AtomicUsize,
    collector: Mutex<Option<Arc<ChannelCollector>>>,
}

impl MockSensorDriver {
    pub fn new(availability: ChannelAvailability) -> Self {
        Self {
            availability,
            fail_registration: AtomicBool::new(false),
            registrations: AtomicUsize::new(0),
            collector: Mutex::new(None),
        }
    }

    /// Make subsequent `register` calls fail
    pub fn set_fail_registration(&self, fail: bool) {
        self.fail_registration.store(fail, Ordering::Relaxed);
    }

    /// Push a sample as the hardware would; false when not registered
    pub fn emit(&self, timestamp: i64, channel: Channel, values: &[f32]) -> bool {
        let collector = self.collector.lock().clone();
        match collector {
            Some(collector) => {
                collector.on_sample(timestamp, channel, values, 3);
                true
            }
            None => false,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.collector.lock().is_some()
    }

    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SensorDriver for MockSensorDriver {
    fn available_channels(&self) -> ChannelAvailability {
        self.availability
    }

    async fn register(&self, collector: Arc<ChannelCollector>) -> Result<()> {
        if self.fail_registration.load(Ordering::Relaxed) {
            return Err(StrokeError::registration("mock driver refused listener"));
        }

        debug!("Mock sensor driver registered");
        self.registrations.fetch_add(1, Ordering::Relaxed);
        *self.collector.lock() = Some(collector);
        Ok(())
    }

    fn unregister(&self) {
        if self.collector.lock().take().is_some() {
            debug!("Mock sensor driver unregistered");
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_only_while_registered() {
        let driver = MockSensorDriver::new(ChannelAvailability::all());
        let collector = Arc::new(ChannelCollector::new(8, ChannelAvailability::all()).unwrap());

        assert!(!driver.emit(1, Channel::Acceleration, &[0.0, 0.0, 9.8]));

        driver.register(Arc::clone(&collector)).await.unwrap();
        assert!(driver.emit(2, Channel::Acceleration, &[0.0, 0.0, 9.8]));
        assert_eq!(collector.len(Channel::Acceleration), 1);

        driver.unregister();
        driver.unregister();
        assert!(!driver.emit(3, Channel::Acceleration, &[0.0, 0.0, 9.8]));
        assert_eq!(driver.registrations(), 1);
    }

    #[tokio::test]
    async fn test_scripted_registration_failure() {
        let driver = MockSensorDriver::new(ChannelAvailability::all());
        driver.set_fail_registration(true);
        let collector = Arc::new(ChannelCollector::new(8, ChannelAvailability::all()).unwrap());

        let err = driver.register(collector).await.unwrap_err();
        assert!(matches!(err, StrokeError::SensorRegistration { .. }));
        assert!(!driver.is_registered());
    }
}
