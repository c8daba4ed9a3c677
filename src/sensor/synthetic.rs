use super::SensorDriver;
use crate::rng::SeededRng;
use crate::collector::{ChannelAvailability, ChannelCollector};
use crate::error::{Result, StrokeError};
use crate::sample::Channel;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::f32::consts::TAU;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const GRAVITY: f32 = 9.81;
/// Seconds between synthetic swings
const SWING_PERIOD_S: f32 = 2.5;

/// Driver that fabricates wrist motion at the nominal sampling rate.
///
/// Acceleration and angular rate follow a periodic swing with noise; heart
/// rate is reported once per second.
pub struct SyntheticSensorDriver {
    sample_rate_hz: u32,
    rng: Arc<SeededRng>,
    token: Mutex<Option<CancellationToken>>,
}

impl SyntheticSensorDriver {
    pub fn new(sample_rate_hz: u32, seed: Option<u64>) -> Self {
        Self {
            sample_rate_hz,
            rng: Arc::new(SeededRng::new(seed)),
            token: Mutex::new(None),
        }
    }

    pub fn is_registered(&self) -> bool {
        self.token.lock().is_some()
    }
}

#[async_trait]
impl SensorDriver for SyntheticSensorDriver {
    fn available_channels(&self) -> ChannelAvailability {
        ChannelAvailability::all()
    }

    async fn register(&self, collector: Arc<ChannelCollector>) -> Result<()> {
        if self.sample_rate_hz == 0 {
            return Err(StrokeError::registration("sample rate must be positive"));
        }

        let token = CancellationToken::new();
        if let Some(previous) = self.token.lock().replace(token.clone()) {
            previous.cancel();
        }

        let rate = self.sample_rate_hz;
        let rng = Arc::clone(&self.rng);

        info!("Synthetic sensor driver emitting at {} Hz", rate);

        tokio::spawn(async move {
            let origin = Instant::now();
            let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / rate as f64));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut tick: u64 = 0;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {}
                }

                let timestamp = origin.elapsed().as_nanos() as i64;
                let phase = (tick as f32 / rate as f32) / SWING_PERIOD_S * TAU;
                let swing = phase.sin().max(0.0).powi(4) * 25.0;
                let noise = |scale: f32| rng.gen_range(-scale..=scale);

                collector.on_sample(
                    timestamp,
                    Channel::Acceleration,
                    &[swing + noise(0.3), noise(0.3), GRAVITY + noise(0.3)],
                    3,
                );
                collector.on_sample(
                    timestamp,
                    Channel::AngularRate,
                    &[noise(0.05), swing * 0.4 + noise(0.05), noise(0.05)],
                    3,
                );
                if tick % rate as u64 == 0 {
                    collector.on_sample(timestamp, Channel::HeartRate, &[110.0 + noise(5.0)], 2);
                }

                tick += 1;
            }

            debug!("Synthetic sensor task stopped after {} ticks", tick);
        });

        Ok(())
    }

    fn unregister(&self) {
        if let Some(token) = self.token.lock().take() {
            token.cancel();
            debug!("Synthetic sensor driver unregistered");
        }
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

impl Drop for SyntheticSensorDriver {
    fn drop(&mut self) {
        self.unregister();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_emits_at_rate_until_unregistered() {
        let driver = SyntheticSensorDriver::new(50, Some(1));
        let collector = Arc::new(ChannelCollector::new(500, ChannelAvailability::all()).unwrap());

        driver.register(Arc::clone(&collector)).await.unwrap();
        assert!(driver.is_registered());

        tokio::time::sleep(Duration::from_millis(1_010)).await;

        let accel = collector.len(Channel::Acceleration);
        assert!((49..=53).contains(&accel), "acceleration samples = {}", accel);
        assert_eq!(collector.len(Channel::AngularRate), accel);
        assert!(collector.len(Channel::HeartRate) >= 1);

        driver.unregister();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let frozen = collector.len(Channel::Acceleration);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(collector.len(Channel::Acceleration), frozen);
        assert!(!driver.is_registered());
    }

    #[tokio::test]
    async fn test_zero_rate_rejected() {
        let driver = SyntheticSensorDriver::new(0, None);
        let collector = Arc::new(ChannelCollector::new(5, ChannelAvailability::all()).unwrap());
        assert!(driver.register(collector).await.is_err());
    }
}
