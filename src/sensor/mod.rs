//! Raw sample sources.
//!
//! The hardware sensor API is reached through the [`SensorDriver`]
//! capability: it reports which channels exist and, once registered, pushes
//! samples into a [`ChannelCollector`] at its own cadence.

mod mock;
mod synthetic;

pub use mock::MockSensorDriver;
pub use synthetic::SyntheticSensorDriver;

use crate::collector::{ChannelAvailability, ChannelCollector};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait SensorDriver: Send + Sync {
    /// Channels the hardware offers; probed once
    fn available_channels(&self) -> ChannelAvailability;

    /// Start delivering samples to `collector`
    async fn register(&self, collector: Arc<ChannelCollector>) -> Result<()>;

    /// Stop delivering samples. Idempotent and non-blocking.
    fn unregister(&self);

    fn name(&self) -> &str;
}
