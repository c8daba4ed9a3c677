pub mod classifier;
pub mod collector;
pub mod config;
pub mod error;
pub mod events;
pub mod keyboard_input;
pub mod pipeline;
pub mod ring_buffer;
pub mod rng;
pub mod sample;
pub mod scheduler;
pub mod sensor;
pub mod signal;
pub mod window;

pub use classifier::{create_classifier, Classifier, ClassifierKind, MockClassifier, ModelClassifier};
pub use collector::{ChannelAvailability, ChannelCollector};
pub use config::StrokeSenseConfig;
pub use error::{Result, StrokeError};
pub use events::{Actor, PipelineState, StrokeEvent, StrokeKind};
pub use pipeline::PipelineOrchestrator;
pub use ring_buffer::{RingBuffer, RingBufferBuilder};
pub use rng::SeededRng;
pub use sample::{Channel, Sample};
pub use scheduler::{WindowScheduler, WindowSink};
pub use sensor::{MockSensorDriver, SensorDriver, SyntheticSensorDriver};
pub use signal::{Signal, SignalReceiver};
pub use window::SensorWindow;
