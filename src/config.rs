use crate::classifier::ClassifierKind;
use crate::error::{Result, StrokeError};
use crate::sample::Channel;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StrokeSenseConfig {
    pub sampling: SamplingConfig,
    pub window: WindowConfig,
    pub classifier: ClassifierConfig,
    pub sensor: SensorConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SamplingConfig {
    /// Seconds of history each channel buffer keeps
    #[serde(default = "default_buffer_seconds")]
    pub buffer_seconds: u32,

    /// Nominal sampling rate of the motion sensors
    #[serde(default = "default_sample_rate_hz")]
    pub sample_rate_hz: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WindowConfig {
    /// Interval between window snapshots in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Which classifier implementation to build
    #[serde(default)]
    pub variant: ClassifierKind,

    /// Per-window detection probability for the mock classifier
    #[serde(default = "default_detection_probability")]
    pub detection_probability: f64,

    /// Seed for the mock classifier; OS entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,

    /// Confidence attached to events injected through `simulate`
    #[serde(default = "default_simulated_confidence")]
    pub simulated_confidence: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorDriverKind {
    /// Generated motion, for running without hardware
    #[default]
    Synthetic,
    /// No sensors at all
    None,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SensorConfig {
    /// Sample source used by the binary
    #[serde(default)]
    pub driver: SensorDriverKind,

    /// Whether heart rate is a required capability
    #[serde(default)]
    pub require_heart_rate: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SystemConfig {
    /// Run without required hardware and allow simulated events
    #[serde(default)]
    pub test_mode: bool,

    /// Lines kept in the diagnostic log
    #[serde(default = "default_diagnostic_lines")]
    pub diagnostic_lines: usize,
}

impl StrokeSenseConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self> {
        Self::load_from_file("strokesense.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("sampling.buffer_seconds", default_buffer_seconds())?
            .set_default("sampling.sample_rate_hz", default_sample_rate_hz())?
            .set_default("window.interval_ms", default_interval_ms())?
            .set_default("classifier.variant", "Mock")?
            .set_default(
                "classifier.detection_probability",
                default_detection_probability(),
            )?
            .set_default(
                "classifier.simulated_confidence",
                default_simulated_confidence() as f64,
            )?
            .set_default("sensor.driver", "Synthetic")?
            .set_default("sensor.require_heart_rate", false)?
            .set_default("system.test_mode", false)?
            .set_default("system.diagnostic_lines", default_diagnostic_lines() as i64)?
            .add_source(File::with_name(&path_str).required(false))
            // STROKESENSE_WINDOW__INTERVAL_MS=200 overrides window.interval_ms
            .add_source(
                Environment::with_prefix("STROKESENSE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: StrokeSenseConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.sampling.buffer_seconds == 0 {
            return Err(StrokeError::invalid_config(
                "Sampling buffer_seconds must be greater than 0",
            ));
        }

        if self.sampling.sample_rate_hz == 0 {
            return Err(StrokeError::invalid_config(
                "Sampling sample_rate_hz must be greater than 0",
            ));
        }

        if self.window.interval_ms == 0 {
            return Err(StrokeError::invalid_config(
                "Window interval_ms must be greater than 0",
            ));
        }

        let p = self.classifier.detection_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(StrokeError::invalid_config(format!(
                "Classifier detection_probability must be within [0, 1], got {}",
                p
            )));
        }

        let c = self.classifier.simulated_confidence;
        if !(0.0..=1.0).contains(&c) {
            return Err(StrokeError::invalid_config(format!(
                "Classifier simulated_confidence must be within [0, 1], got {}",
                c
            )));
        }

        if self.system.diagnostic_lines == 0 {
            return Err(StrokeError::invalid_config(
                "System diagnostic_lines must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Samples each channel buffer holds
    pub fn buffer_capacity(&self) -> usize {
        self.sampling.buffer_seconds as usize * self.sampling.sample_rate_hz as usize
    }

    pub fn window_interval(&self) -> Duration {
        Duration::from_millis(self.window.interval_ms)
    }

    /// Channels that must be present unless running in test mode
    pub fn required_channels(&self) -> Vec<Channel> {
        let mut required = vec![Channel::Acceleration, Channel::AngularRate];
        if self.sensor.require_heart_rate {
            required.push(Channel::HeartRate);
        }
        required
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl Default for StrokeSenseConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig {
                buffer_seconds: default_buffer_seconds(),
                sample_rate_hz: default_sample_rate_hz(),
            },
            window: WindowConfig {
                interval_ms: default_interval_ms(),
            },
            classifier: ClassifierConfig {
                variant: ClassifierKind::default(),
                detection_probability: default_detection_probability(),
                seed: None,
                simulated_confidence: default_simulated_confidence(),
            },
            sensor: SensorConfig {
                driver: SensorDriverKind::default(),
                require_heart_rate: false,
            },
            system: SystemConfig {
                test_mode: false,
                diagnostic_lines: default_diagnostic_lines(),
            },
        }
    }
}

// Default value functions
fn default_buffer_seconds() -> u32 {
    10
}
fn default_sample_rate_hz() -> u32 {
    50
}

fn default_interval_ms() -> u64 {
    300
}

fn default_detection_probability() -> f64 {
    0.2
}
fn default_simulated_confidence() -> f32 {
    0.95
}

fn default_diagnostic_lines() -> usize {
    50
}
