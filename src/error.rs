use crate::sample::Channel;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrokeError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("missing capabilities: {}", format_channels(.missing))]
    CapabilityUnavailable { missing: Vec<Channel> },

    #[error("classification fault: {message}")]
    ClassificationFault { message: String },

    #[error("invalid configuration: {message}")]
    ConfigurationInvalid { message: String },

    #[error("sensor registration failed: {message}")]
    SensorRegistration { message: String },
}

impl StrokeError {
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::ConfigurationInvalid {
            message: message.into(),
        }
    }

    pub fn classification<S: Into<String>>(message: S) -> Self {
        Self::ClassificationFault {
            message: message.into(),
        }
    }

    pub fn registration<S: Into<String>>(message: S) -> Self {
        Self::SensorRegistration {
            message: message.into(),
        }
    }
}

fn format_channels(channels: &[Channel]) -> String {
    channels
        .iter()
        .map(|c| c.label())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, StrokeError>;
