use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of stroke a classifier can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrokeKind {
    Serve,
    Forehand,
    Backhand,
    Volley,
    Smash,
    Unknown,
}

impl StrokeKind {
    /// Concrete strokes, excluding `Unknown`
    pub const DETECTABLE: [StrokeKind; 5] = [
        StrokeKind::Serve,
        StrokeKind::Forehand,
        StrokeKind::Backhand,
        StrokeKind::Volley,
        StrokeKind::Smash,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StrokeKind::Serve => "serve",
            StrokeKind::Forehand => "forehand",
            StrokeKind::Backhand => "backhand",
            StrokeKind::Volley => "volley",
            StrokeKind::Smash => "smash",
            StrokeKind::Unknown => "unknown",
        }
    }
}

/// Player a stroke is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Actor {
    A,
    B,
}

impl Actor {
    pub const ALL: [Actor; 2] = [Actor::A, Actor::B];
}

/// A classified stroke
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeEvent {
    /// Timestamp in the sample clock (nanoseconds)
    pub timestamp: i64,
    pub kind: StrokeKind,
    /// Confidence in [0, 1]
    pub confidence: f32,
    pub actor: Actor,
}

impl StrokeEvent {
    pub fn new(timestamp: i64, kind: StrokeKind, confidence: f32, actor: Actor) -> Self {
        Self {
            timestamp,
            kind,
            confidence: confidence.clamp(0.0, 1.0),
            actor,
        }
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        format!(
            "{} by player {:?} ({:.0}% confidence)",
            self.kind.label(),
            self.actor,
            self.confidence * 100.0
        )
    }
}

/// Lifecycle state published by the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Running,
    Error(String),
}

impl PipelineState {
    pub fn is_running(&self) -> bool {
        matches!(self, PipelineState::Running)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, PipelineState::Error(_))
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "idle"),
            PipelineState::Running => write!(f, "running"),
            PipelineState::Error(message) => write!(f, "error: {}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_is_clamped() {
        let event = StrokeEvent::new(0, StrokeKind::Smash, 1.7, Actor::B);
        assert_eq!(event.confidence, 1.0);

        let event = StrokeEvent::new(0, StrokeKind::Smash, -0.2, Actor::B);
        assert_eq!(event.confidence, 0.0);
    }

    #[test]
    fn test_description() {
        let event = StrokeEvent::new(5, StrokeKind::Forehand, 0.95, Actor::A);
        assert_eq!(event.description(), "forehand by player A (95% confidence)");
    }

    #[test]
    fn test_state_display() {
        assert_eq!(PipelineState::Idle.to_string(), "idle");
        assert_eq!(
            PipelineState::Error("boom".to_string()).to_string(),
            "error: boom"
        );
        assert!(PipelineState::default() == PipelineState::Idle);
    }

    #[test]
    fn test_event_serializes_to_json() {
        let event = StrokeEvent::new(42, StrokeKind::Volley, 0.5, Actor::B);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"kind\":\"Volley\""));
        assert!(json.contains("\"actor\":\"B\""));
    }
}
