use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// The two independent sensor streams the supervisor listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorStream {
    Battery,
    Proximity,
}

impl fmt::Display for SensorStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorStream::Battery => write!(f, "battery"),
            SensorStream::Proximity => write!(f, "proximity"),
        }
    }
}

/// Battery charge reading, in percent (0–100 expected, not enforced).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryLevel {
    pub percent: f32,
    pub timestamp: DateTime<Utc>,
}

impl BatteryLevel {
    /// Battery reading stamped with the current wall-clock time.
    pub fn now(percent: f32) -> Self {
        Self {
            percent,
            timestamp: Utc::now(),
        }
    }
}

/// One ranging sweep (e.g. a LiDAR scan), ordered by beam index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityScan {
    pub ranges: Vec<f32>,
    pub timestamp: DateTime<Utc>,
}

impl ProximityScan {
    /// Scan stamped with the current wall-clock time.
    pub fn now(ranges: Vec<f32>) -> Self {
        Self {
            ranges,
            timestamp: Utc::now(),
        }
    }
}

/// A single message from either sensor stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stream", content = "sample", rename_all = "snake_case")]
pub enum SensorSample {
    Battery(BatteryLevel),
    Proximity(ProximityScan),
}

impl SensorSample {
    /// Which stream this sample belongs to.
    pub fn stream(&self) -> SensorStream {
        match self {
            SensorSample::Battery(_) => SensorStream::Battery,
            SensorSample::Proximity(_) => SensorStream::Proximity,
        }
    }
}

/// Instantaneous safety verdict derived from the latest samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardClassification {
    Normal,
    LowBattery,
    Collision,
}

impl fmt::Display for HazardClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HazardClassification::Normal => write!(f, "normal"),
            HazardClassification::LowBattery => write!(f, "low_battery"),
            HazardClassification::Collision => write!(f, "collision"),
        }
    }
}

/// States of the safety supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisorState {
    /// Waiting for the activation signal. No commands are emitted.
    #[default]
    Idle,
    /// Watching both streams; the base is held still.
    Monitoring,
    /// One-shot recovery rotation after a low-battery verdict.
    Rotating,
    /// Terminal. Entered on shutdown; only stop commands are emitted.
    Stopped,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorState::Idle => write!(f, "IDLE"),
            SupervisorState::Monitoring => write!(f, "MONITOR_BATTERY_COLLISION"),
            SupervisorState::Rotating => write!(f, "ROTATE_BASE"),
            SupervisorState::Stopped => write!(f, "STOPPED"),
        }
    }
}

/// Differential-drive velocity command for the mobile base.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub linear_velocity: f32,
    pub angular_velocity: f32,
}

impl Command {
    /// Zero velocity on both axes.
    pub fn stop() -> Self {
        Self {
            linear_velocity: 0.0,
            angular_velocity: 0.0,
        }
    }

    /// Rotate in place at `angular_velocity` rad/s.
    pub fn rotate(angular_velocity: f32) -> Self {
        Self {
            linear_velocity: 0.0,
            angular_velocity,
        }
    }

    pub fn is_stop(&self) -> bool {
        self.linear_velocity == 0.0 && self.angular_velocity == 0.0
    }
}

/// Hazard thresholds and actuation constants.
///
/// Every field has a default so a partial TOML table is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Battery percentage strictly below which the base is low on charge.
    #[serde(default = "default_battery_threshold")]
    pub battery_threshold: f32,
    /// Range (scan units) strictly below which an obstacle is a collision.
    #[serde(default = "default_collision_threshold")]
    pub collision_threshold: f32,
    /// Angular velocity used for the low-battery recovery rotation.
    #[serde(default = "default_rotation_angular_velocity")]
    pub rotation_angular_velocity: f32,
}

fn default_battery_threshold() -> f32 {
    30.0
}
fn default_collision_threshold() -> f32 {
    0.2
}
fn default_rotation_angular_velocity() -> f32 {
    0.5
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            battery_threshold: default_battery_threshold(),
            collision_threshold: default_collision_threshold(),
            rotation_angular_velocity: default_rotation_angular_velocity(),
        }
    }
}

/// Entry in the read-only transition log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g., "safeguard-runtime::supervisor"
    pub source: String,
    pub kind: DiagnosticKind,
}

impl DiagnosticEvent {
    pub fn new(source: impl Into<String>, kind: DiagnosticKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            kind,
        }
    }
}

/// What happened, as observed by the transition log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    Classified {
        classification: HazardClassification,
    },
    Transition {
        from: SupervisorState,
        to: SupervisorState,
    },
    CommandIssued(Command),
    CommandDropped {
        command: Command,
        reason: String,
    },
    SampleRejected {
        stream: SensorStream,
        reason: String,
    },
}

/// Error type shared by every SafeGuard crate.
///
/// None of these is fatal to the supervisory loop.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SafetyError {
    #[error("Malformed {stream} sample: {reason}")]
    MalformedSample {
        stream: SensorStream,
        reason: String,
    },

    #[error("Command sink unavailable: {0}")]
    CommandSinkUnavailable(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_sample_reports_its_stream() {
        assert_eq!(
            SensorSample::Battery(BatteryLevel::now(50.0)).stream(),
            SensorStream::Battery
        );
        assert_eq!(
            SensorSample::Proximity(ProximityScan::now(vec![1.0])).stream(),
            SensorStream::Proximity
        );
    }

    #[test]
    fn sensor_sample_json_is_tagged_by_stream() {
        let sample = SensorSample::Battery(BatteryLevel::now(42.5));
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["stream"], "battery");
        assert!((json["sample"]["percent"].as_f64().unwrap() - 42.5).abs() < 1e-6);
    }

    #[test]
    fn command_constructors() {
        let stop = Command::stop();
        assert!(stop.is_stop());

        let rotate = Command::rotate(0.5);
        assert!(!rotate.is_stop());
        assert!((rotate.linear_velocity - 0.0).abs() < f32::EPSILON);
        assert!((rotate.angular_velocity - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn safety_config_defaults() {
        let cfg = SafetyConfig::default();
        assert!((cfg.battery_threshold - 30.0).abs() < f32::EPSILON);
        assert!((cfg.collision_threshold - 0.2).abs() < f32::EPSILON);
        assert!((cfg.rotation_angular_velocity - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn safety_config_partial_json_uses_defaults() {
        let cfg: SafetyConfig = serde_json::from_str(r#"{"battery_threshold": 15.0}"#).unwrap();
        assert!((cfg.battery_threshold - 15.0).abs() < f32::EPSILON);
        assert!((cfg.collision_threshold - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn supervisor_state_defaults_to_idle() {
        assert_eq!(SupervisorState::default(), SupervisorState::Idle);
    }

    #[test]
    fn diagnostic_event_roundtrip() {
        let event = DiagnosticEvent::new(
            "safeguard-runtime::supervisor",
            DiagnosticKind::Transition {
                from: SupervisorState::Monitoring,
                to: SupervisorState::Rotating,
            },
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: DiagnosticEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event.id, back.id);
        assert_eq!(event.kind, back.kind);
    }

    #[test]
    fn safety_error_display() {
        let err = SafetyError::MalformedSample {
            stream: SensorStream::Battery,
            reason: "negative percent -5".to_string(),
        };
        assert!(err.to_string().contains("battery"));
        assert!(err.to_string().contains("-5"));

        let err2 = SafetyError::CommandSinkUnavailable("cmd_vel closed".to_string());
        assert!(err2.to_string().contains("cmd_vel closed"));
    }
}
