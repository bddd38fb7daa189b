//! Configuration types for recording and playback.

use serde::{Deserialize, Serialize};

/// Default compaction threshold on squared velocity difference.
pub const DEFAULT_MINIMUM_DELTA: f64 = 1e-4;

fn default_minimum_delta() -> f64 {
    DEFAULT_MINIMUM_DELTA
}

fn default_speed() -> f64 {
    1.0
}

/// Recorder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Two velocities whose squared difference is at most this value are
    /// treated as equal during compaction. 0 keeps every change of velocity.
    #[serde(default = "default_minimum_delta")]
    pub minimum_delta: f64,
    /// Orientation captures per second for each subject.
    ///
    /// `None` (or a negative rate) captures on every call, `Some(0.0)` never
    /// captures orientation.
    #[serde(default)]
    pub capture_rate: Option<f64>,
    /// Name given to every recording this recorder builds.
    #[serde(default)]
    pub recording_name: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            minimum_delta: DEFAULT_MINIMUM_DELTA,
            capture_rate: None,
            recording_name: String::new(),
        }
    }
}

impl RecorderConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.minimum_delta.is_finite() || self.minimum_delta < 0.0 {
            return Err(ConfigError::InvalidMinimumDelta(self.minimum_delta));
        }
        if let Some(rate) = self.capture_rate {
            if rate.is_nan() {
                return Err(ConfigError::InvalidCaptureRate(rate));
            }
        }
        Ok(())
    }
}

/// Playback configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Playback speed multiplier. Negative plays backwards, 0 freezes.
    #[serde(default = "default_speed")]
    pub speed: f64,
    /// Wrap around at either end instead of pausing.
    #[serde(default)]
    pub looping: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            looping: false,
        }
    }
}

impl PlaybackConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.speed.is_finite() {
            return Err(ConfigError::InvalidSpeed(self.speed));
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Minimum delta must be finite and non-negative, got {0}")]
    InvalidMinimumDelta(f64),
    #[error("Capture rate must be a number, got {0}")]
    InvalidCaptureRate(f64),
    #[error("Playback speed must be finite, got {0}")]
    InvalidSpeed(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs_valid() {
        assert!(RecorderConfig::default().validate().is_ok());
        assert!(PlaybackConfig::default().validate().is_ok());
    }

    #[test]
    fn test_negative_minimum_delta_rejected() {
        let config = RecorderConfig {
            minimum_delta: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMinimumDelta(_))
        ));
    }

    #[test]
    fn test_infinite_speed_rejected() {
        let config = PlaybackConfig {
            speed: f64::INFINITY,
            looping: true,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: RecorderConfig = serde_json::from_str(r#"{ "capture_rate": 30.0 }"#).unwrap();
        assert_eq!(config.minimum_delta, DEFAULT_MINIMUM_DELTA);
        assert_eq!(config.capture_rate, Some(30.0));

        let playback: PlaybackConfig = serde_json::from_str(r#"{ "looping": true }"#).unwrap();
        assert_eq!(playback.speed, 1.0);
        assert!(playback.looping);
    }

    #[test]
    fn test_serialization() {
        let config = RecorderConfig {
            recording_name: "arena".into(),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: RecorderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
