// config.rs - Simulation tuning
//
// Distances are CSS pixels, speeds CSS px/s. Scene::layout multiplies them by
// the device pixel ratio so the demo looks the same on every display.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::scene::TrainId;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Cruising speed
    pub speed: f32,
    /// Used both for braking and for resuming
    pub acceleration: f32,
}

impl TrainConfig {
    pub const fn new(speed: f32, acceleration: f32) -> Self {
        Self { speed, acceleration }
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self::new(180.0, 220.0)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Train A, left to right
    pub horizontal: TrainConfig,
    /// Train B, bottom to top
    pub vertical: TrainConfig,

    pub train_length: f32,
    pub train_width: f32,

    /// Gap between the intersection square and the entry/exit boundaries
    pub clearance: f32,
    /// How far before the entry boundary a yielding train stops
    pub stop_margin: f32,
    /// Gap between the intersection square and a train's rear at spawn
    pub approach_margin: f32,
    /// How far past the canvas edge a train's rear travels before wrapping
    pub wrap_margin: f32,

    /// Seconds; entry times closer than this are a conflict
    pub safe_window: f32,
    /// Seconds; larger frame gaps are clamped to this
    pub max_dt: f32,
    /// Fraction of `acceleration` used when speeding back up
    pub resume_factor: f32,

    pub yielding: TrainId,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            horizontal: TrainConfig::new(180.0, 220.0),
            vertical: TrainConfig::new(170.0, 220.0),
            train_length: 60.0,
            train_width: 18.0,
            clearance: 6.0,
            stop_margin: 10.0,
            approach_margin: 50.0,
            wrap_margin: 40.0,
            safe_window: 3.0,
            max_dt: 0.05,
            resume_factor: 0.6,
            yielding: TrainId::B,
        }
    }
}

impl SimConfig {
    /// Parse a (possibly partial) JSON object; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("horizontal.speed", self.horizontal.speed),
            ("vertical.speed", self.vertical.speed),
            ("train_length", self.train_length),
            ("train_width", self.train_width),
            ("clearance", self.clearance),
            ("stop_margin", self.stop_margin),
            ("approach_margin", self.approach_margin),
            ("wrap_margin", self.wrap_margin),
            ("safe_window", self.safe_window),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        // A zero here would leave a braking train stuck short of its stop line
        let positive = [
            ("horizontal.acceleration", self.horizontal.acceleration),
            ("vertical.acceleration", self.vertical.acceleration),
            ("max_dt", self.max_dt),
            ("resume_factor", self.resume_factor),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_are_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SimConfig::from_json(r#"{ "safe_window": 4.5, "vertical": { "speed": 120 } }"#)
            .unwrap();

        assert_relative_eq!(config.safe_window, 4.5);
        assert_relative_eq!(config.vertical.speed, 120.0);
        // Nested defaults come from TrainConfig::default, not the vertical preset
        assert_relative_eq!(config.vertical.acceleration, 220.0);
        assert_relative_eq!(config.horizontal.speed, 180.0);
        assert_eq!(config.yielding, TrainId::B);
    }

    #[test]
    fn yielding_train_is_selectable() {
        let config = SimConfig::from_json(r#"{ "yielding": "A" }"#).unwrap();
        assert_eq!(config.yielding, TrainId::A);
    }

    #[test]
    fn unknown_train_is_a_parse_error() {
        let err = SimConfig::from_json(r#"{ "yielding": "C" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn negative_distance_rejected() {
        let err = SimConfig::from_json(r#"{ "stop_margin": -1 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Negative { field: "stop_margin", .. }));
    }

    #[test]
    fn zero_acceleration_rejected() {
        let mut config = SimConfig::default();
        config.vertical.acceleration = 0.0;

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NotPositive { field: "vertical.acceleration", .. }
        ));
    }

    #[test]
    fn nan_rejected() {
        let config = SimConfig {
            safe_window: f32::NAN,
            ..SimConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
