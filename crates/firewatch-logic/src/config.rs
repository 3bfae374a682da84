//! Tick configuration and its validation.
//!
//! Two clocks are in play: the simulated seconds each tick covers
//! (`step_duration`) and the real-time cadence the host ticks at
//! (`update_interval_ms`, shortened by `speed_multiplier`). Changing the
//! speed never changes how much simulated time a tick represents.
//!
//! ```
//! use firewatch_logic::config::{validate_config, SimulationConfig};
//!
//! let config = SimulationConfig::default();
//! assert!(validate_config(&config).is_empty());
//! assert_eq!(config.effective_interval_ms(), 2000);
//! ```

use serde::{Deserialize, Serialize};

/// The host never ticks faster than this, whatever the speed multiplier.
pub const MIN_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulated seconds per tick.
    pub step_duration: f32,
    /// Planned run length in simulated seconds.
    pub total_simulation_time: f32,
    /// Real-time milliseconds between ticks at 1× speed.
    pub update_interval_ms: u64,
    /// Real-time speed-up (2.0 ticks twice as often).
    pub speed_multiplier: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            step_duration: 30.0,
            total_simulation_time: 120.0,
            update_interval_ms: 2000,
            speed_multiplier: 1.0,
        }
    }
}

impl SimulationConfig {
    /// Real-time milliseconds the host should wait between ticks.
    pub fn effective_interval_ms(&self) -> u64 {
        let scaled = self.update_interval_ms as f64 / self.speed_multiplier.max(f32::EPSILON) as f64;
        (scaled.round() as u64).max(MIN_INTERVAL_MS)
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("step duration must be a positive number of seconds, got {0}")]
    NonPositiveStepDuration(f32),
    #[error("total simulation time must be a positive number of seconds, got {0}")]
    NonPositiveTotalTime(f32),
    #[error("update interval must be at least 1 ms")]
    ZeroUpdateInterval,
    #[error("speed multiplier must be positive, got {0}")]
    NonPositiveSpeed(f32),
}

/// Validate a configuration, returning all errors found.
pub fn validate_config(config: &SimulationConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if !(config.step_duration.is_finite() && config.step_duration > 0.0) {
        errors.push(ConfigError::NonPositiveStepDuration(config.step_duration));
    }
    if !(config.total_simulation_time.is_finite() && config.total_simulation_time > 0.0) {
        errors.push(ConfigError::NonPositiveTotalTime(config.total_simulation_time));
    }
    if config.update_interval_ms == 0 {
        errors.push(ConfigError::ZeroUpdateInterval);
    }
    if !(config.speed_multiplier.is_finite() && config.speed_multiplier > 0.0) {
        errors.push(ConfigError::NonPositiveSpeed(config.speed_multiplier));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&SimulationConfig::default()).is_empty());
    }

    #[test]
    fn test_non_positive_step_rejected() {
        let config = SimulationConfig {
            step_duration: 0.0,
            ..Default::default()
        };
        assert_eq!(
            validate_config(&config),
            vec![ConfigError::NonPositiveStepDuration(0.0)]
        );
    }

    #[test]
    fn test_nan_rejected() {
        let config = SimulationConfig {
            total_simulation_time: f32::NAN,
            ..Default::default()
        };
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ConfigError::NonPositiveTotalTime(_)));
    }

    #[test]
    fn test_all_errors_collected() {
        let config = SimulationConfig {
            step_duration: -1.0,
            total_simulation_time: 0.0,
            update_interval_ms: 0,
            speed_multiplier: 0.0,
        };
        assert_eq!(validate_config(&config).len(), 4);
    }

    #[test]
    fn test_speed_shortens_interval() {
        let fast = SimulationConfig {
            speed_multiplier: 2.0,
            ..Default::default()
        };
        assert_eq!(fast.effective_interval_ms(), 1000);
        assert_eq!(fast.step_duration, 30.0);
    }

    #[test]
    fn test_interval_floor() {
        let frantic = SimulationConfig {
            update_interval_ms: 500,
            speed_multiplier: 10.0,
            ..Default::default()
        };
        assert_eq!(frantic.effective_interval_ms(), MIN_INTERVAL_MS);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SimulationConfig = serde_json::from_str(r#"{"step_duration": 10}"#).unwrap();
        assert_eq!(config.step_duration, 10.0);
        assert_eq!(config.total_simulation_time, 120.0);
    }
}
