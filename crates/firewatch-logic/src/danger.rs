//! Danger scoring: a bounded 0–100 summary of a node's hazard level.
//!
//! The score is an additive sum of independent contributions (fire, smoke,
//! heat, oxygen deficit, visibility loss, toxic gas, crowding, blocked
//! access, dark emergency lighting), each clamped before summation, with
//! the total clamped to 100. Both the propagation engine (evacuation rate)
//! and route evaluation read it.

use crate::sensor::SensorState;

/// Scoring constants.
pub mod danger_constants {
    pub const MAX_SCORE: f32 = 100.0;
    /// A node scoring at or above this blocks a route.
    pub const PASSABLE_THRESHOLD: f32 = 70.0;

    pub const FIRE_PENALTY: f32 = 40.0;
    pub const SMOKE_WEIGHT: f32 = 20.0;

    pub const HEAT_ONSET: f32 = 60.0;
    pub const HEAT_DIVISOR: f32 = 2.0;
    pub const HEAT_CAP: f32 = 20.0;

    pub const SAFE_OXYGEN: f32 = 19.5;
    pub const OXYGEN_WEIGHT: f32 = 5.0;

    pub const VISIBILITY_WEIGHT: f32 = 0.1;

    pub const CO_ONSET: f32 = 50.0;
    pub const CO_DIVISOR: f32 = 5.0;
    pub const CO_CAP: f32 = 30.0;

    pub const CROWDING_ONSET: f32 = 0.8;
    pub const CROWDING_WEIGHT: f32 = 75.0;

    pub const INACCESSIBLE_PENALTY: f32 = 20.0;
    pub const DARK_PENALTY: f32 = 5.0;
}

/// Coarse hazard band for display, counted per floor in [`crate::stats::FloorStatistics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DangerLevel {
    /// Below 20.
    Safe,
    /// 20 to 40.
    Moderate,
    /// 40 to 60.
    High,
    /// 60 and above.
    Critical,
}

impl DangerLevel {
    pub fn from_score(score: f32) -> Self {
        if score < 20.0 {
            DangerLevel::Safe
        } else if score < 40.0 {
            DangerLevel::Moderate
        } else if score < 60.0 {
            DangerLevel::High
        } else {
            DangerLevel::Critical
        }
    }
}

/// Score a sensor snapshot. Pure; always in `[0, 100]`.
pub fn danger_score(sensor: &SensorState) -> f32 {
    use danger_constants::*;

    let mut score = 0.0;

    if sensor.fire_detected {
        score += FIRE_PENALTY;
    }

    score += sensor.smoke_level.clamp(0.0, 1.0) * SMOKE_WEIGHT;

    if sensor.temperature > HEAT_ONSET {
        score += ((sensor.temperature - HEAT_ONSET) / HEAT_DIVISOR).min(HEAT_CAP);
    }

    if sensor.oxygen_level < SAFE_OXYGEN {
        score += (SAFE_OXYGEN - sensor.oxygen_level.max(0.0)) * OXYGEN_WEIGHT;
    }

    score += (100.0 - sensor.visibility.clamp(0.0, 100.0)) * VISIBILITY_WEIGHT;

    if sensor.carbon_monoxide > CO_ONSET {
        score += (sensor.carbon_monoxide / CO_DIVISOR).min(CO_CAP);
    }

    if sensor.occupancy_density > CROWDING_ONSET {
        score += (sensor.occupancy_density.min(1.0) - CROWDING_ONSET) * CROWDING_WEIGHT;
    }

    if !sensor.exit_accessible {
        score += INACCESSIBLE_PENALTY;
    }
    if !sensor.emergency_lighting {
        score += DARK_PENALTY;
    }

    if score.is_nan() {
        return MAX_SCORE;
    }
    score.clamp(0.0, MAX_SCORE)
}

/// Whether a node is safe enough to pass through.
pub fn is_passable_score(score: f32) -> bool {
    score < danger_constants::PASSABLE_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benign_scores_zero() {
        assert_eq!(danger_score(&SensorState::default()), 0.0);
    }

    #[test]
    fn test_fire_alone() {
        let s = SensorState {
            fire_detected: true,
            ..Default::default()
        };
        assert_eq!(danger_score(&s), 40.0);
    }

    #[test]
    fn test_heat_term_caps_at_twenty() {
        let warm = SensorState {
            temperature: 80.0,
            ..Default::default()
        };
        assert_eq!(danger_score(&warm), 10.0);
        let hot = SensorState {
            temperature: 300.0,
            ..Default::default()
        };
        assert_eq!(danger_score(&hot), 20.0);
    }

    #[test]
    fn test_oxygen_deficit() {
        let s = SensorState {
            oxygen_level: 17.5,
            ..Default::default()
        };
        assert!((danger_score(&s) - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_co_below_onset_ignored() {
        let s = SensorState {
            carbon_monoxide: 50.0,
            ..Default::default()
        };
        assert_eq!(danger_score(&s), 0.0);
        let s = SensorState {
            carbon_monoxide: 100.0,
            ..Default::default()
        };
        assert_eq!(danger_score(&s), 20.0);
    }

    #[test]
    fn test_crowding() {
        let s = SensorState {
            occupancy_density: 1.0,
            ..Default::default()
        };
        assert!((danger_score(&s) - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_access_and_lighting_penalties() {
        let s = SensorState {
            exit_accessible: false,
            emergency_lighting: false,
            ..Default::default()
        };
        assert_eq!(danger_score(&s), 25.0);
    }

    #[test]
    fn test_adversarial_extremes_capped() {
        let s = SensorState {
            fire_detected: true,
            smoke_level: 1.0,
            temperature: 300.0,
            oxygen_level: 8.0,
            visibility: 0.0,
            carbon_monoxide: 500.0,
            occupancy_density: 1.0,
            exit_accessible: false,
            emergency_lighting: false,
            ..Default::default()
        };
        assert_eq!(danger_score(&s), 100.0);
    }

    #[test]
    fn test_burning_corridor_is_impassable() {
        // fire 40 + smoke 15 + heat 20 = 75
        let s = SensorState {
            fire_detected: true,
            smoke_level: 0.75,
            temperature: 200.0,
            ..Default::default()
        };
        let score = danger_score(&s);
        assert!((score - 75.0).abs() < 1e-4);
        assert!(!is_passable_score(score));
    }

    #[test]
    fn test_passable_threshold_is_strict() {
        assert!(is_passable_score(69.99));
        assert!(!is_passable_score(70.0));
    }

    #[test]
    fn test_danger_levels() {
        assert_eq!(DangerLevel::from_score(0.0), DangerLevel::Safe);
        assert_eq!(DangerLevel::from_score(20.0), DangerLevel::Moderate);
        assert_eq!(DangerLevel::from_score(45.0), DangerLevel::High);
        assert_eq!(DangerLevel::from_score(60.0), DangerLevel::Critical);
    }
}
