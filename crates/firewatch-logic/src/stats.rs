//! Floor-wide summary figures for status displays.

use serde::Serialize;

use crate::danger::{danger_constants::PASSABLE_THRESHOLD, danger_score, DangerLevel};
use crate::risk::Route;
use crate::sensor::SensorMap;

/// CO concentration above which a node counts as a high-CO area (ppm).
pub const HIGH_CO_PPM: f32 = 50.0;

/// Node counts per [`DangerLevel`] band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelCounts {
    pub safe: usize,
    pub moderate: usize,
    pub high: usize,
    pub critical: usize,
}

impl LevelCounts {
    fn record(&mut self, level: DangerLevel) {
        match level {
            DangerLevel::Safe => self.safe += 1,
            DangerLevel::Moderate => self.moderate += 1,
            DangerLevel::High => self.high += 1,
            DangerLevel::Critical => self.critical += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloorStatistics {
    pub total_nodes: usize,
    pub nodes_on_fire: usize,
    /// Nodes that are inaccessible or too dangerous to pass.
    pub blocked_nodes: usize,
    pub avg_danger: f32,
    pub danger_levels: LevelCounts,
    /// Sum of occupancy densities across the floor.
    pub total_occupancy: f32,
    pub high_co_nodes: usize,
    pub passable_routes: usize,
    pub total_routes: usize,
}

impl FloorStatistics {
    pub fn collect(sensors: &SensorMap, routes: &[Route]) -> Self {
        let mut stats = Self {
            total_nodes: sensors.len(),
            nodes_on_fire: 0,
            blocked_nodes: 0,
            avg_danger: 0.0,
            danger_levels: LevelCounts::default(),
            total_occupancy: 0.0,
            high_co_nodes: 0,
            passable_routes: routes.iter().filter(|r| r.risk.passable).count(),
            total_routes: routes.len(),
        };

        let mut danger_sum = 0.0;
        for s in sensors.iter() {
            let danger = danger_score(s);
            danger_sum += danger;
            stats.danger_levels.record(DangerLevel::from_score(danger));
            if s.fire_detected {
                stats.nodes_on_fire += 1;
            }
            if !s.exit_accessible || danger > PASSABLE_THRESHOLD {
                stats.blocked_nodes += 1;
            }
            if s.carbon_monoxide > HIGH_CO_PPM {
                stats.high_co_nodes += 1;
            }
            stats.total_occupancy += s.occupancy_density;
        }
        if !sensors.is_empty() {
            stats.avg_danger = danger_sum / sensors.len() as f32;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::SensorState;

    #[test]
    fn test_collect() {
        let sensors = SensorMap::from_states(vec![
            SensorState {
                fire_detected: true,
                smoke_level: 1.0,
                temperature: 300.0,
                carbon_monoxide: 200.0,
                occupancy_density: 0.2,
                ..Default::default()
            },
            SensorState {
                exit_accessible: false,
                occupancy_density: 0.3,
                ..Default::default()
            },
            SensorState::default(),
        ]);
        let stats = FloorStatistics::collect(&sensors, &[]);
        assert_eq!(stats.total_nodes, 3);
        assert_eq!(stats.nodes_on_fire, 1);
        assert_eq!(stats.blocked_nodes, 2);
        assert_eq!(stats.high_co_nodes, 1);
        assert!((stats.total_occupancy - 0.5).abs() < 1e-6);
        assert_eq!(stats.total_routes, 0);
        assert_eq!(
            stats.danger_levels,
            LevelCounts {
                safe: 1,
                moderate: 1,
                high: 0,
                critical: 1,
            }
        );
        // (100 + 20 + 0) / 3
        assert!((stats.avg_danger - 40.0).abs() < 1e-4);
    }

    #[test]
    fn test_empty_floor() {
        let stats = FloorStatistics::collect(&SensorMap::from_states(vec![]), &[]);
        assert_eq!(stats.avg_danger, 0.0);
        assert_eq!(stats.total_nodes, 0);
    }
}
