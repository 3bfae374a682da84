//! Simulation clock and coarse history sampling.
//!
//! The clock counts ticks and simulated seconds. `total_simulation_time` is
//! a soft cap: it scales fire intensity and tells the host when the planned
//! run is over, but ticking never stops on its own.

use std::collections::VecDeque;

use serde::Serialize;

use crate::danger::danger_score;
use crate::sensor::SensorMap;

/// Simulated seconds between history samples.
pub const HISTORY_INTERVAL: f32 = 10.0;
/// Number of samples the history keeps.
pub const HISTORY_CAPACITY: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationClock {
    /// Simulated seconds since start.
    pub simulation_time: f32,
    /// Ticks since start.
    pub time_step: u64,
    pub total_simulation_time: f32,
}

/// Clock readings either side of one advance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockAdvance {
    pub previous_time: f32,
    pub current_time: f32,
}

impl SimulationClock {
    pub fn new(total_simulation_time: f32) -> Self {
        Self {
            simulation_time: 0.0,
            time_step: 0,
            total_simulation_time,
        }
    }

    pub fn advance(&mut self, step_duration: f32) -> ClockAdvance {
        let previous_time = self.simulation_time;
        self.simulation_time += step_duration;
        self.time_step += 1;
        ClockAdvance {
            previous_time,
            current_time: self.simulation_time,
        }
    }

    /// Whether the planned run length has been reached.
    pub fn is_past_total(&self) -> bool {
        self.simulation_time >= self.total_simulation_time
    }

    /// Fraction of the planned run elapsed (may exceed 1).
    pub fn progress(&self) -> f32 {
        if self.total_simulation_time <= 0.0 {
            return 0.0;
        }
        self.simulation_time / self.total_simulation_time
    }

    pub fn reset(&mut self) {
        self.simulation_time = 0.0;
        self.time_step = 0;
    }
}

/// One point on the fire/danger timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistorySample {
    /// Simulated time, rounded down to the sampling interval.
    pub time: f32,
    pub fire_count: usize,
    /// Mean danger score over every node.
    pub avg_danger: f32,
}

/// Rolling buffer of the most recent samples.
#[derive(Debug, Clone, Default)]
pub struct HistorySampler {
    samples: VecDeque<HistorySample>,
}

impl HistorySampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample `sensors` if the advance crossed a sampling boundary.
    ///
    /// Must be called with the state committed at the end of the tick that
    /// produced `advance`.
    pub fn record_if_crossed(
        &mut self,
        advance: ClockAdvance,
        sensors: &SensorMap,
    ) -> Option<HistorySample> {
        let bucket = |t: f32| (t / HISTORY_INTERVAL).floor();
        if bucket(advance.current_time) <= bucket(advance.previous_time) {
            return None;
        }

        let avg_danger = if sensors.is_empty() {
            0.0
        } else {
            sensors.iter().map(danger_score).sum::<f32>() / sensors.len() as f32
        };
        let sample = HistorySample {
            time: bucket(advance.current_time) * HISTORY_INTERVAL,
            fire_count: sensors.fire_count(),
            avg_danger,
        };

        if self.samples.len() == HISTORY_CAPACITY {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        Some(sample)
    }

    pub fn samples(&self) -> impl Iterator<Item = &HistorySample> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&HistorySample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::SensorState;

    fn map_with_one_fire() -> SensorMap {
        SensorMap::from_states(vec![
            SensorState {
                fire_detected: true,
                ..Default::default()
            },
            SensorState::default(),
        ])
    }

    #[test]
    fn test_clock_advances() {
        let mut clock = SimulationClock::new(120.0);
        let adv = clock.advance(30.0);
        assert_eq!(adv.previous_time, 0.0);
        assert_eq!(adv.current_time, 30.0);
        assert_eq!(clock.time_step, 1);
        assert!(!clock.is_past_total());
    }

    #[test]
    fn test_total_time_is_a_soft_cap() {
        let mut clock = SimulationClock::new(60.0);
        for _ in 0..4 {
            clock.advance(30.0);
        }
        assert!(clock.is_past_total());
        assert_eq!(clock.simulation_time, 120.0);
        assert_eq!(clock.time_step, 4);
        assert_eq!(clock.progress(), 2.0);
        clock.reset();
        assert_eq!(clock.simulation_time, 0.0);
        assert_eq!(clock.time_step, 0);
    }

    #[test]
    fn test_samples_on_boundary_crossing() {
        let sensors = map_with_one_fire();
        let mut history = HistorySampler::new();
        let within = ClockAdvance {
            previous_time: 0.0,
            current_time: 5.0,
        };
        assert!(history.record_if_crossed(within, &sensors).is_none());

        let crossing = ClockAdvance {
            previous_time: 5.0,
            current_time: 35.0,
        };
        let sample = history.record_if_crossed(crossing, &sensors).unwrap();
        assert_eq!(sample.time, 30.0);
        assert_eq!(sample.fire_count, 1);
        assert_eq!(sample.avg_danger, 20.0);
    }

    #[test]
    fn test_history_is_bounded() {
        let sensors = map_with_one_fire();
        let mut history = HistorySampler::new();
        let mut clock = SimulationClock::new(120.0);
        for _ in 0..20 {
            let adv = clock.advance(10.0);
            history.record_if_crossed(adv, &sensors);
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.samples().next().unwrap().time, 90.0);
        assert_eq!(history.latest().unwrap().time, 200.0);
    }
}
