//! Per-node sensor readings and their bounds.
//!
//! Each node carries one `SensorState`, overwritten in place every tick.
//! All numeric fields are bounded; the propagation engine clamps rather
//! than fails, and `within_bounds` lets tests and debug builds assert that
//! no update ever escapes its range.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::topology::{FloorTopology, NodeKind};

/// Sensor bounds shared by construction checks and the propagation engine.
pub mod bounds {
    pub const SMOKE_MAX: f32 = 1.0;
    /// Hottest a burning node can get (°C).
    pub const TEMPERATURE_MAX: f32 = 300.0;
    /// Lowest oxygen a burning node can reach (%).
    pub const OXYGEN_MIN: f32 = 8.0;
    pub const VISIBILITY_MIN: f32 = 0.0;
    pub const VISIBILITY_MAX: f32 = 100.0;
    /// Highest CO a burning node can reach (ppm).
    pub const CO_MAX: f32 = 500.0;
    pub const INTEGRITY_MIN: f32 = 20.0;
    pub const INTEGRITY_MAX: f32 = 100.0;
    pub const OCCUPANCY_MAX: f32 = 1.0;
    /// Exits never fill past this density.
    pub const EXIT_OCCUPANCY_MAX: f32 = 0.9;
    pub const EVACUATION_PROGRESS_MAX: f32 = 100.0;
}

/// Sensor snapshot for a single node.
///
/// Missing fields deserialize to benign values, so partial snapshots from
/// the host always score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorState {
    pub fire_detected: bool,
    /// Smoke density (0.0 = clear, 1.0 = opaque).
    pub smoke_level: f32,
    /// Air temperature in °C.
    pub temperature: f32,
    /// Oxygen concentration in percent (21 = normal air).
    pub oxygen_level: f32,
    /// Visibility in percent.
    pub visibility: f32,
    /// Carbon monoxide in ppm.
    pub carbon_monoxide: f32,
    /// Structural integrity in percent.
    pub structural_integrity: f32,
    /// Occupant density (0.0 = empty, 1.0 = packed).
    pub occupancy_density: f32,
    pub exit_accessible: bool,
    pub emergency_lighting: bool,
    /// Seconds the fire at this node has been burning.
    pub time_since_fire_start: f32,
    pub flashover_risk: f32,
    pub panic_level: f32,
    /// Percentage of this node's occupants that have left.
    pub evacuation_progress: f32,
}

impl Default for SensorState {
    fn default() -> Self {
        Self {
            fire_detected: false,
            smoke_level: 0.0,
            temperature: 20.0,
            oxygen_level: 21.0,
            visibility: 100.0,
            carbon_monoxide: 0.0,
            structural_integrity: 100.0,
            occupancy_density: 0.0,
            exit_accessible: true,
            emergency_lighting: true,
            time_since_fire_start: 0.0,
            flashover_risk: 0.0,
            panic_level: 0.0,
            evacuation_progress: 0.0,
        }
    }
}

impl SensorState {
    /// Randomized pre-fire baseline: faint smoke, room temperature, normal air.
    /// Exits start lightly occupied, everything else moderately.
    pub fn ambient(kind: NodeKind, rng: &mut impl Rng) -> Self {
        let occupancy_density = if kind == NodeKind::Exit {
            rng.gen::<f32>() * 0.2 + 0.1
        } else {
            rng.gen::<f32>() * 0.4 + 0.3
        };
        Self {
            smoke_level: rng.gen::<f32>() * 0.1,
            temperature: 20.0 + rng.gen::<f32>() * 5.0,
            oxygen_level: 20.5 + rng.gen::<f32>() * 0.5,
            visibility: 95.0 + rng.gen::<f32>() * 5.0,
            carbon_monoxide: rng.gen::<f32>() * 5.0,
            occupancy_density,
            ..Default::default()
        }
    }

    /// Whether every bounded field is inside its range for a node of `kind`.
    pub fn within_bounds(&self, kind: NodeKind) -> bool {
        use bounds::*;
        let occupancy_max = if kind == NodeKind::Exit {
            EXIT_OCCUPANCY_MAX
        } else {
            OCCUPANCY_MAX
        };
        let in_range = |v: f32, lo: f32, hi: f32| v.is_finite() && v >= lo && v <= hi;

        in_range(self.smoke_level, 0.0, SMOKE_MAX)
            && self.temperature.is_finite()
            && self.temperature <= TEMPERATURE_MAX
            && self.oxygen_level.is_finite()
            && self.oxygen_level >= OXYGEN_MIN
            && in_range(self.visibility, VISIBILITY_MIN, VISIBILITY_MAX)
            && in_range(self.carbon_monoxide, 0.0, CO_MAX)
            && in_range(self.structural_integrity, INTEGRITY_MIN, INTEGRITY_MAX)
            && in_range(self.occupancy_density, 0.0, occupancy_max)
            && in_range(self.flashover_risk, 0.0, 1.0)
            && in_range(self.panic_level, 0.0, 1.0)
            && in_range(self.evacuation_progress, 0.0, EVACUATION_PROGRESS_MAX)
            && self.time_since_fire_start >= 0.0
    }

    /// Panic in debug and test builds if a bound has been violated.
    pub fn debug_check_bounds(&self, kind: NodeKind) {
        debug_assert!(
            self.within_bounds(kind),
            "sensor state out of bounds for {kind:?}: {self:?}"
        );
    }
}

/// Sensor profile applied to a node that starts the scenario on fire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireSeed {
    pub smoke_level: f32,
    pub temperature: f32,
    pub oxygen_level: f32,
    pub visibility: f32,
    pub carbon_monoxide: f32,
    pub structural_integrity: f32,
    pub flashover_risk: f32,
    pub panic_level: f32,
}

impl Default for FireSeed {
    fn default() -> Self {
        Self {
            smoke_level: 0.75,
            temperature: 160.0,
            oxygen_level: 16.0,
            visibility: 25.0,
            carbon_monoxide: 120.0,
            structural_integrity: 95.0,
            flashover_risk: 0.3,
            panic_level: 0.4,
        }
    }
}

impl FireSeed {
    /// Ignite `sensor` with this profile. Occupancy and lighting are kept.
    pub fn apply(&self, sensor: &mut SensorState) {
        sensor.fire_detected = true;
        sensor.smoke_level = self.smoke_level;
        sensor.temperature = self.temperature;
        sensor.oxygen_level = self.oxygen_level;
        sensor.visibility = self.visibility;
        sensor.carbon_monoxide = self.carbon_monoxide;
        sensor.structural_integrity = self.structural_integrity;
        sensor.time_since_fire_start = 0.0;
        sensor.flashover_risk = self.flashover_risk;
        sensor.panic_level = self.panic_level;
    }
}

/// Sensor states for every node, aligned with topology indices.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorMap {
    states: Vec<SensorState>,
}

impl SensorMap {
    /// Every node at benign defaults.
    pub fn benign(topology: &FloorTopology) -> Self {
        Self {
            states: vec![SensorState::default(); topology.len()],
        }
    }

    /// Every node at a randomized ambient baseline, drawn in node order.
    pub fn ambient(topology: &FloorTopology, rng: &mut impl Rng) -> Self {
        Self {
            states: topology
                .nodes()
                .iter()
                .map(|n| SensorState::ambient(n.kind, rng))
                .collect(),
        }
    }

    pub fn from_states(states: Vec<SensorState>) -> Self {
        Self { states }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&SensorState> {
        self.states.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut SensorState> {
        self.states.get_mut(idx)
    }

    pub fn by_id<'a>(&'a self, topology: &FloorTopology, id: &str) -> Option<&'a SensorState> {
        topology.index_of(id).and_then(|i| self.states.get(i))
    }

    pub fn by_id_mut<'a>(
        &'a mut self,
        topology: &FloorTopology,
        id: &str,
    ) -> Option<&'a mut SensorState> {
        topology.index_of(id).and_then(|i| self.states.get_mut(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SensorState> {
        self.states.iter()
    }

    pub fn as_slice(&self) -> &[SensorState] {
        &self.states
    }

    pub(crate) fn states_mut(&mut self) -> &mut [SensorState] {
        &mut self.states
    }

    /// Number of nodes currently on fire.
    pub fn fire_count(&self) -> usize {
        self.states.iter().filter(|s| s.fire_detected).count()
    }

    /// Whether every node is inside its bounds.
    pub fn all_within_bounds(&self, topology: &FloorTopology) -> bool {
        self.states
            .iter()
            .zip(topology.nodes())
            .all(|(s, n)| s.within_bounds(n.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_is_within_bounds() {
        let s = SensorState::default();
        assert!(s.within_bounds(NodeKind::Room));
        assert!(s.within_bounds(NodeKind::Exit));
    }

    #[test]
    fn test_ambient_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let room = SensorState::ambient(NodeKind::Room, &mut rng);
            assert!(room.within_bounds(NodeKind::Room));
            assert!((0.3..=0.7).contains(&room.occupancy_density));
            assert!((20.0..=25.0).contains(&room.temperature));
            assert!(!room.fire_detected);

            let exit = SensorState::ambient(NodeKind::Exit, &mut rng);
            assert!((0.1..=0.3).contains(&exit.occupancy_density));
        }
    }

    #[test]
    fn test_exit_occupancy_cap() {
        let s = SensorState {
            occupancy_density: 0.95,
            ..Default::default()
        };
        assert!(s.within_bounds(NodeKind::Room));
        assert!(!s.within_bounds(NodeKind::Exit));
    }

    #[test]
    fn test_fire_seed_ignites() {
        let mut s = SensorState {
            occupancy_density: 0.5,
            ..Default::default()
        };
        FireSeed::default().apply(&mut s);
        assert!(s.fire_detected);
        assert_eq!(s.temperature, 160.0);
        assert_eq!(s.occupancy_density, 0.5, "occupancy is not part of the seed");
        assert!(s.within_bounds(NodeKind::Room));
    }

    #[test]
    fn test_partial_snapshot_deserializes_benign() {
        let s: SensorState = serde_json::from_str(r#"{"fire_detected": true}"#).unwrap();
        assert!(s.fire_detected);
        assert_eq!(s.temperature, 20.0);
        assert_eq!(s.oxygen_level, 21.0);
        assert_eq!(s.visibility, 100.0);
        assert!(s.exit_accessible);
    }

    #[test]
    fn test_out_of_bounds_detected() {
        let hot = SensorState {
            temperature: 301.0,
            ..Default::default()
        };
        assert!(!hot.within_bounds(NodeKind::Room));
        let weak = SensorState {
            structural_integrity: 10.0,
            ..Default::default()
        };
        assert!(!weak.within_bounds(NodeKind::Corridor));
    }
}
