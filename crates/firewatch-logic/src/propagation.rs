//! Hazard propagation. Advances every node's sensor state by one tick.
//!
//! A tick runs four phases in a fixed order over a single working map:
//!
//! 1. existing fires intensify,
//! 2. fire spreads to adjacent nodes,
//! 3. smoke, heat, and CO diffuse out of burning or smoky nodes,
//! 4. occupants evacuate rooms and corridors and accumulate at exits.
//!
//! Phases mutate the map in place and each sees the output of the ones
//! before it. Within phase 2 a node ignited earlier in the pass can itself
//! spread later in the same pass, so fire can cascade more than one hop per
//! tick. Nodes never extinguish.

use rand::Rng;

use crate::danger::danger_score;
use crate::sensor::{bounds, SensorMap, SensorState};
use crate::topology::{FloorTopology, NodeKind};

/// Rate constants for the propagation phases.
pub mod hazard_constants {
    /// Intensity grows by this fraction of its base over the full run.
    pub const INTENSITY_RAMP: f32 = 0.5;

    // Phase 1: intensification
    pub const HEAT_AGE_SCALE: f32 = 60.0;
    pub const SMOKE_AGE_SCALE: f32 = 120.0;
    pub const FLASHOVER_TEMPERATURE: f32 = 200.0;
    pub const FLASHOVER_FAST: f32 = 0.05;
    pub const FLASHOVER_SLOW: f32 = 0.02;
    pub const PANIC_RATE: f32 = 0.02;

    // Phase 2: spread
    pub const BASE_SPREAD_CHANCE: f32 = 0.12;
    pub const HOT_NEIGHBOR_TEMPERATURE: f32 = 70.0;
    pub const HOT_NEIGHBOR_BONUS: f32 = 0.15;
    pub const SMOKY_NEIGHBOR_LEVEL: f32 = 0.4;
    pub const SMOKY_NEIGHBOR_BONUS: f32 = 0.10;
    pub const CYLINDER_TEMPERATURE: f32 = 50.0;
    pub const CYLINDER_BONUS: f32 = 0.30;
    pub const IGNITION_OXYGEN_DROP: f32 = 2.0;
    pub const IGNITION_OXYGEN_FLOOR: f32 = 14.0;
    pub const IGNITION_CO_RISE: f32 = 50.0;
    pub const IGNITION_CO_CAP: f32 = 200.0;

    // Phase 3: diffusion
    pub const DIFFUSION_SMOKE_SOURCE: f32 = 0.3;
    pub const DIFFUSION_SMOKE_CAP: f32 = 0.9;
    pub const DIFFUSION_TEMPERATURE_CAP: f32 = 100.0;
    pub const DIFFUSION_OXYGEN_FLOOR: f32 = 16.0;
    pub const DIFFUSION_VISIBILITY_FLOOR: f32 = 10.0;
    pub const DIFFUSION_CO_FRACTION: f32 = 0.08;
    pub const DIFFUSION_CO_CAP: f32 = 150.0;

    // Phase 4: occupancy
    pub const BASE_EVACUATION_RATE: f32 = 0.05;
    pub const DANGER_EVACUATION_RATE: f32 = 0.1;
    pub const EXIT_ARRIVAL_CEILING: f32 = 0.85;
}

/// Parameters for a single tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HazardStep {
    /// Simulated seconds covered by the tick.
    pub step_duration: f32,
    /// Uniform scale applied to every rate this tick.
    pub intensity_multiplier: f32,
}

impl HazardStep {
    pub fn new(step_duration: f32, simulation_time: f32, total_simulation_time: f32) -> Self {
        Self {
            step_duration,
            intensity_multiplier: intensity_multiplier(simulation_time, total_simulation_time),
        }
    }
}

/// What changed during a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HazardReport {
    /// Indices of nodes that caught fire this tick, in ignition order.
    pub ignited: Vec<usize>,
}

/// `1 + (time / total) × 0.5`. Fires get worse the longer the run goes.
pub fn intensity_multiplier(simulation_time: f32, total_simulation_time: f32) -> f32 {
    if total_simulation_time <= 0.0 {
        return 1.0;
    }
    1.0 + (simulation_time / total_simulation_time) * hazard_constants::INTENSITY_RAMP
}

/// Advance the whole sensor map by one tick.
pub fn advance_hazards(
    topology: &FloorTopology,
    sensors: &mut SensorMap,
    step: HazardStep,
    rng: &mut impl Rng,
) -> HazardReport {
    let states = sensors.states_mut();

    intensify_fires(states, step, rng);
    let ignited = spread_fire(topology, states, step, rng);
    diffuse_smoke(topology, states, step, rng);
    update_occupancy(topology, states, step, rng);

    for idx in &ignited {
        log::debug!(
            "fire spread to {} ({})",
            topology.node(*idx).id,
            topology.node(*idx).name
        );
    }

    HazardReport { ignited }
}

/// Phase 1: every burning node gets hotter, smokier, and more toxic.
/// Growth accelerates with fire age.
pub fn intensify_fires(states: &mut [SensorState], step: HazardStep, rng: &mut impl Rng) {
    use hazard_constants::*;
    let m = step.intensity_multiplier;

    for s in states.iter_mut().filter(|s| s.fire_detected) {
        let fire_age = s.time_since_fire_start + step.step_duration;
        let heat_age = 1.0 + fire_age / HEAT_AGE_SCALE;

        let temp_rise = (5.0 + rng.gen::<f32>() * 10.0) * m * heat_age;
        let smoke_rise = (0.02 + rng.gen::<f32>() * 0.03) * m * (1.0 + fire_age / SMOKE_AGE_SCALE);
        let oxygen_loss = (0.2 + rng.gen::<f32>() * 0.3) * m;
        let visibility_loss = (2.0 + rng.gen::<f32>() * 3.0) * m;
        let co_rise = (5.0 + rng.gen::<f32>() * 10.0) * m * heat_age;
        let integrity_loss = (0.5 + rng.gen::<f32>() * 1.5) * m;

        s.temperature = raise_capped(s.temperature, temp_rise, bounds::TEMPERATURE_MAX);
        s.smoke_level = raise_capped(s.smoke_level, smoke_rise, bounds::SMOKE_MAX);
        s.oxygen_level = lower_floored(s.oxygen_level, oxygen_loss, bounds::OXYGEN_MIN);
        s.visibility = lower_floored(s.visibility, visibility_loss, bounds::VISIBILITY_MIN);
        s.carbon_monoxide = raise_capped(s.carbon_monoxide, co_rise, bounds::CO_MAX);
        s.structural_integrity =
            lower_floored(s.structural_integrity, integrity_loss, bounds::INTEGRITY_MIN);
        s.time_since_fire_start = fire_age;

        let flashover_rise = if s.temperature > FLASHOVER_TEMPERATURE {
            FLASHOVER_FAST
        } else {
            FLASHOVER_SLOW
        };
        s.flashover_risk = raise_capped(s.flashover_risk, flashover_rise, 1.0);
        s.panic_level = raise_capped(s.panic_level, PANIC_RATE * m, 1.0);
    }
}

/// Ignition probability for one burning node reaching a non-burning neighbor.
pub fn ignition_chance(neighbor: &SensorState, has_oxygen_cylinder: bool, multiplier: f32) -> f32 {
    use hazard_constants::*;

    let mut chance = BASE_SPREAD_CHANCE * multiplier;
    if neighbor.temperature > HOT_NEIGHBOR_TEMPERATURE {
        chance += HOT_NEIGHBOR_BONUS;
    }
    if neighbor.smoke_level > SMOKY_NEIGHBOR_LEVEL {
        chance += SMOKY_NEIGHBOR_BONUS;
    }
    // Heated oxygen cylinders are an explosion risk.
    if has_oxygen_cylinder && neighbor.temperature > CYLINDER_TEMPERATURE {
        chance += CYLINDER_BONUS;
    }
    chance
}

/// Phase 2: each burning node tries once to ignite each non-burning neighbor.
/// Returns the indices ignited, in order.
pub fn spread_fire(
    topology: &FloorTopology,
    states: &mut [SensorState],
    step: HazardStep,
    rng: &mut impl Rng,
) -> Vec<usize> {
    use hazard_constants::*;

    let mut ignited = Vec::new();
    for idx in 0..states.len() {
        if !states[idx].fire_detected {
            continue;
        }
        for &nb in topology.neighbor_indices(idx) {
            if states[nb].fire_detected {
                continue;
            }
            let chance = ignition_chance(
                &states[nb],
                topology.node(nb).has_oxygen_cylinder,
                step.intensity_multiplier,
            );
            if rng.gen::<f32>() < chance {
                let s = &mut states[nb];
                s.fire_detected = true;
                s.smoke_level = s.smoke_level.max(0.6 + rng.gen::<f32>() * 0.2);
                s.temperature = s.temperature.max(120.0 + rng.gen::<f32>() * 60.0);
                s.oxygen_level =
                    lower_floored(s.oxygen_level, IGNITION_OXYGEN_DROP, IGNITION_OXYGEN_FLOOR);
                s.visibility = s.visibility.min(20.0 + rng.gen::<f32>() * 10.0);
                s.carbon_monoxide = raise_capped(s.carbon_monoxide, IGNITION_CO_RISE, IGNITION_CO_CAP);
                s.time_since_fire_start = 0.0;
                ignited.push(nb);
            }
        }
    }
    ignited
}

/// Phase 3: burning or smoky nodes push smoke, heat, and CO into
/// non-burning neighbors and draw down their oxygen and visibility.
pub fn diffuse_smoke(
    topology: &FloorTopology,
    states: &mut [SensorState],
    step: HazardStep,
    rng: &mut impl Rng,
) {
    use hazard_constants::*;
    let m = step.intensity_multiplier;

    for idx in 0..states.len() {
        let source = states[idx];
        if !(source.fire_detected || source.smoke_level > DIFFUSION_SMOKE_SOURCE) {
            continue;
        }
        for &nb in topology.neighbor_indices(idx) {
            if states[nb].fire_detected {
                continue;
            }
            let smoke_drift = (0.03 + rng.gen::<f32>() * 0.05) * m;
            let heat_rise = (2.0 + rng.gen::<f32>() * 6.0) * m;
            let oxygen_loss = (0.1 + rng.gen::<f32>() * 0.2) * m;
            let visibility_loss = (2.0 + rng.gen::<f32>() * 4.0) * m;
            let co_spread = source.carbon_monoxide * DIFFUSION_CO_FRACTION * m;

            let s = &mut states[nb];
            s.smoke_level = raise_capped(s.smoke_level, smoke_drift, DIFFUSION_SMOKE_CAP);
            s.temperature = raise_capped(s.temperature, heat_rise, DIFFUSION_TEMPERATURE_CAP);
            s.oxygen_level = lower_floored(s.oxygen_level, oxygen_loss, DIFFUSION_OXYGEN_FLOOR);
            s.visibility = lower_floored(s.visibility, visibility_loss, DIFFUSION_VISIBILITY_FLOOR);
            s.carbon_monoxide = raise_capped(s.carbon_monoxide, co_spread, DIFFUSION_CO_CAP);
        }
    }
}

/// Phase 4: occupants leave rooms and corridors (faster when it is more
/// dangerous) and pile up at exits.
pub fn update_occupancy(
    topology: &FloorTopology,
    states: &mut [SensorState],
    step: HazardStep,
    rng: &mut impl Rng,
) {
    use hazard_constants::*;
    let m = step.intensity_multiplier;

    for (idx, s) in states.iter_mut().enumerate() {
        if topology.node(idx).kind == NodeKind::Exit {
            if s.occupancy_density < EXIT_ARRIVAL_CEILING {
                let arrival = (0.02 + rng.gen::<f32>() * 0.06) * m;
                s.occupancy_density =
                    raise_capped(s.occupancy_density, arrival, bounds::EXIT_OCCUPANCY_MAX);
            }
        } else if s.occupancy_density > 0.0 {
            let danger = danger_score(s);
            let rate = (BASE_EVACUATION_RATE + danger / 100.0 * DANGER_EVACUATION_RATE) * m;
            s.occupancy_density = lower_floored(s.occupancy_density, rate, 0.0);
            s.evacuation_progress =
                raise_capped(s.evacuation_progress, rate * 100.0, bounds::EVACUATION_PROGRESS_MAX);
        }
    }
}

/// Add `amount`, never past `cap`. A value already above the cap is left as is.
fn raise_capped(value: f32, amount: f32, cap: f32) -> f32 {
    if value >= cap {
        value
    } else {
        (value + amount).min(cap)
    }
}

/// Subtract `amount`, never below `floor`. A value already below the floor is left as is.
fn lower_floored(value: f32, amount: f32, floor: f32) -> f32 {
    if value <= floor {
        value
    } else {
        (value - amount).max(floor)
    }
}
