//! Simulation driver: owns the state and runs one tick at a time.
//!
//! The host calls [`Simulation::advance_tick`] on its own timer. A tick is
//! synchronous and takes `&mut self`, so two ticks can never overlap and
//! route recomputation never interleaves with propagation. Pausing is just
//! not calling it.
//!
//! ```
//! use firewatch_logic::config::SimulationConfig;
//! use firewatch_logic::scenario::Scenario;
//! use firewatch_logic::simulation::Simulation;
//! use firewatch_logic::topology::{Edge, FloorTopology, Node, NodeKind};
//! use std::time::Instant;
//!
//! let topology = FloorTopology::new(
//!     vec![
//!         Node::new("R1", NodeKind::Room),
//!         Node::new("R2", NodeKind::Room),
//!         Node::new("EXIT1", NodeKind::Exit),
//!     ],
//!     vec![Edge::new("R1", "EXIT1"), Edge::new("R1", "R2")],
//! )
//! .unwrap();
//! let scenario = Scenario::all_exits("R1", &topology).with_fire("R2");
//! let mut sim = Simulation::new(topology, scenario, SimulationConfig::default(), 42).unwrap();
//!
//! let summary = sim.advance_tick(Instant::now());
//! assert_eq!(summary.time_step, 1);
//! assert!(sim.recommended().is_some());
//! ```

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::clock::{HistorySample, HistorySampler, SimulationClock};
use crate::config::{validate_config, SimulationConfig};
use crate::danger::danger_score;
use crate::error::SimError;
use crate::propagation::{advance_hazards, HazardStep};
use crate::risk::{find_routes, select_route, RecommendedRoute, Route, RouteTracker};
use crate::scenario::{Baseline, Scenario};
use crate::sensor::{SensorMap, SensorState};
use crate::stats::FloorStatistics;
use crate::topology::{FloorTopology, Node, NodeId, NodeKind};

/// A node's current sensor state with its danger score.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NodeReading<'a> {
    pub node: &'a Node,
    pub state: &'a SensorState,
    pub danger_score: f32,
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    pub time_step: u64,
    pub simulation_time: f32,
    /// Nodes that caught fire this tick.
    pub ignited: Vec<NodeId>,
    pub fire_count: usize,
    /// Set when this tick crossed a history sampling boundary.
    pub history_sample: Option<HistorySample>,
    pub route_changed: bool,
    /// `None` means no route exists: shelter in place.
    pub recommended_exit: Option<NodeId>,
}

pub struct Simulation<R = StdRng> {
    topology: FloorTopology,
    scenario: Scenario,
    config: SimulationConfig,
    seed: u64,
    rng: R,
    sensors: SensorMap,
    clock: SimulationClock,
    history: HistorySampler,
    routes: Vec<Route>,
    tracker: RouteTracker,
}

impl Simulation {
    /// Build a simulation driven by the standard seeded generator.
    pub fn new(
        topology: FloorTopology,
        scenario: Scenario,
        config: SimulationConfig,
        seed: u64,
    ) -> Result<Self, SimError> {
        Self::seeded(topology, scenario, config, seed)
    }
}

impl<R: Rng + SeedableRng> Simulation<R> {
    /// Build a simulation with any seedable generator.
    ///
    /// Rejects invalid configuration and scenarios that reference nodes the
    /// topology does not have. Sensors are seeded, initial fires lit, and
    /// routes computed before this returns.
    pub fn seeded(
        topology: FloorTopology,
        scenario: Scenario,
        config: SimulationConfig,
        seed: u64,
    ) -> Result<Self, SimError> {
        let errors = validate_config(&config);
        if !errors.is_empty() {
            return Err(SimError::InvalidConfig(errors));
        }
        validate_scenario(&topology, &scenario)?;

        let mut sim = Self {
            clock: SimulationClock::new(config.total_simulation_time),
            sensors: SensorMap::benign(&topology),
            topology,
            scenario,
            config,
            seed,
            rng: R::seed_from_u64(seed),
            history: HistorySampler::new(),
            routes: Vec::new(),
            tracker: RouteTracker::new(),
        };
        sim.initialize_sensors();
        sim.recompute_routes(Instant::now());
        Ok(sim)
    }

    /// Advance hazards by one step and re-evaluate routes.
    ///
    /// `now` is the real-time instant of the tick; it only dates the route
    /// change window.
    pub fn advance_tick(&mut self, now: Instant) -> TickSummary {
        let advance = self.clock.advance(self.config.step_duration);
        let step = HazardStep::new(
            self.config.step_duration,
            advance.current_time,
            self.config.total_simulation_time,
        );

        let report = advance_hazards(&self.topology, &mut self.sensors, step, &mut self.rng);
        for (state, node) in self.sensors.iter().zip(self.topology.nodes()) {
            state.debug_check_bounds(node.kind);
        }

        // Sample the state this tick committed, before anything else can touch it.
        let history_sample = self.history.record_if_crossed(advance, &self.sensors);

        let route_changed = self.recompute_routes(now);
        let fire_count = self.sensors.fire_count();
        let recommended_exit = self.tracker.current().map(|r| r.route.exit.clone());

        log::debug!(
            "tick {} t={:.0}s fires={} routes={} recommended={}",
            self.clock.time_step,
            self.clock.simulation_time,
            fire_count,
            self.routes.len(),
            recommended_exit
                .as_ref()
                .map(|e| e.as_str())
                .unwrap_or("none")
        );

        TickSummary {
            time_step: self.clock.time_step,
            simulation_time: self.clock.simulation_time,
            ignited: report
                .ignited
                .iter()
                .map(|&i| self.topology.node(i).id.clone())
                .collect(),
            fire_count,
            history_sample,
            route_changed,
            recommended_exit,
        }
    }

    /// Return to the initial state: re-seed the generator and sensors, zero
    /// the clock, clear history and route tracking, and relight the
    /// scenario's fires.
    pub fn reset(&mut self) {
        self.rng = R::seed_from_u64(self.seed);
        self.clock.reset();
        self.history.clear();
        self.tracker.clear();
        self.routes.clear();
        self.initialize_sensors();
        self.recompute_routes(Instant::now());
        log::info!("simulation reset (seed {})", self.seed);
    }

    fn initialize_sensors(&mut self) {
        self.sensors = match self.scenario.baseline {
            Baseline::Ambient => SensorMap::ambient(&self.topology, &mut self.rng),
            Baseline::Benign => SensorMap::benign(&self.topology),
        };
        for ignition in &self.scenario.ignitions {
            if let Some(sensor) = self
                .sensors
                .by_id_mut(&self.topology, ignition.node.as_str())
            {
                ignition.seed.apply(sensor);
            }
        }
    }

    /// Recompute every route from the current sensors and update the
    /// recommendation. Returns whether the recommended path changed.
    fn recompute_routes(&mut self, now: Instant) -> bool {
        self.routes = find_routes(
            &self.topology,
            &self.sensors,
            self.scenario.origin.as_str(),
            &self.scenario.exits,
        );
        self.tracker
            .update(select_route(&self.routes), now)
            .is_some_and(|r| r.changed)
    }

    /// Replace the configuration. Takes effect from the next tick.
    pub fn set_config(&mut self, config: SimulationConfig) -> Result<(), SimError> {
        let errors = validate_config(&config);
        if !errors.is_empty() {
            return Err(SimError::InvalidConfig(errors));
        }
        self.config = config;
        self.clock.total_simulation_time = config.total_simulation_time;
        Ok(())
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn topology(&self) -> &FloorTopology {
        &self.topology
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn sensors(&self) -> &SensorMap {
        &self.sensors
    }

    /// Every node with its sensor state and danger score, in floor-plan order.
    pub fn readings(&self) -> Vec<NodeReading<'_>> {
        self.topology
            .nodes()
            .iter()
            .zip(self.sensors.iter())
            .map(|(node, state)| NodeReading {
                node,
                state,
                danger_score: danger_score(state),
            })
            .collect()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn recommended(&self) -> Option<&RecommendedRoute> {
        self.tracker.current()
    }

    /// True when no exit is reachable at all.
    pub fn shelter_in_place(&self) -> bool {
        self.tracker.current().is_none()
    }

    /// Whether the recommended path changed within the last two seconds.
    pub fn is_route_changed(&self, now: Instant) -> bool {
        self.tracker.is_changed(now)
    }

    pub fn evacuation_progress(&self) -> f32 {
        self.tracker.evacuation_progress()
    }

    pub fn set_evacuation_progress(&mut self, progress: f32) {
        self.tracker.set_evacuation_progress(progress);
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn simulation_time(&self) -> f32 {
        self.clock.simulation_time
    }

    pub fn time_step(&self) -> u64 {
        self.clock.time_step
    }

    pub fn history(&self) -> &HistorySampler {
        &self.history
    }

    pub fn statistics(&self) -> FloorStatistics {
        FloorStatistics::collect(&self.sensors, &self.routes)
    }
}

fn validate_scenario(topology: &FloorTopology, scenario: &Scenario) -> Result<(), SimError> {
    if !topology.contains(scenario.origin.as_str()) {
        return Err(SimError::UnknownOrigin(scenario.origin.clone()));
    }
    if scenario.exits.is_empty() {
        return Err(SimError::NoExits);
    }
    for exit in &scenario.exits {
        let idx = topology
            .index_of(exit.as_str())
            .ok_or_else(|| SimError::UnknownExit(exit.clone()))?;
        if topology.node(idx).kind != NodeKind::Exit {
            log::warn!("exit {} is a {:?}, not an exit node", exit, topology.node(idx).kind);
        }
    }
    for ignition in &scenario.ignitions {
        let idx = topology
            .index_of(ignition.node.as_str())
            .ok_or_else(|| SimError::UnknownIgnition(ignition.node.clone()))?;
        let mut seeded_state = SensorState::default();
        ignition.seed.apply(&mut seeded_state);
        if !seeded_state.within_bounds(topology.node(idx).kind) {
            return Err(SimError::SeedOutOfBounds(ignition.node.clone()));
        }
    }
    Ok(())
}
