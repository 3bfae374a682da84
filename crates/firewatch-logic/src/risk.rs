//! Route risk evaluation and recommendation.
//!
//! Each discovered path is scored node by node with [`danger_score`]. A route
//! is passable only when every node on it scores below 70. The recommended
//! route is the cheapest passable one (or the cheapest overall if none are
//! passable), where cost is average danger plus 100 if the route crosses a
//! fire. Ties keep the earlier route.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::danger::{danger_score, is_passable_score};
use crate::routing::discover_paths;
use crate::sensor::{SensorMap, SensorState};
use crate::topology::{FloorTopology, NodeId};

/// How long a route change stays flagged, in real time.
pub const ROUTE_CHANGE_FLASH: Duration = Duration::from_secs(2);

/// Temperature at which an oxygen cylinder on the path counts as a hazard.
pub const CYLINDER_HAZARD_TEMPERATURE: f32 = 40.0;

/// Penalty added to a route's cost when any node on it is burning.
pub const FIRE_ROUTE_PENALTY: f32 = 100.0;

/// Hazard summary for one path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskReport {
    pub avg_danger: f32,
    pub max_danger: f32,
    /// First node on the path carrying `max_danger`.
    pub max_danger_location: NodeId,
    pub total_danger: f32,
    /// Number of nodes on the path, origin and exit included.
    pub path_length: usize,
    pub has_fire: bool,
    pub has_oxygen_hazard: bool,
    pub passable: bool,
}

impl RiskReport {
    /// Cost minimized by route selection.
    pub fn selection_cost(&self) -> f32 {
        self.avg_danger + if self.has_fire { FIRE_ROUTE_PENALTY } else { 0.0 }
    }
}

/// A path from the origin to one exit, with its risk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub exit: NodeId,
    pub path: Vec<NodeId>,
    pub risk: RiskReport,
}

/// Score a path against the current sensor map.
///
/// Ids missing from the topology score as benign. Returns `None` for an
/// empty path.
pub fn evaluate_path(
    topology: &FloorTopology,
    sensors: &SensorMap,
    path: &[NodeId],
) -> Option<RiskReport> {
    if path.is_empty() {
        return None;
    }

    let benign = SensorState::default();
    let mut total_danger = 0.0;
    let mut max_danger = f32::NEG_INFINITY;
    let mut max_danger_location = &path[0];
    let mut has_fire = false;
    let mut has_oxygen_hazard = false;
    let mut passable = true;

    for id in path {
        let idx = topology.index_of(id.as_str());
        let sensor = idx.and_then(|i| sensors.get(i)).unwrap_or(&benign);
        let score = danger_score(sensor);

        total_danger += score;
        if score > max_danger {
            max_danger = score;
            max_danger_location = id;
        }
        has_fire |= sensor.fire_detected;
        if let Some(i) = idx {
            if topology.node(i).has_oxygen_cylinder
                && (sensor.temperature > CYLINDER_HAZARD_TEMPERATURE || sensor.fire_detected)
            {
                has_oxygen_hazard = true;
            }
        }
        passable &= is_passable_score(score);
    }

    Some(RiskReport {
        avg_danger: total_danger / path.len() as f32,
        max_danger,
        max_danger_location: max_danger_location.clone(),
        total_danger,
        path_length: path.len(),
        has_fire,
        has_oxygen_hazard,
        passable,
    })
}

/// Discover one shortest path per reachable exit and score each.
pub fn find_routes(
    topology: &FloorTopology,
    sensors: &SensorMap,
    origin: &str,
    exits: &[NodeId],
) -> Vec<Route> {
    discover_paths(topology, origin, exits)
        .into_iter()
        .filter_map(|(exit, path)| {
            let risk = evaluate_path(topology, sensors, &path)?;
            Some(Route { exit, path, risk })
        })
        .collect()
}

/// Pick the recommended route. `None` only when `routes` is empty.
pub fn select_route(routes: &[Route]) -> Option<&Route> {
    let any_passable = routes.iter().any(|r| r.risk.passable);
    let mut best: Option<&Route> = None;

    for route in routes.iter().filter(|r| !any_passable || r.risk.passable) {
        match best {
            Some(b) if route.risk.selection_cost() >= b.risk.selection_cost() => {}
            _ => best = Some(route),
        }
    }
    best
}

/// The route recommended at the latest evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedRoute {
    pub route: Route,
    /// Whether this evaluation switched to a different path.
    pub changed: bool,
    /// The recommendation before this one, if any.
    pub previous_path: Option<Vec<NodeId>>,
}

/// Tracks the recommendation across ticks and flags path changes.
#[derive(Debug, Clone, Default)]
pub struct RouteTracker {
    current: Option<RecommendedRoute>,
    previous_path: Option<Vec<NodeId>>,
    changed_at: Option<Instant>,
    sheltering: bool,
    /// How far along the recommended path the evacuation indicator is (0..=1).
    evacuation_progress: f32,
}

impl RouteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record this evaluation's selection.
    ///
    /// A path that differs by value from the last recommendation starts the
    /// change window and resets evacuation progress. With nothing selected
    /// the recommendation is cleared, but the last path is kept so a later
    /// recommendation is still compared against it.
    pub fn update(&mut self, selected: Option<&Route>, now: Instant) -> Option<&RecommendedRoute> {
        let Some(route) = selected else {
            if self.enter_shelter() {
                log::warn!("no safe route available, shelter in place");
            }
            return None;
        };
        self.sheltering = false;

        let changed = self
            .previous_path
            .as_ref()
            .is_some_and(|prev| *prev != route.path);
        if changed {
            self.changed_at = Some(now);
            self.evacuation_progress = 0.0;
            log::info!(
                "recommended route changed: now via {} ({} nodes, avg danger {:.1})",
                route.exit,
                route.risk.path_length,
                route.risk.avg_danger
            );
        }

        let previous_path = self.previous_path.replace(route.path.clone());
        self.current = Some(RecommendedRoute {
            route: route.clone(),
            changed,
            previous_path,
        });
        self.current.as_ref()
    }

    /// Clear the recommendation. Returns true only on the transition into
    /// sheltering.
    fn enter_shelter(&mut self) -> bool {
        self.current = None;
        !std::mem::replace(&mut self.sheltering, true)
    }

    pub fn current(&self) -> Option<&RecommendedRoute> {
        self.current.as_ref()
    }

    /// Whether the latest evaluation found no route at all.
    pub fn is_sheltering(&self) -> bool {
        self.sheltering
    }

    /// Whether a route change happened within the last [`ROUTE_CHANGE_FLASH`].
    pub fn is_changed(&self, now: Instant) -> bool {
        self.changed_at
            .is_some_and(|at| now.saturating_duration_since(at) < ROUTE_CHANGE_FLASH)
    }

    pub fn evacuation_progress(&self) -> f32 {
        self.evacuation_progress
    }

    pub fn set_evacuation_progress(&mut self, progress: f32) {
        self.evacuation_progress = progress.clamp(0.0, 1.0);
    }

    /// Forget everything, as at simulation start.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{Edge, Node, NodeKind};

    fn path(ids: &[&str]) -> Vec<NodeId> {
        ids.iter().map(|&s| NodeId::from(s)).collect()
    }

    fn chain() -> FloorTopology {
        FloorTopology::new(
            vec![
                Node::new("R1", NodeKind::Room),
                Node::new("C1", NodeKind::Corridor).with_oxygen_cylinder(),
                Node::new("EXIT1", NodeKind::Exit),
            ],
            vec![Edge::new("R1", "C1"), Edge::new("C1", "EXIT1")],
        )
        .unwrap()
    }

    fn route(exit: &str, ids: &[&str], avg: f32, fire: bool, passable: bool) -> Route {
        Route {
            exit: NodeId::from(exit),
            path: path(ids),
            risk: RiskReport {
                avg_danger: avg,
                max_danger: avg,
                max_danger_location: NodeId::from(ids[0]),
                total_danger: avg * ids.len() as f32,
                path_length: ids.len(),
                has_fire: fire,
                has_oxygen_hazard: false,
                passable,
            },
        }
    }

    #[test]
    fn test_clean_path_report() {
        let topo = chain();
        let sensors = SensorMap::benign(&topo);
        let r = evaluate_path(&topo, &sensors, &path(&["R1", "C1", "EXIT1"])).unwrap();
        assert_eq!(r.avg_danger, 0.0);
        assert_eq!(r.max_danger, 0.0);
        assert_eq!(r.max_danger_location.as_str(), "R1");
        assert_eq!(r.path_length, 3);
        assert!(!r.has_fire);
        assert!(!r.has_oxygen_hazard);
        assert!(r.passable);
    }

    #[test]
    fn test_max_danger_first_occurrence() {
        let topo = chain();
        let mut sensors = SensorMap::benign(&topo);
        for id in ["C1", "EXIT1"] {
            sensors.by_id_mut(&topo, id).unwrap().exit_accessible = false;
        }
        let r = evaluate_path(&topo, &sensors, &path(&["R1", "C1", "EXIT1"])).unwrap();
        assert_eq!(r.max_danger, 20.0);
        assert_eq!(r.max_danger_location.as_str(), "C1");
        assert!((r.total_danger - 40.0).abs() < 1e-4);
    }

    #[test]
    fn test_warm_cylinder_is_oxygen_hazard() {
        let topo = chain();
        let mut sensors = SensorMap::benign(&topo);
        sensors.by_id_mut(&topo, "C1").unwrap().temperature = 45.0;
        let r = evaluate_path(&topo, &sensors, &path(&["R1", "C1", "EXIT1"])).unwrap();
        assert!(r.has_oxygen_hazard);
        assert!(r.passable);
    }

    #[test]
    fn test_passable_iff_every_node_below_70() {
        let topo = chain();
        let mut sensors = SensorMap::benign(&topo);
        {
            let c1 = sensors.by_id_mut(&topo, "C1").unwrap();
            c1.fire_detected = true;
            c1.temperature = 200.0;
            c1.smoke_level = 0.75;
        }
        let r = evaluate_path(&topo, &sensors, &path(&["R1", "C1", "EXIT1"])).unwrap();
        assert!(r.max_danger >= 70.0);
        assert!(!r.passable);
        assert!(r.has_fire);
    }

    #[test]
    fn test_unknown_ids_score_benign() {
        let topo = chain();
        let sensors = SensorMap::benign(&topo);
        let r = evaluate_path(&topo, &sensors, &path(&["R1", "GHOST"])).unwrap();
        assert!(r.passable);
        assert_eq!(r.path_length, 2);
        assert!(evaluate_path(&topo, &sensors, &[]).is_none());
    }

    #[test]
    fn test_selection_prefers_passable() {
        let routes = vec![
            route("E1", &["O", "E1"], 10.0, false, false),
            route("E2", &["O", "A", "E2"], 50.0, false, true),
        ];
        assert_eq!(select_route(&routes).unwrap().exit.as_str(), "E2");
    }

    #[test]
    fn test_selection_penalizes_fire() {
        let routes = vec![
            route("E1", &["O", "E1"], 5.0, true, true),
            route("E2", &["O", "A", "E2"], 60.0, false, true),
        ];
        assert_eq!(select_route(&routes).unwrap().exit.as_str(), "E2");
    }

    #[test]
    fn test_selection_falls_back_to_all_routes() {
        let routes = vec![
            route("E1", &["O", "E1"], 80.0, true, false),
            route("E2", &["O", "E2"], 75.0, true, false),
        ];
        assert_eq!(select_route(&routes).unwrap().exit.as_str(), "E2");
    }

    #[test]
    fn test_selection_ties_keep_first() {
        let routes = vec![
            route("E1", &["O", "E1"], 10.0, false, true),
            route("E2", &["O", "E2"], 10.0, false, true),
        ];
        assert_eq!(select_route(&routes).unwrap().exit.as_str(), "E1");
        assert!(select_route(&[]).is_none());
    }

    #[test]
    fn test_tracker_first_recommendation_is_not_a_change() {
        let mut tracker = RouteTracker::new();
        let now = Instant::now();
        let r = route("E1", &["O", "E1"], 0.0, false, true);
        let rec = tracker.update(Some(&r), now).unwrap();
        assert!(!rec.changed);
        assert!(rec.previous_path.is_none());
        assert!(!tracker.is_changed(now));
    }

    #[test]
    fn test_tracker_flags_change_for_two_seconds() {
        let mut tracker = RouteTracker::new();
        let t0 = Instant::now();
        tracker.update(Some(&route("E1", &["O", "E1"], 0.0, false, true)), t0);
        tracker.set_evacuation_progress(0.6);

        let t1 = t0 + Duration::from_secs(5);
        let rec = tracker
            .update(Some(&route("E2", &["O", "A", "E2"], 0.0, false, true)), t1)
            .unwrap();
        assert!(rec.changed);
        assert_eq!(rec.previous_path, Some(path(&["O", "E1"])));
        assert_eq!(tracker.evacuation_progress(), 0.0);
        assert!(tracker.is_changed(t1));
        assert!(tracker.is_changed(t1 + Duration::from_millis(1999)));
        assert!(!tracker.is_changed(t1 + Duration::from_secs(2)));
    }

    #[test]
    fn test_tracker_same_path_is_not_a_change() {
        let mut tracker = RouteTracker::new();
        let now = Instant::now();
        let r = route("E1", &["O", "E1"], 0.0, false, true);
        tracker.update(Some(&r), now);
        tracker.set_evacuation_progress(0.4);
        let rec = tracker.update(Some(&r), now).unwrap();
        assert!(!rec.changed);
        assert_eq!(tracker.evacuation_progress(), 0.4);
    }

    #[test]
    fn test_tracker_no_route_clears_recommendation() {
        let mut tracker = RouteTracker::new();
        let now = Instant::now();
        tracker.update(Some(&route("E1", &["O", "E1"], 0.0, false, true)), now);
        assert!(tracker.update(None, now).is_none());
        assert!(tracker.current().is_none());

        // Comparison still runs against the last real recommendation.
        let rec = tracker
            .update(Some(&route("E2", &["O", "E2"], 0.0, false, true)), now)
            .unwrap();
        assert!(rec.changed);
    }

    #[test]
    fn test_tracker_shelter_warns_once_per_entry() {
        let mut tracker = RouteTracker::new();
        let now = Instant::now();
        assert!(!tracker.is_sheltering());

        // No route from the very first evaluation onward.
        assert!(tracker.enter_shelter());
        assert!(!tracker.enter_shelter());
        tracker.update(None, now);
        assert!(tracker.is_sheltering());
        assert!(!tracker.enter_shelter());

        tracker.update(Some(&route("E1", &["O", "E1"], 0.0, false, true)), now);
        assert!(!tracker.is_sheltering());
        assert!(tracker.current().is_some());

        // Losing the route again is a fresh entry.
        assert!(tracker.enter_shelter());
        assert!(tracker.current().is_none());
    }

    #[test]
    fn test_progress_is_clamped() {
        let mut tracker = RouteTracker::new();
        tracker.set_evacuation_progress(1.7);
        assert_eq!(tracker.evacuation_progress(), 1.0);
        tracker.set_evacuation_progress(-0.2);
        assert_eq!(tracker.evacuation_progress(), 0.0);
    }
}
