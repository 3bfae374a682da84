//! FireWatch Headless Simulation Harness
//!
//! Runs the fire and evacuation model against a floor plan and validates
//! its invariants. Runs entirely in-process with no UI and no timers.
//!
//! Usage:
//!   cargo run -p firewatch-simtest
//!   cargo run -p firewatch-simtest -- --verbose
//!   cargo run -p firewatch-simtest -- --plan building.json --scenario drill.json --ticks 20 --seed 7

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;

use firewatch_logic::config::{validate_config, SimulationConfig};
use firewatch_logic::danger::{danger_score, is_passable_score};
use firewatch_logic::risk::{find_routes, select_route};
use firewatch_logic::scenario::Scenario;
use firewatch_logic::sensor::{FireSeed, SensorMap};
use firewatch_logic::simulation::{Simulation, TickSummary};
use firewatch_logic::topology::{Edge, FloorPlan, FloorTopology, Node, NodeId, NodeKind};

// ── Sample building (same JSON the tests use) ───────────────────────────
const SAMPLE_PLAN_JSON: &str = include_str!("../../../data/sample_floor_plan.json");
const DEFAULT_SCENARIO_JSON: &str = include_str!("../../../data/default_scenario.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

#[derive(Parser, Debug)]
#[command(name = "firewatch-simtest", about = "Headless FireWatch invariant harness")]
struct Args {
    /// Print every check and per-tick summaries, and show library log output
    #[arg(long)]
    verbose: bool,

    /// Floor plan JSON (defaults to the built-in sample building)
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Scenario JSON (defaults to fire in R2, evacuating R1)
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Ticks to run (defaults to the configured total simulation time)
    #[arg(long)]
    ticks: Option<u64>,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format(|buf, record| writeln!(buf, "  [{}] {}", record.level(), record.args()))
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    println!("=== FireWatch Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Floor plan and scenario
    let setup = load_setup(&args, &mut results);

    if let Some((topology, scenario)) = setup {
        // 2. Full run
        results.extend(validate_run(&topology, &scenario, &args));

        // 3. Reset replays the run
        results.extend(validate_reset(&topology, &scenario, &args));
    }

    // 4. Route selection on synthetic floors
    results.extend(validate_route_selection(args.verbose));

    // 5. Configuration validation
    results.extend(validate_configuration(args.verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Floor plan ───────────────────────────────────────────────────────

fn read_or(path: Option<&Path>, builtin: &str) -> Result<String, String> {
    match path {
        Some(p) => std::fs::read_to_string(p).map_err(|e| format!("{}: {}", p.display(), e)),
        None => Ok(builtin.to_string()),
    }
}

fn load_setup(args: &Args, results: &mut Vec<TestResult>) -> Option<(FloorTopology, Scenario)> {
    println!("--- Floor Plan ---");

    let topology = match read_or(args.plan.as_deref(), SAMPLE_PLAN_JSON)
        .and_then(|json| FloorPlan::from_json(&json).map_err(|e| e.to_string()))
        .and_then(|plan| plan.into_topology().map_err(|e| e.to_string()))
    {
        Ok(t) => t,
        Err(e) => {
            results.push(TestResult {
                name: "plan_parse".into(),
                passed: false,
                detail: e,
            });
            return None;
        }
    };

    let scenario: Scenario = match read_or(args.scenario.as_deref(), DEFAULT_SCENARIO_JSON)
        .and_then(|json| serde_json::from_str(&json).map_err(|e| e.to_string()))
    {
        Ok(s) => s,
        Err(e) => {
            results.push(TestResult {
                name: "scenario_parse".into(),
                passed: false,
                detail: e,
            });
            return None;
        }
    };

    let exit_count = topology.nodes_of_kind(NodeKind::Exit).len();
    results.push(TestResult {
        name: "plan_has_exits".into(),
        passed: exit_count > 0,
        detail: format!(
            "{} nodes, {} connections, {} exits",
            topology.len(),
            topology.edges().len(),
            exit_count
        ),
    });

    let sensors = SensorMap::benign(&topology);
    let routes = find_routes(&topology, &sensors, scenario.origin.as_str(), &scenario.exits);
    results.push(TestResult {
        name: "exits_reachable".into(),
        passed: routes.len() == scenario.exits.len(),
        detail: format!(
            "{}/{} exits reachable from {}",
            routes.len(),
            scenario.exits.len(),
            scenario.origin
        ),
    });

    if args.verbose {
        for r in &routes {
            println!(
                "  {} via {}",
                r.exit,
                r.path
                    .iter()
                    .map(|id| id.as_str())
                    .collect::<Vec<_>>()
                    .join(" → ")
            );
        }
    }

    Some((topology, scenario))
}

// ── 2. Full run ─────────────────────────────────────────────────────────

fn tick_count(args: &Args, config: &SimulationConfig) -> u64 {
    args.ticks.unwrap_or_else(|| {
        (config.total_simulation_time / config.step_duration).ceil() as u64
    })
}

fn run(sim: &mut Simulation, ticks: u64) -> Vec<TickSummary> {
    (0..ticks).map(|_| sim.advance_tick(Instant::now())).collect()
}

fn validate_run(topology: &FloorTopology, scenario: &Scenario, args: &Args) -> Vec<TestResult> {
    println!("--- Simulation Run ---");
    let mut results = Vec::new();

    let config = SimulationConfig::default();
    let mut sim = match Simulation::new(topology.clone(), scenario.clone(), config, args.seed) {
        Ok(s) => s,
        Err(e) => {
            results.push(TestResult {
                name: "simulation_setup".into(),
                passed: false,
                detail: e.to_string(),
            });
            return results;
        }
    };

    let ticks = tick_count(args, &config);
    let mut out_of_bounds = Vec::new();
    let mut extinguished = Vec::new();
    let mut disagreements = 0;
    let mut route_changes = 0;

    for _ in 0..ticks {
        let before: Vec<bool> = sim.sensors().iter().map(|s| s.fire_detected).collect();
        let summary = sim.advance_tick(Instant::now());

        if !sim.sensors().all_within_bounds(sim.topology()) {
            out_of_bounds.push(summary.time_step);
        }
        for (node, (was, now)) in sim
            .topology()
            .nodes()
            .iter()
            .zip(before.iter().zip(sim.sensors().iter()))
        {
            if *was && !now.fire_detected {
                extinguished.push(format!("{}@{}", node.id, summary.time_step));
            }
        }
        for route in sim.routes() {
            let all_clear = route.path.iter().all(|id| {
                sim.sensors()
                    .by_id(sim.topology(), id.as_str())
                    .map(|s| is_passable_score(danger_score(s)))
                    .unwrap_or(true)
            });
            if all_clear != route.risk.passable {
                disagreements += 1;
            }
        }
        if summary.route_changed {
            route_changes += 1;
        }

        if args.verbose {
            println!(
                "  tick {:>3} t={:>5.0}s fires={:>2} ignited=[{}] exit={}{}",
                summary.time_step,
                summary.simulation_time,
                summary.fire_count,
                summary
                    .ignited
                    .iter()
                    .map(|id| id.as_str())
                    .collect::<Vec<_>>()
                    .join(","),
                summary
                    .recommended_exit
                    .as_ref()
                    .map(|id| id.as_str())
                    .unwrap_or("SHELTER"),
                if summary.route_changed { " (changed)" } else { "" }
            );
        }
    }

    results.push(TestResult {
        name: "sensors_within_bounds".into(),
        passed: out_of_bounds.is_empty(),
        detail: if out_of_bounds.is_empty() {
            format!("{} ticks, all nodes in bounds", ticks)
        } else {
            format!("out of bounds at ticks {:?}", out_of_bounds)
        },
    });

    results.push(TestResult {
        name: "fires_never_go_out".into(),
        passed: extinguished.is_empty(),
        detail: if extinguished.is_empty() {
            format!("{} nodes burning at end", sim.sensors().fire_count())
        } else {
            format!("extinguished: {}", extinguished.join(", "))
        },
    });

    results.push(TestResult {
        name: "passability_agrees_with_scores".into(),
        passed: disagreements == 0,
        detail: format!("{} disagreements", disagreements),
    });

    let history_len = sim.history().len();
    results.push(TestResult {
        name: "history_bounded".into(),
        passed: history_len <= 12,
        detail: format!("{} samples", history_len),
    });

    let stats = sim.statistics();
    results.push(TestResult {
        name: "final_statistics".into(),
        passed: stats.total_nodes == sim.topology().len(),
        detail: format!(
            "fires={} blocked={} avg_danger={:.1} occupancy={:.2} high_co={} routes={}/{} route_changes={}",
            stats.nodes_on_fire,
            stats.blocked_nodes,
            stats.avg_danger,
            stats.total_occupancy,
            stats.high_co_nodes,
            stats.passable_routes,
            stats.total_routes,
            route_changes
        ),
    });

    results
}

// ── 3. Reset ────────────────────────────────────────────────────────────

fn validate_reset(topology: &FloorTopology, scenario: &Scenario, args: &Args) -> Vec<TestResult> {
    println!("--- Reset ---");
    let mut results = Vec::new();

    let config = SimulationConfig::default();
    let Ok(mut sim) = Simulation::new(topology.clone(), scenario.clone(), config, args.seed) else {
        // Setup failure is already reported by the run section.
        return results;
    };

    let initial = sim.sensors().clone();
    let ticks = tick_count(args, &config);
    let first = run(&mut sim, ticks);
    let first_end = sim.sensors().clone();

    sim.reset();
    let restored = sim.sensors() == &initial && sim.time_step() == 0 && sim.history().is_empty();
    results.push(TestResult {
        name: "reset_restores_initial_state".into(),
        passed: restored,
        detail: format!("seed {}", args.seed),
    });

    let second = run(&mut sim, ticks);
    results.push(TestResult {
        name: "reset_replays_identically".into(),
        passed: first == second && sim.sensors() == &first_end,
        detail: format!("{} ticks replayed", ticks),
    });

    results
}

// ── 4. Route selection ──────────────────────────────────────────────────

fn validate_route_selection(verbose: bool) -> Vec<TestResult> {
    println!("--- Route Selection ---");
    let mut results = Vec::new();

    // R1 - C1 - EXIT1, nothing burning
    let chain = FloorTopology::new(
        vec![
            Node::new("R1", NodeKind::Room),
            Node::new("C1", NodeKind::Corridor),
            Node::new("EXIT1", NodeKind::Exit),
        ],
        vec![Edge::new("R1", "C1"), Edge::new("C1", "EXIT1")],
    );
    match chain {
        Ok(topo) => {
            let sensors = SensorMap::benign(&topo);
            let routes = find_routes(&topo, &sensors, "R1", &[NodeId::from("EXIT1")]);
            let best = select_route(&routes);
            let passed = routes.len() == 1
                && best.is_some_and(|r| r.risk.passable && r.path.len() == 3);
            results.push(TestResult {
                name: "clear_chain_route".into(),
                passed,
                detail: format!("{} routes found", routes.len()),
            });
        }
        Err(e) => results.push(TestResult {
            name: "clear_chain_route".into(),
            passed: false,
            detail: e.to_string(),
        }),
    }

    // Short path through a fire vs. a longer clean one
    let fork = FloorTopology::new(
        vec![
            Node::new("R1", NodeKind::Room),
            Node::new("C1", NodeKind::Corridor),
            Node::new("EXIT1", NodeKind::Exit),
            Node::new("C2", NodeKind::Corridor),
            Node::new("C3", NodeKind::Corridor),
            Node::new("EXIT2", NodeKind::Exit),
        ],
        vec![
            Edge::new("R1", "C1"),
            Edge::new("C1", "EXIT1"),
            Edge::new("R1", "C2"),
            Edge::new("C2", "C3"),
            Edge::new("C3", "EXIT2"),
        ],
    );
    match fork {
        Ok(topo) => {
            let mut sensors = SensorMap::benign(&topo);
            if let Some(c1) = sensors.by_id_mut(&topo, "C1") {
                FireSeed::default().apply(c1);
            }
            let exits = [NodeId::from("EXIT1"), NodeId::from("EXIT2")];
            let routes = find_routes(&topo, &sensors, "R1", &exits);
            let best = select_route(&routes);
            if verbose {
                for r in &routes {
                    println!(
                        "  {} avg={:.1} max={:.1} passable={}",
                        r.exit, r.risk.avg_danger, r.risk.max_danger, r.risk.passable
                    );
                }
            }
            results.push(TestResult {
                name: "clean_route_preferred".into(),
                passed: best.is_some_and(|r| r.exit.as_str() == "EXIT2" && r.path.len() == 4),
                detail: format!(
                    "recommended {}",
                    best.map(|r| r.exit.as_str()).unwrap_or("none")
                ),
            });
        }
        Err(e) => results.push(TestResult {
            name: "clean_route_preferred".into(),
            passed: false,
            detail: e.to_string(),
        }),
    }

    results
}

// ── 5. Configuration ────────────────────────────────────────────────────

fn validate_configuration(_verbose: bool) -> Vec<TestResult> {
    println!("--- Configuration ---");
    let mut results = Vec::new();

    let default = SimulationConfig::default();
    results.push(TestResult {
        name: "default_config_valid".into(),
        passed: validate_config(&default).is_empty(),
        detail: format!(
            "step={}s total={}s interval={}ms",
            default.step_duration,
            default.total_simulation_time,
            default.effective_interval_ms()
        ),
    });

    let broken = SimulationConfig {
        step_duration: 0.0,
        total_simulation_time: -5.0,
        update_interval_ms: 0,
        speed_multiplier: f32::NAN,
    };
    let errors = validate_config(&broken);
    results.push(TestResult {
        name: "invalid_config_rejected".into(),
        passed: errors.len() == 4,
        detail: errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; "),
    });

    let fast = SimulationConfig {
        speed_multiplier: 4.0,
        ..default
    };
    results.push(TestResult {
        name: "speed_scales_interval_only".into(),
        passed: fast.effective_interval_ms() == 500 && fast.step_duration == default.step_duration,
        detail: format!("4x → {}ms", fast.effective_interval_ms()),
    });

    results
}
