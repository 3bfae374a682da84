//! Pure simulation logic for FireWatch.
//!
//! This crate contains the fire hazard model and the evacuation routing that
//! sits on top of it. It does no I/O and owns no timers: the host drives
//! [`simulation::Simulation`] tick by tick and renders whatever it reads back.
//! All randomness comes through a caller-seeded generator, so a run is
//! reproducible from its seed.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`clock`] | Tick counter, simulated time, history sampling |
//! | [`config`] | Step duration, run length, update cadence and validation |
//! | [`danger`] | Per-node danger score and passability threshold |
//! | [`error`] | Topology and setup errors |
//! | [`propagation`] | Four-phase hazard tick (intensify, spread, smoke, occupancy) |
//! | [`risk`] | Path risk evaluation, route selection, change tracking |
//! | [`routing`] | BFS route discovery from origin to each exit |
//! | [`scenario`] | Origin, exits, initial fires, baseline readings |
//! | [`sensor`] | Per-node sensor state, bounds, fire seed profile |
//! | [`simulation`] | Owns the state; advance, reset, read back |
//! | [`stats`] | Floor-wide summary figures |
//! | [`topology`] | Floor plan graph: rooms, corridors, exits |

pub mod clock;
pub mod config;
pub mod danger;
pub mod error;
pub mod propagation;
pub mod risk;
pub mod routing;
pub mod scenario;
pub mod sensor;
pub mod simulation;
pub mod stats;
pub mod topology;
