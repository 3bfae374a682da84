//! Error types for topology construction, configuration, and simulation setup.
//!
//! Hazard updates never fail; every bounded quantity clamps. Errors only
//! arise when the host hands the core something malformed.

use crate::config::ConfigError;
use crate::topology::NodeId;

/// Floor plan construction failure.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),
    #[error("edge ({0}, {1}) references unknown node {2}")]
    UnknownEndpoint(NodeId, NodeId, NodeId),
    #[error("edge connects node {0} to itself")]
    SelfLoop(NodeId),
    #[error("floor plan JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure to accept a simulation setup.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("invalid configuration: {}", describe_config_errors(.0))]
    InvalidConfig(Vec<ConfigError>),
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error("origin node {0} is not in the floor plan")]
    UnknownOrigin(NodeId),
    #[error("exit node {0} is not in the floor plan")]
    UnknownExit(NodeId),
    #[error("scenario lists no exits")]
    NoExits,
    #[error("ignition node {0} is not in the floor plan")]
    UnknownIgnition(NodeId),
    #[error("fire seed for node {0} leaves sensor bounds")]
    SeedOutOfBounds(NodeId),
}

fn describe_config_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
