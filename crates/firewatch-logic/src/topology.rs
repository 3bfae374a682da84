//! Static floor topology: rooms, corridors, and exits joined by undirected
//! connections.
//!
//! `FloorTopology` holds a pre-built adjacency list. Neighbor order follows
//! the order edges were supplied in, so fire spread and path search iterate
//! deterministically for a given floor plan.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TopologyError;

/// Unique identifier of a floor node (e.g. `"R1"`, `"C4"`, `"EXIT2"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// What a node represents in the building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Room,
    Corridor,
    Exit,
}

/// A location in the floor graph. Never mutated after the topology is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    /// Top-left corner in floor-plan units.
    #[serde(default)]
    pub position: [f32; 2],
    /// Width and height in floor-plan units.
    #[serde(default)]
    pub size: [f32; 2],
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub has_oxygen_cylinder: bool,
}

impl Node {
    /// Convenience constructor for tests and programmatic floor plans.
    pub fn new(id: &str, kind: NodeKind) -> Self {
        Self {
            id: NodeId::from(id),
            name: id.to_string(),
            position: [0.0, 0.0],
            size: [0.0, 0.0],
            kind,
            has_oxygen_cylinder: false,
        }
    }

    pub fn with_oxygen_cylinder(mut self) -> Self {
        self.has_oxygen_cylinder = true;
        self
    }

    pub fn is_exit(&self) -> bool {
        self.kind == NodeKind::Exit
    }
}

/// An undirected connection between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge(pub NodeId, pub NodeId);

impl Edge {
    pub fn new(a: &str, b: &str) -> Self {
        Self(NodeId::from(a), NodeId::from(b))
    }
}

/// Serialized floor plan as supplied by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorPlan {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl FloorPlan {
    pub fn from_json(json: &str) -> Result<Self, TopologyError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn into_topology(self) -> Result<FloorTopology, TopologyError> {
        FloorTopology::new(self.nodes, self.edges)
    }
}

/// Immutable floor graph with index-based adjacency.
#[derive(Debug, Clone)]
pub struct FloorTopology {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index: HashMap<NodeId, usize>,
    /// node index → neighbor indices, in edge-list order
    adj: Vec<Vec<usize>>,
}

impl FloorTopology {
    /// Build a topology, rejecting duplicate ids, dangling edges, and self loops.
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, TopologyError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(TopologyError::DuplicateNode(node.id.clone()));
            }
        }

        let mut adj = vec![Vec::new(); nodes.len()];
        for edge in &edges {
            let Edge(a, b) = edge;
            if a == b {
                return Err(TopologyError::SelfLoop(a.clone()));
            }
            let ia = *index
                .get(a)
                .ok_or_else(|| TopologyError::UnknownEndpoint(a.clone(), b.clone(), a.clone()))?;
            let ib = *index
                .get(b)
                .ok_or_else(|| TopologyError::UnknownEndpoint(a.clone(), b.clone(), b.clone()))?;
            adj[ia].push(ib);
            adj[ib].push(ia);
        }

        Ok(Self {
            nodes,
            edges,
            index,
            adj,
        })
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Neighbor indices of a node, in edge-list order.
    pub fn neighbor_indices(&self, idx: usize) -> &[usize] {
        self.adj.get(idx).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Neighbor ids of a node. Unknown ids have no neighbors.
    pub fn neighbors(&self, id: &str) -> Vec<&NodeId> {
        match self.index_of(id) {
            Some(idx) => self.adj[idx].iter().map(|&n| &self.nodes[n].id).collect(),
            None => Vec::new(),
        }
    }

    /// Ids of all nodes of the given kind, in node-list order.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<&NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.kind == kind)
            .map(|n| &n.id)
            .collect()
    }
}

impl std::borrow::Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
