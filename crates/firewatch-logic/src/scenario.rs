//! Evacuation scenario: who is evacuating from where, to which exits, and
//! where the fire starts.

use serde::{Deserialize, Serialize};

use crate::sensor::FireSeed;
use crate::topology::{FloorTopology, NodeId, NodeKind};

/// How sensors are initialized before ignition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Baseline {
    /// Randomized ambient readings (faint smoke, 20–25 °C, partial occupancy).
    #[default]
    Ambient,
    /// Every node at benign defaults and empty.
    Benign,
}

/// A node burning from the first tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ignition {
    pub node: NodeId,
    #[serde(default)]
    pub seed: FireSeed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Where the evacuee starts.
    pub origin: NodeId,
    /// Candidate exits, in preference order for ties.
    pub exits: Vec<NodeId>,
    #[serde(default)]
    pub ignitions: Vec<Ignition>,
    #[serde(default)]
    pub baseline: Baseline,
}

impl Scenario {
    /// Evacuate from `origin` to every exit-type node, in floor-plan order.
    pub fn all_exits(origin: &str, topology: &FloorTopology) -> Self {
        Self {
            origin: NodeId::from(origin),
            exits: topology
                .nodes_of_kind(NodeKind::Exit)
                .into_iter()
                .cloned()
                .collect(),
            ignitions: Vec::new(),
            baseline: Baseline::Ambient,
        }
    }

    /// Add a fire starting at `node` with the default seed profile.
    pub fn with_fire(mut self, node: &str) -> Self {
        self.ignitions.push(Ignition {
            node: NodeId::from(node),
            seed: FireSeed::default(),
        });
        self
    }

    pub fn with_baseline(mut self, baseline: Baseline) -> Self {
        self.baseline = baseline;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{Edge, Node};

    #[test]
    fn test_all_exits_in_plan_order() {
        let topo = FloorTopology::new(
            vec![
                Node::new("EXIT2", NodeKind::Exit),
                Node::new("R1", NodeKind::Room),
                Node::new("EXIT1", NodeKind::Exit),
            ],
            vec![Edge::new("R1", "EXIT1"), Edge::new("R1", "EXIT2")],
        )
        .unwrap();
        let scenario = Scenario::all_exits("R1", &topo).with_fire("R1");
        let exits: Vec<&str> = scenario.exits.iter().map(|e| e.as_str()).collect();
        assert_eq!(exits, vec!["EXIT2", "EXIT1"]);
        assert_eq!(scenario.ignitions.len(), 1);
        assert_eq!(scenario.baseline, Baseline::Ambient);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let scenario: Scenario = serde_json::from_str(
            r#"{"origin": "R1", "exits": ["EXIT1"], "ignitions": [{"node": "R2"}]}"#,
        )
        .unwrap();
        assert_eq!(scenario.ignitions[0].seed, FireSeed::default());
        assert_eq!(scenario.baseline, Baseline::Ambient);
    }
}
