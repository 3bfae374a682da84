//! Route discovery: shortest hop-count paths from an origin to each exit.
//!
//! Plain BFS over the floor topology. Hazard plays no part in the search;
//! paths are scored only after they are fixed (see [`crate::risk`]).

use std::collections::VecDeque;

use crate::topology::{FloorTopology, NodeId};

/// Find the shortest path from `origin` to `exit`, both ends included.
///
/// Returns `Some(vec![origin])` when origin and exit coincide and `None`
/// when the exit is unreachable or either id is unknown.
pub fn find_path(topology: &FloorTopology, origin: &str, exit: &str) -> Option<Vec<NodeId>> {
    let start = topology.index_of(origin)?;
    let goal = topology.index_of(exit)?;
    let path = bfs(topology, start, goal)?;
    Some(path.into_iter().map(|i| topology.node(i).id.clone()).collect())
}

/// One path per reachable exit, in the order the exits were given.
pub fn discover_paths(
    topology: &FloorTopology,
    origin: &str,
    exits: &[NodeId],
) -> Vec<(NodeId, Vec<NodeId>)> {
    exits
        .iter()
        .filter_map(|exit| find_path(topology, origin, exit.as_str()).map(|p| (exit.clone(), p)))
        .collect()
}

fn bfs(topology: &FloorTopology, start: usize, goal: usize) -> Option<Vec<usize>> {
    let mut visited = vec![false; topology.len()];
    let mut queue: VecDeque<Vec<usize>> = VecDeque::new();
    visited[start] = true;
    queue.push_back(vec![start]);

    while let Some(path) = queue.pop_front() {
        let current = *path.last()?;
        if current == goal {
            return Some(path);
        }
        for &next in topology.neighbor_indices(current) {
            if !visited[next] {
                visited[next] = true;
                let mut new_path = path.clone();
                new_path.push(next);
                queue.push_back(new_path);
            }
        }
    }

    None
}
