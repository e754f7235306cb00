//! Reachability over the workflow graph.
//!
//! The graph may contain cycles, self-loops and duplicate edges; both walks
//! keep a visited set and an explicit stack, so they terminate in
//! O(V + E) and never recurse.
//!
//! A start node is part of its own result only when some path through at
//! least one edge leads back to it.

use std::collections::{HashMap, HashSet};

use crate::models::WorkflowEdge;

/// Every node `u` with a path `u → … → node_id` (the ancestors of `node_id`).
///
/// Unknown ids and nodes without incoming edges yield an empty set.
pub fn compute_upstream_ids(node_id: &str, edges: &[WorkflowEdge]) -> HashSet<String> {
    // target → sources
    let mut incoming: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges {
        incoming
            .entry(edge.target.as_str())
            .or_default()
            .push(edge.source.as_str());
    }
    walk(node_id, &incoming)
}

/// Every node `d` with a path `node_id → … → d` (the descendants of `node_id`).
pub fn compute_downstream_ids(node_id: &str, edges: &[WorkflowEdge]) -> HashSet<String> {
    // source → targets
    let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges {
        outgoing
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
    }
    walk(node_id, &outgoing)
}

/// The start node is not pre-marked as visited: it only enters the result
/// if a neighbour list leads back to it.
fn walk(start: &str, adjacency: &HashMap<&str, Vec<&str>>) -> HashSet<String> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = vec![start];

    while let Some(current) = stack.pop() {
        let Some(neighbours) = adjacency.get(current) else {
            continue;
        };
        for &neighbour in neighbours {
            if visited.insert(neighbour) {
                stack.push(neighbour);
            }
        }
    }

    visited.into_iter().map(str::to_owned).collect()
}
