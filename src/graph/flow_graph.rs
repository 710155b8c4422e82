use crate::aggregate::rollup::AggregatedEdge;
use crate::core::record::Role;
use indexmap::IndexSet;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A node of the flow graph. The same country can appear twice, once per
/// role, since the two sides of the network are laid out independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityNode {
    pub name: String,
    pub role: Role,
}

/// Directed bipartite graph of retained aggregated edges.
///
/// Edges always run donor → recipient and carry the aggregated amount.
/// This is what neighborhood queries for entity selection run against.
///
/// # Examples
///
/// ```
/// use aidflow_engine::aggregate::rollup::pair_edges;
/// use aidflow_engine::core::record::{FlowRecord, Role};
/// use aidflow_engine::graph::flow_graph::FlowGraph;
///
/// let flows = vec![
///     FlowRecord::new("A", "X", 100.0, 2020),
///     FlowRecord::new("A", "Y", 50.0, 2020),
///     FlowRecord::new("B", "X", 200.0, 2020),
/// ];
/// let graph = FlowGraph::from_edges(&pair_edges(&flows));
///
/// assert_eq!(graph.node_count(), 4);
/// assert_eq!(graph.neighbors("A", Role::Donor), vec!["X", "Y"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    graph: DiGraph<EntityNode, f64>,
    index: HashMap<(Role, String), NodeIndex>,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from aggregated edges. Repeated pairs accumulate.
    pub fn from_edges(edges: &[AggregatedEdge]) -> Self {
        let mut graph = Self::new();
        for edge in edges {
            graph.add_edge(&edge.donor, &edge.recipient, edge.value);
        }
        graph
    }

    fn node(&mut self, name: &str, role: Role) -> NodeIndex {
        if let Some(&idx) = self.index.get(&(role, name.to_string())) {
            return idx;
        }
        let idx = self.graph.add_node(EntityNode {
            name: name.to_string(),
            role,
        });
        self.index.insert((role, name.to_string()), idx);
        idx
    }

    /// Add `value` to the donor → recipient edge, creating it if needed.
    pub fn add_edge(&mut self, donor: &str, recipient: &str, value: f64) {
        let from = self.node(donor, Role::Donor);
        let to = self.node(recipient, Role::Recipient);
        match self.graph.find_edge(from, to) {
            Some(e) => self.graph[e] += value,
            None => {
                self.graph.add_edge(from, to, value);
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, name: &str, role: Role) -> bool {
        self.index.contains_key(&(role, name.to_string()))
    }

    /// Aggregated donor → recipient amount, zero when not connected.
    pub fn edge_value(&self, donor: &str, recipient: &str) -> f64 {
        let from = self.index.get(&(Role::Donor, donor.to_string()));
        let to = self.index.get(&(Role::Recipient, recipient.to_string()));
        match (from, to) {
            (Some(&from), Some(&to)) => self
                .graph
                .find_edge(from, to)
                .map(|e| self.graph[e])
                .unwrap_or(0.0),
            _ => 0.0,
        }
    }

    fn direction(role: Role) -> Direction {
        match role {
            Role::Donor => Direction::Outgoing,
            Role::Recipient => Direction::Incoming,
        }
    }

    /// Counterparts connected to `name` in `role` through at least one
    /// edge, in edge insertion order. Unknown entities have none.
    pub fn neighbors(&self, name: &str, role: Role) -> Vec<String> {
        let Some(&idx) = self.index.get(&(role, name.to_string())) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Self::direction(role))
            .map(|e| {
                let other = match role {
                    Role::Donor => e.target(),
                    Role::Recipient => e.source(),
                };
                (e.id().index(), self.graph[other].name.clone())
            })
            .collect();
        edges.sort_by_key(|(id, _)| *id);
        edges
            .into_iter()
            .map(|(_, name)| name)
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }
}
