//! Bipartite donor → recipient graph of aggregated edges.

pub mod flow_graph;
