//! Top donors × top recipients network with quantile-clamped edge scales.

use crate::aggregate::ranking::{TopFilter, TopSet};
use crate::aggregate::rollup::{pair_edges, AggregatedEdge};
use crate::config::ExplorerConfig;
use crate::core::record::{FlowSet, Role};
use crate::graph::flow_graph::FlowGraph;
use crate::scale::domain::{quantile_domain, Domain};
use crate::scale::mapping::{ColorScale, WidthScale};
use crate::selection::state::{Neighborhood, Selection};
use crate::views::layout::BandScale;
use log::debug;
use serde::{Deserialize, Serialize};

/// A node marker with its label and placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub name: String,
    pub role: Role,
    /// One-based rank position within its side.
    pub rank: usize,
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub visible: bool,
    pub highlighted: bool,
}

/// A stop of a piecewise-constant edge gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Position along the edge, 0 at the donor end.
    pub offset: f64,
    pub color: String,
}

/// How an edge is painted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stroke {
    Solid { color: String },
    Gradient { stops: Vec<GradientStop> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeView {
    pub donor: String,
    pub recipient: String,
    pub value: f64,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub width: f64,
    pub stroke: Stroke,
    pub opacity: f64,
    pub visible: bool,
}

/// One sample line of the edge legend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub value: f64,
    pub width: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailBar {
    pub name: String,
    pub value: f64,
}

/// Per-entity breakdown under the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Detail {
    Bars { title: String, bars: Vec<DetailBar> },
    NoData { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkFrame {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
    pub legend: Vec<LegendEntry>,
    pub detail: Option<Detail>,
    pub selection: Selection,
}

/// Node markers for one side, in rank order.
pub(crate) fn side_nodes(
    top: &TopSet,
    role: Role,
    bands: &BandScale,
    x: f64,
    radius: f64,
    labeled_rank: bool,
) -> Vec<NodeView> {
    top.names()
        .enumerate()
        .map(|(i, name)| NodeView {
            name: name.to_string(),
            role,
            rank: i + 1,
            label: if labeled_rank {
                format!("#{} {}", i + 1, name)
            } else {
                name.to_string()
            },
            x,
            y: bands.center(name).unwrap_or_default(),
            radius,
            visible: true,
            highlighted: false,
        })
        .collect()
}

/// Endpoints of the line from a donor marker to a recipient marker,
/// stopped short of both circles.
pub(crate) fn edge_endpoints(
    donor_y: f64,
    recipient_y: f64,
    canvas_width: f64,
    radius: f64,
    gap: f64,
) -> (f64, f64, f64, f64) {
    (radius + gap, donor_y, canvas_width - radius - gap, recipient_y)
}

/// Static derivation for the overview network.
#[derive(Debug, Clone)]
pub struct NetworkView {
    filter: TopFilter,
    edges: Vec<AggregatedEdge>,
    graph: FlowGraph,
    width: WidthScale,
    color: ColorScale,
    donor_bands: BandScale,
    recipient_bands: BandScale,
    canvas_width: f64,
    node_radius: f64,
    base_opacity: f64,
    highlight_opacity: f64,
    subset_label: String,
}

impl NetworkView {
    pub fn build(set: &FlowSet, config: &ExplorerConfig) -> Self {
        let filter = TopFilter::from_totals(set, config.top_donors, config.top_recipients);
        let edges = pair_edges(&filter.apply(set));
        let graph = FlowGraph::from_edges(&edges);

        let values: Vec<f64> = edges.iter().map(|e| e.value).collect();
        let domain = quantile_domain(&values, config.low_quantile, config.high_quantile);
        debug!(
            "network: {} edges, domain [{}, {}]",
            edges.len(),
            domain.lo(),
            domain.hi()
        );

        let height = (0.0, config.canvas.height);
        Self {
            donor_bands: BandScale::new(filter.donors.to_vec(), height, config.band_padding),
            recipient_bands: BandScale::new(
                filter.recipients.to_vec(),
                height,
                config.band_padding,
            ),
            filter,
            edges,
            graph,
            width: WidthScale::new(domain, config.network_width),
            color: ColorScale::new(domain, config.color_range),
            canvas_width: config.canvas.width,
            node_radius: config.node_radius,
            base_opacity: config.base_opacity,
            highlight_opacity: config.highlight_opacity,
            subset_label: format!("top-{}/top-{}", config.top_donors, config.top_recipients),
        }
    }

    // --- Accessors ---

    pub fn filter(&self) -> &TopFilter {
        &self.filter
    }

    pub fn edges(&self) -> &[AggregatedEdge] {
        &self.edges
    }

    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    pub fn domain(&self) -> Domain {
        self.width.domain()
    }

    pub fn width_of(&self, value: f64) -> f64 {
        self.width.width_of(value)
    }

    pub fn color_of(&self, value: f64) -> String {
        self.color.color_of(value).to_hex()
    }

    /// Small, medium and large sample edges at the domain bounds and
    /// midpoint.
    pub fn legend(&self) -> Vec<LegendEntry> {
        let domain = self.domain();
        [
            ("small", domain.lo()),
            ("medium", domain.midpoint()),
            ("large", domain.hi()),
        ]
        .into_iter()
        .map(|(label, value)| LegendEntry {
            label: label.to_string(),
            value,
            width: self.width_of(value),
            color: self.color_of(value),
        })
        .collect()
    }

    /// The counterparts of an entity within the retained edges, largest
    /// first.
    pub fn detail(&self, name: &str, role: Role) -> Detail {
        let mut bars: Vec<DetailBar> = self
            .graph
            .neighbors(name, role)
            .into_iter()
            .map(|other| {
                let value = match role {
                    Role::Donor => self.graph.edge_value(name, &other),
                    Role::Recipient => self.graph.edge_value(&other, name),
                };
                DetailBar { name: other, value }
            })
            .collect();
        if bars.is_empty() {
            return Detail::NoData {
                message: format!(
                    "{} has no flows in the filtered {} subset.",
                    name, self.subset_label
                ),
            };
        }
        bars.sort_by(|a, b| b.value.total_cmp(&a.value));

        let title = match role {
            Role::Donor => format!("Donor: {} → recipients (by total commitment amount)", name),
            Role::Recipient => format!("Recipient: {} ← donors (by total commitment amount)", name),
        };
        Detail::Bars { title, bars }
    }

    pub fn frame(&self, selection: &Selection) -> NetworkFrame {
        let hood = Neighborhood::of(selection, &self.graph);
        let r = self.node_radius;

        let mut nodes = side_nodes(&self.filter.donors, Role::Donor, &self.donor_bands, 0.0, r, true);
        nodes.extend(side_nodes(
            &self.filter.recipients,
            Role::Recipient,
            &self.recipient_bands,
            self.canvas_width,
            r,
            true,
        ));
        for node in &mut nodes {
            node.visible = hood.is_node_visible(&node.name, node.role);
            node.highlighted = hood.is_filtered() && node.visible;
        }

        let opacity = if hood.is_filtered() {
            self.highlight_opacity
        } else {
            self.base_opacity
        };
        let edges = self
            .edges
            .iter()
            .map(|e| {
                let (x1, y1, x2, y2) = edge_endpoints(
                    self.donor_bands.center(&e.donor).unwrap_or_default(),
                    self.recipient_bands.center(&e.recipient).unwrap_or_default(),
                    self.canvas_width,
                    r,
                    4.0,
                );
                EdgeView {
                    donor: e.donor.clone(),
                    recipient: e.recipient.clone(),
                    value: e.value,
                    x1,
                    y1,
                    x2,
                    y2,
                    width: self.width_of(e.value),
                    stroke: Stroke::Solid {
                        color: self.color_of(e.value),
                    },
                    opacity,
                    visible: hood.is_edge_visible(e),
                }
            })
            .collect();

        let detail = selection
            .focused_entity()
            .map(|(name, role)| self.detail(name, role));

        NetworkFrame {
            nodes,
            edges,
            legend: self.legend(),
            detail,
            selection: selection.clone(),
        }
    }
}
