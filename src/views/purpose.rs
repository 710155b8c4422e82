//! Purpose breakdown network: each edge painted with the share of every
//! top purpose, plus pair and country pies.

use crate::aggregate::ranking::{refine_by_purpose, PurposeRefinement, TopSet};
use crate::aggregate::rollup::{
    edges_with_purposes, merge_by_key, purpose_edges, AggregatedEdge, PurposeEdge,
};
use crate::config::ExplorerConfig;
use crate::core::record::{FlowSet, Role};
use crate::graph::flow_graph::FlowGraph;
use crate::scale::domain::Domain;
use crate::scale::mapping::{OrdinalPalette, WidthScale, PURPOSE_PALETTE};
use crate::selection::state::{Neighborhood, Selection};
use crate::views::layout::{pie_slices, BandScale, PieChart};
use crate::views::network::{edge_endpoints, side_nodes, EdgeView, GradientStop, NodeView, Stroke};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurposeSwatch {
    pub purpose: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurposeFrame {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
    pub legend: Vec<PurposeSwatch>,
    pub pair_pie: Option<PieChart>,
    pub country_pie: Option<PieChart>,
    pub selection: Selection,
}

#[derive(Debug, Clone)]
pub struct PurposeView {
    refinement: PurposeRefinement,
    donors: TopSet,
    recipients: TopSet,
    rows: Vec<PurposeEdge>,
    edges: Vec<AggregatedEdge>,
    graph: FlowGraph,
    width: WidthScale,
    palette: OrdinalPalette,
    donor_bands: BandScale,
    recipient_bands: BandScale,
    canvas_width: f64,
    node_radius: f64,
    base_opacity: f64,
    highlight_opacity: f64,
    label_threshold: f64,
    scope_label: String,
}

/// Gradient stops laying the purpose shares end to end along an edge.
///
/// Every share gets a pair of stops with the same colour, so the bands
/// have hard edges.
pub fn gradient_stops(edge: &AggregatedEdge, palette: &OrdinalPalette) -> Vec<GradientStop> {
    if edge.value <= 0.0 {
        return Vec::new();
    }
    let mut offset = 0.0;
    let mut stops = Vec::with_capacity(edge.purposes.len() * 2);
    for share in &edge.purposes {
        let next = offset + share.value / edge.value;
        let color = palette.color_of(&share.purpose).to_string();
        stops.push(GradientStop {
            offset,
            color: color.clone(),
        });
        stops.push(GradientStop {
            offset: next,
            color,
        });
        offset = next;
    }
    stops
}

impl PurposeView {
    pub fn build(set: &FlowSet, config: &ExplorerConfig) -> Self {
        let refinement = refine_by_purpose(
            set,
            config.top_donors,
            config.top_recipients,
            config.top_purposes,
        );
        let donors = refinement.donor_order();
        let recipients = refinement.recipient_order();
        let rows = purpose_edges(&refinement.records);
        let edges = edges_with_purposes(&rows);
        let graph = FlowGraph::from_edges(&edges);

        let values: Vec<f64> = edges.iter().map(|e| e.value).collect();
        let palette = OrdinalPalette::new(refinement.purposes.to_vec(), PURPOSE_PALETTE);
        let height = (0.0, config.canvas.height);

        Self {
            donor_bands: BandScale::new(donors.to_vec(), height, config.band_padding),
            recipient_bands: BandScale::new(recipients.to_vec(), height, config.band_padding),
            refinement,
            donors,
            recipients,
            rows,
            edges,
            graph,
            width: WidthScale::new(Domain::extent(&values), config.purpose_width),
            palette,
            canvas_width: config.canvas.width,
            node_radius: config.node_radius,
            base_opacity: config.purpose_base_opacity,
            highlight_opacity: config.highlight_opacity,
            label_threshold: config.label_threshold,
            scope_label: format!("within top-{} purposes", config.top_purposes),
        }
    }

    // --- Accessors ---

    pub fn refinement(&self) -> &PurposeRefinement {
        &self.refinement
    }

    pub fn edges(&self) -> &[AggregatedEdge] {
        &self.edges
    }

    pub fn palette(&self) -> &OrdinalPalette {
        &self.palette
    }

    pub fn edge(&self, donor: &str, recipient: &str) -> Option<&AggregatedEdge> {
        self.edges.iter().find(|e| e.connects(donor, recipient))
    }

    /// Purpose split of a single donor → recipient pair.
    pub fn pair_pie(&self, donor: &str, recipient: &str) -> PieChart {
        let slices = self.edge(donor, recipient).and_then(|edge| {
            let items: Vec<(String, f64)> = edge
                .purposes
                .iter()
                .map(|p| (p.purpose.clone(), p.value))
                .collect();
            pie_slices(&items, self.label_threshold, |k| {
                self.palette.color_of(k).to_string()
            })
        });
        match slices {
            Some((total, slices)) => PieChart::Slices {
                title: format!("{} → {}", donor, recipient),
                total,
                slices,
            },
            None => PieChart::NoData {
                message: format!(
                    "No data for this donor-recipient pair ({}).",
                    self.scope_label
                ),
            },
        }
    }

    /// Purpose split of everything one country gives or receives.
    pub fn country_pie(&self, name: &str, role: Role) -> PieChart {
        let rows: Vec<&PurposeEdge> = self
            .rows
            .iter()
            .filter(|r| match role {
                Role::Donor => r.donor == name,
                Role::Recipient => r.recipient == name,
            })
            .collect();
        let direction = match role {
            Role::Donor => "outgoing",
            Role::Recipient => "incoming",
        };

        let items = merge_by_key(&rows, |r| r.purpose.clone(), |r| r.value);
        match pie_slices(&items, self.label_threshold, |k| {
            self.palette.color_of(k).to_string()
        }) {
            Some((total, slices)) => PieChart::Slices {
                title: format!("{} ({})", name, direction),
                total,
                slices,
            },
            None => PieChart::NoData {
                message: format!("No {} flows ({}).", direction, self.scope_label),
            },
        }
    }

    pub fn legend(&self) -> Vec<PurposeSwatch> {
        self.palette
            .domain()
            .iter()
            .map(|p| PurposeSwatch {
                purpose: p.clone(),
                color: self.palette.color_of(p).to_string(),
            })
            .collect()
    }

    /// Nodes stay on screen under a selection; only the selected entity
    /// and its counterparts are highlighted.
    pub fn frame(
        &self,
        selection: &Selection,
        pair: Option<(&str, &str)>,
        country: Option<(&str, Role)>,
    ) -> PurposeFrame {
        let hood = Neighborhood::of(selection, &self.graph);
        let r = self.node_radius;

        let mut nodes = side_nodes(&self.donors, Role::Donor, &self.donor_bands, 0.0, r, true);
        nodes.extend(side_nodes(
            &self.recipients,
            Role::Recipient,
            &self.recipient_bands,
            self.canvas_width,
            r,
            true,
        ));
        for node in &mut nodes {
            node.highlighted = hood.is_filtered() && hood.is_node_visible(&node.name, node.role);
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
                    width: self.width.width_of(e.value),
                    stroke: Stroke::Gradient {
                        stops: gradient_stops(e, &self.palette),
                    },
                    opacity,
                    visible: hood.is_edge_visible(e),
                }
            })
            .collect();

        PurposeFrame {
            nodes,
            edges,
            legend: self.legend(),
            pair_pie: pair.map(|(d, r)| self.pair_pie(d, r)),
            country_pie: country.map(|(name, role)| self.country_pie(name, role)),
            selection: selection.clone(),
        }
    }
}
