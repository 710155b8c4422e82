//! One-year slice of the network, stepped through by the year slider or
//! playback, with a history line for the current focus.

use crate::aggregate::ranking::TopFilter;
use crate::aggregate::rollup::{pair_edges, year_series, AggregatedEdge, YearValue};
use crate::config::ExplorerConfig;
use crate::core::record::{FlowSet, Role};
use crate::scale::domain::Domain;
use crate::scale::mapping::WidthScale;
use crate::selection::state::Selection;
use crate::views::layout::BandScale;
use crate::views::network::{edge_endpoints, side_nodes, EdgeView, NodeView, Stroke};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

const EDGE_COLOR: &str = "#999999";
const SELECTED_EDGE_COLOR: &str = "#ff0000";
const EDGE_OPACITY: f64 = 0.5;
const NODE_GAP: f64 = 0.0;

/// History line under the year network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesDetail {
    pub title: String,
    pub points: Vec<YearValue>,
    /// The year currently shown above, marked on the line.
    pub cursor: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearNetworkFrame {
    pub year: i32,
    pub playing: bool,
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
    pub detail: SeriesDetail,
    pub selection: Selection,
}

#[derive(Debug, Clone)]
pub struct YearNetworkView {
    filter: TopFilter,
    records: FlowSet,
    years: Vec<i32>,
    yearly: IndexMap<i32, Vec<AggregatedEdge>>,
    width: WidthScale,
    donor_bands: BandScale,
    recipient_bands: BandScale,
    canvas_width: f64,
    node_radius: f64,
    overview_title: String,
}

impl YearNetworkView {
    pub fn build(set: &FlowSet, config: &ExplorerConfig) -> Self {
        let filter = TopFilter::from_totals(set, config.top_donors, config.top_recipients);
        let records = filter.apply(set);
        let years = records.year_range();

        let yearly: IndexMap<i32, Vec<AggregatedEdge>> = years
            .iter()
            .map(|&year| {
                let edges = pair_edges(records.records().iter().filter(|r| r.year() == year));
                (year, edges)
            })
            .collect();

        // Widths are shared by every year so that steps stay comparable.
        let max = yearly
            .values()
            .flat_map(|edges| edges.iter().map(|e| e.value))
            .fold(0.0, f64::max);
        let domain = Domain::new(0.0, max).unwrap_or(Domain::UNIT);

        let height = (0.0, config.canvas.height);
        Self {
            donor_bands: BandScale::new(filter.donors.to_vec(), height, config.year_band_padding),
            recipient_bands: BandScale::new(
                filter.recipients.to_vec(),
                height,
                config.year_band_padding,
            ),
            overview_title: format!(
                "Total Aid Flow (Top {} Donors to Top {} Recipients)",
                config.top_donors, config.top_recipients
            ),
            filter,
            records,
            years,
            yearly,
            width: WidthScale::new(domain, config.year_width),
            canvas_width: config.canvas.width,
            node_radius: config.node_radius,
        }
    }

    // --- Accessors ---

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn domain(&self) -> Domain {
        self.width.domain()
    }

    /// Aggregated pairs of one year; empty for years without flows.
    pub fn edges_for(&self, year: i32) -> &[AggregatedEdge] {
        self.yearly.get(&year).map(Vec::as_slice).unwrap_or(&[])
    }

    /// History of the selected pair, the selected entity, or everything.
    pub fn series(&self, selection: &Selection, cursor: i32) -> SeriesDetail {
        let (title, points) = if let Some((donor, recipient)) = selection.focused_pair() {
            (
                format!("{} to {} (Historical)", donor, recipient),
                year_series(&self.records, &self.years, |r| {
                    r.donor() == donor && r.recipient() == recipient
                }),
            )
        } else if let Some((name, role)) = selection.focused_entity() {
            let what = match role {
                Role::Donor => "Total Donated",
                Role::Recipient => "Total Received",
            };
            (
                format!("{} ({})", name, what),
                year_series(&self.records, &self.years, |r| r.entity(role) == name),
            )
        } else {
            (
                self.overview_title.clone(),
                year_series(&self.records, &self.years, |_| true),
            )
        };
        SeriesDetail {
            title,
            points,
            cursor,
        }
    }

    pub fn frame(&self, year: i32, playing: bool, selection: &Selection) -> YearNetworkFrame {
        let r = self.node_radius;
        let mut nodes =
            side_nodes(&self.filter.donors, Role::Donor, &self.donor_bands, 0.0, r, false);
        nodes.extend(side_nodes(
            &self.filter.recipients,
            Role::Recipient,
            &self.recipient_bands,
            self.canvas_width,
            r,
            false,
        ));
        if let Some((name, role)) = selection.focused_entity() {
            for node in &mut nodes {
                node.highlighted = node.role == role && node.name == name;
            }
        }

        let selected_pair = selection.focused_pair();
        let edges = self
            .edges_for(year)
            .iter()
            .map(|e| {
                let selected = selected_pair.is_some_and(|(d, rc)| e.connects(d, rc));
                let (x1, y1, x2, y2) = edge_endpoints(
                    self.donor_bands.center(&e.donor).unwrap_or_default(),
                    self.recipient_bands.center(&e.recipient).unwrap_or_default(),
                    self.canvas_width,
                    r,
                    NODE_GAP,
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
                    stroke: Stroke::Solid {
                        color: if selected {
                            SELECTED_EDGE_COLOR
                        } else {
                            EDGE_COLOR
                        }
                        .to_string(),
                    },
                    opacity: if selected { 1.0 } else { EDGE_OPACITY },
                    visible: true,
                }
            })
            .collect();

        YearNetworkFrame {
            year,
            playing,
            nodes,
            edges,
            detail: self.series(selection, year),
            selection: selection.clone(),
        }
    }
}
