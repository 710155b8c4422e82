//! Ranking list, stacked area, strip chart and year breakdown for one
//! side of the flows over time.

use crate::aggregate::ranking::{rank, EntityTotal, TopFilter};
use crate::aggregate::rollup::YearMatrix;
use crate::config::ExplorerConfig;
use crate::core::record::{FlowSet, Role};
use crate::scale::mapping::{OpacityScale, OrdinalPalette, NEUTRAL_COLOR, SERIES_PALETTE};
use crate::views::layout::{pie_slices, stack, stack_max, PieChart, StackOffset, StackedLayer};
use serde::{Deserialize, Serialize};

/// Name of the aggregate list item.
pub const ALL_ITEM: &str = "ALL";

/// y-domain used when an absolute stack has nothing in it.
const EMPTY_STACK_MAX: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankItem {
    /// One-based rank; `None` for the aggregate item.
    pub rank: Option<usize>,
    pub name: String,
    pub total: f64,
    /// Bar length relative to the leader, in `[0, 1]`.
    pub share_of_leader: f64,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripCell {
    pub year: i32,
    pub value: f64,
    pub color: String,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripRow {
    pub key: String,
    pub cells: Vec<StripCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineFrame {
    pub mode: Role,
    pub list_label: String,
    pub items: Vec<RankItem>,
    pub focus: Option<String>,
    pub offset: StackOffset,
    pub years: Vec<i32>,
    pub layers: Vec<StackedLayer>,
    pub y_max: f64,
    pub strips: Vec<StripRow>,
    /// Year under the pointer or locked, drawn as a cursor line.
    pub cursor: Option<i32>,
    pub pie: Option<PieChart>,
}

#[derive(Debug, Clone)]
pub struct TimelineView {
    donors: Vec<EntityTotal>,
    recipients: Vec<EntityTotal>,
    records: FlowSet,
    years: Vec<i32>,
    strip_opacity: (f64, f64),
    label_threshold: f64,
}

impl TimelineView {
    pub fn build(set: &FlowSet, config: &ExplorerConfig) -> Self {
        let mut donors = rank(set, Role::Donor);
        donors.truncate(config.top_donors);
        let mut recipients = rank(set, Role::Recipient);
        recipients.truncate(config.top_recipients);

        let filter = TopFilter::from_totals(set, config.top_donors, config.top_recipients);
        let records = filter.apply(set);
        let years = records.year_range();

        Self {
            donors,
            recipients,
            records,
            years,
            strip_opacity: config.strip_opacity,
            label_threshold: config.label_threshold,
        }
    }

    // --- Accessors ---

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn ranking(&self, role: Role) -> &[EntityTotal] {
        match role {
            Role::Donor => &self.donors,
            Role::Recipient => &self.recipients,
        }
    }

    /// Counterparts charted when listing `mode`, in rank order.
    pub fn counterparts(&self, mode: Role) -> Vec<String> {
        self.ranking(mode.counterpart())
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    pub fn palette(&self, mode: Role) -> OrdinalPalette {
        OrdinalPalette::new(self.counterparts(mode), SERIES_PALETTE)
    }

    /// The ranking list, topped by the aggregate item.
    pub fn items(&self, mode: Role, focus: Option<&str>) -> Vec<RankItem> {
        let ranking = self.ranking(mode);
        let leader = ranking.first().map(|e| e.total).unwrap_or(0.0);
        let grand_total: f64 = ranking.iter().map(|e| e.total).sum();

        let mut items = vec![RankItem {
            rank: None,
            name: ALL_ITEM.to_string(),
            total: grand_total,
            share_of_leader: 1.0,
            selected: focus.is_none(),
        }];
        items.extend(ranking.iter().enumerate().map(|(i, e)| RankItem {
            rank: Some(i + 1),
            name: e.name.clone(),
            total: e.total,
            share_of_leader: if leader > 0.0 { e.total / leader } else { 0.0 },
            selected: focus == Some(e.name.as_str()),
        }));
        items
    }

    /// Year × counterpart amounts for `focus`, or for every listed entity.
    pub fn matrix(&self, mode: Role, focus: Option<&str>) -> YearMatrix {
        let counter = mode.counterpart();
        let records = self
            .records
            .records()
            .iter()
            .filter(|r| focus.map_or(true, |name| r.entity(mode) == name));
        YearMatrix::build(
            records,
            &self.years,
            &self.counterparts(mode),
            |r| Some(r.entity(counter)),
        )
    }

    /// Per-counterpart rows; each row scales its opacity to its own
    /// maximum so quiet counterparts stay readable.
    pub fn strips(&self, matrix: &YearMatrix, palette: &OrdinalPalette) -> Vec<StripRow> {
        matrix
            .keys()
            .iter()
            .enumerate()
            .map(|(ki, key)| {
                let scale = OpacityScale::for_row(matrix.column_max(ki), self.strip_opacity);
                let cells = matrix
                    .years()
                    .iter()
                    .enumerate()
                    .map(|(yi, &year)| {
                        let value = matrix.value(yi, ki);
                        if value > 0.0 {
                            StripCell {
                                year,
                                value,
                                color: palette.color_of(key).to_string(),
                                opacity: scale.opacity_of(value),
                            }
                        } else {
                            StripCell {
                                year,
                                value,
                                color: NEUTRAL_COLOR.to_string(),
                                opacity: 1.0,
                            }
                        }
                    })
                    .collect();
                StripRow {
                    key: key.clone(),
                    cells,
                }
            })
            .collect()
    }

    /// Donut of one year's counterparts, in key order.
    pub fn year_pie(&self, matrix: &YearMatrix, palette: &OrdinalPalette, year: i32) -> PieChart {
        let items: Vec<(String, f64)> = match matrix.year_index(year) {
            Some(yi) => matrix
                .keys()
                .iter()
                .cloned()
                .zip(matrix.row(yi).iter().copied())
                .collect(),
            None => Vec::new(),
        };
        match pie_slices(&items, self.label_threshold, |k| {
            palette.color_of(k).to_string()
        }) {
            Some((total, slices)) => PieChart::Slices {
                title: format!("{} Breakdown", year),
                total,
                slices,
            },
            None => PieChart::NoData {
                message: "No Data".to_string(),
            },
        }
    }

    pub fn frame(
        &self,
        mode: Role,
        focus: Option<&str>,
        normalize: bool,
        cursor: Option<i32>,
        pie_year: Option<i32>,
    ) -> TimelineFrame {
        let ranked_focus = focus.filter(|name| self.ranking(mode).iter().any(|e| e.name == *name));
        let matrix = self.matrix(mode, ranked_focus);
        let palette = self.palette(mode);

        let offset = if normalize {
            StackOffset::Expand
        } else {
            StackOffset::None
        };
        let layers = stack(&matrix, offset, |k| palette.color_of(k).to_string());
        let y_max = match offset {
            StackOffset::Expand => 1.0,
            StackOffset::None => {
                let max = stack_max(&layers);
                if max > 0.0 {
                    max
                } else {
                    EMPTY_STACK_MAX
                }
            }
        };

        let list_label = match mode {
            Role::Donor => format!("Top {} Donors", self.donors.len()),
            Role::Recipient => format!("Top {} Recipients", self.recipients.len()),
        };

        TimelineFrame {
            mode,
            list_label,
            items: self.items(mode, ranked_focus),
            focus: ranked_focus.map(str::to_string),
            offset,
            years: self.years.clone(),
            strips: self.strips(&matrix, &palette),
            cursor,
            pie: pie_year.map(|y| self.year_pie(&matrix, &palette, y)),
            layers,
            y_max,
        }
    }
}
