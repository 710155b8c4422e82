//! Geometry shared by the view binders: band positions, pie angles and
//! stacked layers. Nothing here knows about flows.

use crate::aggregate::rollup::YearMatrix;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Evenly spaced bands over a pixel range, one per name, with the same
/// padding inside and outside the bands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandScale {
    domain: Vec<String>,
    range: (f64, f64),
    padding: f64,
}

impl BandScale {
    pub fn new(domain: Vec<String>, range: (f64, f64), padding: f64) -> Self {
        Self {
            domain,
            range,
            padding: padding.clamp(0.0, 1.0),
        }
    }

    /// Distance between the starts of two adjacent bands.
    pub fn step(&self) -> f64 {
        let n = self.domain.len() as f64;
        (self.range.1 - self.range.0) / (n + self.padding).max(1.0)
    }

    pub fn bandwidth(&self) -> f64 {
        self.step() * (1.0 - self.padding)
    }

    /// Start of the band for `name`.
    pub fn position(&self, name: &str) -> Option<f64> {
        let i = self.domain.iter().position(|d| d == name)?;
        let step = self.step();
        Some(self.range.0 + step * self.padding + step * i as f64)
    }

    /// Middle of the band for `name`, where node markers sit.
    pub fn center(&self, name: &str) -> Option<f64> {
        self.position(name).map(|p| p + self.bandwidth() / 2.0)
    }
}

/// One slice of a pie, angles in radians clockwise from twelve o'clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieSlice {
    pub key: String,
    pub value: f64,
    /// Fraction of the pie total.
    pub share: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub color: String,
    /// Whether the slice is large enough to carry a percentage label.
    pub labeled: bool,
}

/// A pie chart, or the reason there is nothing to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PieChart {
    Slices {
        title: String,
        total: f64,
        slices: Vec<PieSlice>,
    },
    NoData {
        message: String,
    },
}

impl PieChart {
    pub fn is_empty(&self) -> bool {
        matches!(self, PieChart::NoData { .. })
    }

    pub fn slices(&self) -> &[PieSlice] {
        match self {
            PieChart::Slices { slices, .. } => slices,
            PieChart::NoData { .. } => &[],
        }
    }
}

/// Lay out `items` as pie slices in the given order. Non-positive values
/// are dropped; `None` when nothing positive remains.
pub fn pie_slices<F>(
    items: &[(String, f64)],
    label_threshold: f64,
    color_of: F,
) -> Option<(f64, Vec<PieSlice>)>
where
    F: Fn(&str) -> String,
{
    let total: f64 = items.iter().filter(|(_, v)| *v > 0.0).map(|(_, v)| v).sum();
    if total <= 0.0 {
        return None;
    }

    let mut angle = 0.0;
    let slices = items
        .iter()
        .filter(|(_, v)| *v > 0.0)
        .map(|(key, value)| {
            let share = value / total;
            let start_angle = angle;
            angle += share * TAU;
            PieSlice {
                key: key.clone(),
                value: *value,
                share,
                start_angle,
                end_angle: angle,
                color: color_of(key),
                labeled: share >= label_threshold,
            }
        })
        .collect();
    Some((total, slices))
}

/// How stacked layers are baselined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackOffset {
    /// Absolute values stacked from zero.
    #[default]
    None,
    /// Each year rescaled so the layers fill `[0, 1]`.
    Expand,
}

/// Lower and upper bound of one layer in one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StackPoint {
    pub year: i32,
    pub y0: f64,
    pub y1: f64,
}

/// One key's band through all the years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackedLayer {
    pub key: String,
    pub color: String,
    pub points: Vec<StackPoint>,
}

/// Stack the matrix columns on top of each other in key order.
///
/// With [`StackOffset::Expand`] a year whose total is zero keeps all its
/// layers at zero.
pub fn stack<F>(matrix: &YearMatrix, offset: StackOffset, color_of: F) -> Vec<StackedLayer>
where
    F: Fn(&str) -> String,
{
    let years = matrix.years();
    let mut layers: Vec<StackedLayer> = matrix
        .keys()
        .iter()
        .map(|key| StackedLayer {
            key: key.clone(),
            color: color_of(key),
            points: Vec::with_capacity(years.len()),
        })
        .collect();

    for (yi, &year) in years.iter().enumerate() {
        let total = matrix.row_total(yi);
        let scale = match offset {
            StackOffset::Expand if total > 0.0 => 1.0 / total,
            _ => 1.0,
        };
        let mut base = 0.0;
        for (ki, layer) in layers.iter_mut().enumerate() {
            let top = base + matrix.value(yi, ki) * scale;
            layer.points.push(StackPoint {
                year,
                y0: base,
                y1: top,
            });
            base = top;
        }
    }
    layers
}

/// Largest upper bound over all layers; the y-domain of an absolute stack.
pub fn stack_max(layers: &[StackedLayer]) -> f64 {
    layers
        .iter()
        .flat_map(|l| l.points.iter().map(|p| p.y1))
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::FlowRecord;
    use approx::assert_relative_eq;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_band_positions() {
        let scale = BandScale::new(names(&["a", "b", "c", "d"]), (0.0, 420.0), 0.2);
        assert_relative_eq!(scale.step(), 100.0, epsilon = 1e-9);
        assert_relative_eq!(scale.bandwidth(), 80.0, epsilon = 1e-9);
        assert_relative_eq!(scale.position("a").unwrap(), 20.0, epsilon = 1e-9);
        assert_relative_eq!(scale.center("d").unwrap(), 360.0, epsilon = 1e-9);
        assert_eq!(scale.position("z"), None);
    }

    #[test]
    fn test_pie_angles_cover_circle() {
        let items = vec![
            ("a".to_string(), 3.0),
            ("b".to_string(), 0.0),
            ("c".to_string(), 1.0),
        ];
        let (total, slices) = pie_slices(&items, 0.3, |_| "#000000".into()).unwrap();
        assert_eq!(total, 4.0);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].start_angle, 0.0);
        assert_relative_eq!(slices[0].end_angle, TAU * 0.75);
        assert_relative_eq!(slices[1].end_angle, TAU, epsilon = 1e-12);
        assert!(slices[0].labeled);
        assert!(!slices[1].labeled);
    }

    #[test]
    fn test_pie_without_positive_values() {
        let items = vec![("a".to_string(), 0.0)];
        assert!(pie_slices(&items, 0.05, |_| String::new()).is_none());
        assert!(pie_slices(&[], 0.05, |_| String::new()).is_none());
    }

    fn matrix() -> YearMatrix {
        let records = vec![
            FlowRecord::new("A", "X", 30.0, 2000),
            FlowRecord::new("A", "Y", 10.0, 2000),
            FlowRecord::new("A", "Y", 5.0, 2002),
        ];
        YearMatrix::build(&records, &[2000, 2001, 2002], &names(&["X", "Y"]), |r| {
            Some(r.recipient())
        })
    }

    #[test]
    fn test_stack_absolute() {
        let layers = stack(&matrix(), StackOffset::None, |_| String::new());
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[1].points[0].y0, 30.0);
        assert_eq!(layers[1].points[0].y1, 40.0);
        assert_eq!(stack_max(&layers), 40.0);
    }

    #[test]
    fn test_stack_expand() {
        let layers = stack(&matrix(), StackOffset::Expand, |_| String::new());
        assert_relative_eq!(layers[0].points[0].y1, 0.75, epsilon = 1e-12);
        assert_relative_eq!(layers[1].points[0].y1, 1.0, epsilon = 1e-12);
        // Empty year stays flat at zero.
        assert_eq!(layers[1].points[1].y1, 0.0);
        assert_relative_eq!(layers[1].points[2].y1, 1.0, epsilon = 1e-12);
    }
}
