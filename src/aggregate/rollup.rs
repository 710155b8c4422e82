use crate::core::record::{FlowRecord, Role};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// A field a rollup can group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyField {
    Donor,
    Recipient,
    Purpose,
    Year,
}

impl KeyField {
    /// Extract this field's value from a record. Untagged records have no
    /// purpose key and are skipped by purpose rollups.
    pub fn extract(self, record: &FlowRecord) -> Option<KeyValue> {
        match self {
            KeyField::Donor => Some(KeyValue::Name(record.donor().to_string())),
            KeyField::Recipient => Some(KeyValue::Name(record.recipient().to_string())),
            KeyField::Purpose => record.purpose().map(|p| KeyValue::Name(p.to_string())),
            KeyField::Year => Some(KeyValue::Year(record.year())),
        }
    }
}

impl From<Role> for KeyField {
    fn from(role: Role) -> Self {
        match role {
            Role::Donor => KeyField::Donor,
            Role::Recipient => KeyField::Recipient,
        }
    }
}

/// One grouping key value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    Name(String),
    Year(i32),
}

impl KeyValue {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            KeyValue::Name(name) => Some(name),
            KeyValue::Year(_) => None,
        }
    }
}

impl From<&str> for KeyValue {
    fn from(s: &str) -> Self {
        KeyValue::Name(s.to_string())
    }
}

impl From<i32> for KeyValue {
    fn from(year: i32) -> Self {
        KeyValue::Year(year)
    }
}

/// A node of a nested rollup: the subtotal at this level plus children
/// keyed by the next field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RollupNode {
    pub total: f64,
    pub children: IndexMap<KeyValue, RollupNode>,
}

/// A leaf of the flattened rollup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollupRow {
    pub keys: Vec<KeyValue>,
    pub value: f64,
}

/// Multi-key grouped sum of record amounts.
///
/// Groups appear in first-encounter order at every level, so a fixed
/// input always produces the same nesting and the same flat row order.
///
/// # Examples
///
/// ```
/// use aidflow_engine::aggregate::rollup::{rollup, KeyField, KeyValue};
/// use aidflow_engine::core::record::FlowRecord;
///
/// let flows = vec![
///     FlowRecord::new("A", "X", 100.0, 2020),
///     FlowRecord::new("A", "X", 25.0, 2021),
/// ];
/// let table = rollup(&flows, &[KeyField::Donor, KeyField::Recipient]);
/// assert_eq!(table.get(&["A".into(), "X".into()]), Some(125.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rollup {
    keys: Vec<KeyField>,
    root: RollupNode,
}

impl Rollup {
    pub fn keys(&self) -> &[KeyField] {
        &self.keys
    }

    /// Grand total over every grouped record.
    pub fn total(&self) -> f64 {
        self.root.total
    }

    /// Subtotal at a key path. A shorter path yields the subtotal of that
    /// branch.
    pub fn get(&self, path: &[KeyValue]) -> Option<f64> {
        let mut node = &self.root;
        for key in path {
            node = node.children.get(key)?;
        }
        Some(node.total)
    }

    /// Leaf rows in nested first-encounter order.
    pub fn flatten(&self) -> Vec<RollupRow> {
        let mut rows = Vec::new();
        let mut path = Vec::with_capacity(self.keys.len());
        flatten_into(&self.root, &mut path, &mut rows);
        rows
    }
}

fn flatten_into(node: &RollupNode, path: &mut Vec<KeyValue>, rows: &mut Vec<RollupRow>) {
    if node.children.is_empty() {
        if !path.is_empty() {
            rows.push(RollupRow {
                keys: path.clone(),
                value: node.total,
            });
        }
        return;
    }
    for (key, child) in &node.children {
        path.push(key.clone());
        flatten_into(child, path, rows);
        path.pop();
    }
}

/// Group records by `keys` in order and sum amounts.
///
/// # Panics
///
/// Panics if `keys` is empty.
pub fn rollup<'a, I>(records: I, keys: &[KeyField]) -> Rollup
where
    I: IntoIterator<Item = &'a FlowRecord>,
{
    assert!(!keys.is_empty(), "rollup needs at least one key field");

    let mut root = RollupNode::default();
    'records: for record in records {
        let mut path = Vec::with_capacity(keys.len());
        for field in keys {
            match field.extract(record) {
                Some(value) => path.push(value),
                None => continue 'records,
            }
        }

        let amount = record.amount();
        root.total += amount;
        let mut node = &mut root;
        for key in path {
            node = node.children.entry(key).or_default();
            node.total += amount;
        }
    }

    Rollup {
        keys: keys.to_vec(),
        root,
    }
}

/// Collapse entries sharing a key into one summed entry, sorted by
/// descending value. Ties keep first-encounter order.
pub fn merge_by_key<T, K, F, V>(entries: &[T], key_of: F, value_of: V) -> Vec<(K, f64)>
where
    K: Hash + Eq,
    F: Fn(&T) -> K,
    V: Fn(&T) -> f64,
{
    let mut merged: IndexMap<K, f64> = IndexMap::new();
    for entry in entries {
        *merged.entry(key_of(entry)).or_insert(0.0) += value_of(entry);
    }
    let mut out: Vec<(K, f64)> = merged.into_iter().collect();
    out.sort_by(|a, b| b.1.total_cmp(&a.1));
    out
}

/// One purpose's share of an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurposeShare {
    pub purpose: String,
    pub value: f64,
}

/// A (donor, recipient) rollup row, optionally broken down by purpose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedEdge {
    pub donor: String,
    pub recipient: String,
    pub value: f64,
    /// Descending by value. When non-empty, sums to `value`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub purposes: Vec<PurposeShare>,
}

impl AggregatedEdge {
    pub fn entity(&self, role: Role) -> &str {
        match role {
            Role::Donor => &self.donor,
            Role::Recipient => &self.recipient,
        }
    }

    pub fn connects(&self, donor: &str, recipient: &str) -> bool {
        self.donor == donor && self.recipient == recipient
    }

    /// Sum of the purpose breakdown.
    pub fn purpose_total(&self) -> f64 {
        self.purposes.iter().map(|p| p.value).sum()
    }
}

/// A (donor, recipient, purpose) rollup row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurposeEdge {
    pub donor: String,
    pub recipient: String,
    pub purpose: String,
    pub value: f64,
}

fn name_at(row: &RollupRow, i: usize) -> String {
    row.keys
        .get(i)
        .and_then(KeyValue::as_name)
        .unwrap_or_default()
        .to_string()
}

/// Sum amounts per (donor, recipient) pair.
pub fn pair_edges<'a, I>(records: I) -> Vec<AggregatedEdge>
where
    I: IntoIterator<Item = &'a FlowRecord>,
{
    rollup(records, &[KeyField::Donor, KeyField::Recipient])
        .flatten()
        .into_iter()
        .map(|row| AggregatedEdge {
            donor: name_at(&row, 0),
            recipient: name_at(&row, 1),
            value: row.value,
            purposes: Vec::new(),
        })
        .collect()
}

/// Sum amounts per (donor, recipient, purpose).
pub fn purpose_edges<'a, I>(records: I) -> Vec<PurposeEdge>
where
    I: IntoIterator<Item = &'a FlowRecord>,
{
    rollup(
        records,
        &[KeyField::Donor, KeyField::Recipient, KeyField::Purpose],
    )
    .flatten()
    .into_iter()
    .map(|row| PurposeEdge {
        donor: name_at(&row, 0),
        recipient: name_at(&row, 1),
        purpose: name_at(&row, 2),
        value: row.value,
    })
    .collect()
}

/// Fold purpose rows into one edge per pair.
///
/// Repeated purposes are merged, the breakdown is sorted descending, and
/// the edge value is summed from that same breakdown so the two agree
/// exactly.
pub fn edges_with_purposes(rows: &[PurposeEdge]) -> Vec<AggregatedEdge> {
    let mut pairs: IndexMap<(&str, &str), Vec<&PurposeEdge>> = IndexMap::new();
    for row in rows {
        pairs
            .entry((row.donor.as_str(), row.recipient.as_str()))
            .or_default()
            .push(row);
    }

    pairs
        .into_iter()
        .map(|((donor, recipient), group)| {
            let purposes: Vec<PurposeShare> =
                merge_by_key(&group, |r| r.purpose.clone(), |r| r.value)
                    .into_iter()
                    .map(|(purpose, value)| PurposeShare { purpose, value })
                    .collect();
            let value = purposes.iter().map(|p| p.value).sum();
            AggregatedEdge {
                donor: donor.to_string(),
                recipient: recipient.to_string(),
                value,
                purposes,
            }
        })
        .collect()
}

/// Total for one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearValue {
    pub year: i32,
    pub value: f64,
}

/// Dense per-year totals of the records matching `predicate`. Years
/// without data report zero.
pub fn year_series<'a, I, P>(records: I, years: &[i32], predicate: P) -> Vec<YearValue>
where
    I: IntoIterator<Item = &'a FlowRecord>,
    P: Fn(&FlowRecord) -> bool,
{
    let mut values = vec![0.0; years.len()];
    for record in records {
        if !predicate(record) {
            continue;
        }
        if let Some(i) = years.iter().position(|&y| y == record.year()) {
            values[i] += record.amount();
        }
    }
    years
        .iter()
        .zip(values)
        .map(|(&year, value)| YearValue { year, value })
        .collect()
}

/// Dense year × key table. Rows follow `years`, columns follow `keys`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearMatrix {
    years: Vec<i32>,
    keys: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl YearMatrix {
    /// Sum each record into the cell for its year and for the key
    /// `key_of` assigns it. Records with no key, an unknown key or a year
    /// outside `years` are ignored.
    pub fn build<'a, I, F>(records: I, years: &[i32], keys: &[String], key_of: F) -> Self
    where
        I: IntoIterator<Item = &'a FlowRecord>,
        F: Fn(&'a FlowRecord) -> Option<&'a str>,
    {
        let columns: IndexMap<&str, usize> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.as_str(), i))
            .collect();
        let rows: IndexMap<i32, usize> = years.iter().enumerate().map(|(i, &y)| (y, i)).collect();
        let mut values = vec![vec![0.0; keys.len()]; years.len()];

        for record in records {
            let Some(col) = key_of(record).and_then(|k| columns.get(k).copied()) else {
                continue;
            };
            if let Some(&row) = rows.get(&record.year()) {
                values[row][col] += record.amount();
            }
        }

        Self {
            years: years.to_vec(),
            keys: keys.to_vec(),
            values,
        }
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn value(&self, year_idx: usize, key_idx: usize) -> f64 {
        self.values
            .get(year_idx)
            .and_then(|row| row.get(key_idx))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn row(&self, year_idx: usize) -> &[f64] {
        self.values.get(year_idx).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn year_index(&self, year: i32) -> Option<usize> {
        self.years.iter().position(|&y| y == year)
    }

    /// All values of one key across the years.
    pub fn column(&self, key_idx: usize) -> Vec<f64> {
        self.values
            .iter()
            .map(|row| row.get(key_idx).copied().unwrap_or(0.0))
            .collect()
    }

    /// Largest single-year value of one key.
    pub fn column_max(&self, key_idx: usize) -> f64 {
        self.column(key_idx).into_iter().fold(0.0, f64::max)
    }

    /// Total over all keys for one year.
    pub fn row_total(&self, year_idx: usize) -> f64 {
        self.row(year_idx).iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> Vec<FlowRecord> {
        vec![
            FlowRecord::new("A", "X", 100.0, 2020).with_purpose("Health"),
            FlowRecord::new("A", "Y", 50.0, 2020).with_purpose("Water"),
            FlowRecord::new("B", "X", 200.0, 2020).with_purpose("Health"),
            FlowRecord::new("A", "X", 30.0, 2021).with_purpose("Water"),
            FlowRecord::new("A", "X", 20.0, 2022).with_purpose("Health"),
        ]
    }

    #[test]
    fn test_pair_rollup() {
        let edges = pair_edges(&sample());
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[0].donor, "A");
        assert_eq!(edges[0].recipient, "X");
        assert_eq!(edges[0].value, 150.0);
        assert_eq!(edges[1].value, 50.0);
        assert_eq!(edges[2].value, 200.0);
    }

    #[test]
    fn test_nested_subtotals() {
        let table = rollup(&sample(), &[KeyField::Donor, KeyField::Year]);
        assert_eq!(table.total(), 400.0);
        assert_eq!(table.get(&["A".into()]), Some(200.0));
        assert_eq!(table.get(&["A".into(), 2020.into()]), Some(150.0));
        assert_eq!(table.get(&["B".into(), 2021.into()]), None);
        assert_eq!(table.flatten().len(), 4);
    }

    #[test]
    fn test_three_level_flatten_order() {
        let rows = rollup(
            &sample(),
            &[KeyField::Donor, KeyField::Recipient, KeyField::Purpose],
        )
        .flatten();
        let first: Vec<KeyValue> = vec!["A".into(), "X".into(), "Health".into()];
        let second: Vec<KeyValue> = vec!["A".into(), "X".into(), "Water".into()];
        assert_eq!(rows[0].keys, first);
        assert_eq!(rows[1].keys, second);
        assert_eq!(rows[0].value, 120.0);
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn test_purpose_rollup_skips_untagged() {
        let mut records = sample();
        records.push(FlowRecord::new("A", "X", 999.0, 2020));
        let table = rollup(&records, &[KeyField::Purpose]);
        assert_eq!(table.total(), 400.0);
    }

    #[test]
    #[should_panic(expected = "at least one key")]
    fn test_rollup_requires_keys() {
        rollup(&sample(), &[]);
    }

    #[test]
    fn test_merge_by_key_sorts_descending() {
        let entries = vec![("a", 1.0), ("b", 5.0), ("a", 2.5), ("c", 3.5)];
        let merged = merge_by_key(&entries, |e| e.0, |e| e.1);
        assert_eq!(merged, vec![("b", 5.0), ("a", 3.5), ("c", 3.5)]);
    }

    #[test]
    fn test_purpose_breakdown_sums_to_edge() {
        let rows = purpose_edges(&sample());
        let edges = edges_with_purposes(&rows);
        assert_eq!(edges.len(), 3);
        let ax = &edges[0];
        assert_eq!(ax.value, 150.0);
        assert_eq!(ax.purposes[0].purpose, "Health");
        assert_eq!(ax.purposes[0].value, 120.0);
        assert_eq!(ax.purposes[1].value, 30.0);
        assert_eq!(ax.purpose_total(), ax.value);
    }

    #[test]
    fn test_year_series_is_dense() {
        let series = year_series(&sample(), &[2019, 2020, 2021, 2022], |r| r.donor() == "A");
        let values: Vec<f64> = series.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![0.0, 150.0, 30.0, 20.0]);
    }

    #[test]
    fn test_year_matrix() {
        let keys = vec!["X".to_string(), "Y".to_string()];
        let matrix = YearMatrix::build(&sample(), &[2020, 2021, 2022], &keys, |r| {
            Some(r.recipient())
        });
        assert_eq!(matrix.value(0, 0), 300.0);
        assert_eq!(matrix.value(0, 1), 50.0);
        assert_eq!(matrix.value(1, 1), 0.0);
        assert_eq!(matrix.column_max(0), 300.0);
        assert_relative_eq!(matrix.row_total(0), 350.0);
        assert_eq!(matrix.year_index(2022), Some(2));
    }
}
