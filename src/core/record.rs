use serde::{Deserialize, Serialize};
use std::fmt;

/// The two roles a country can hold in a flow record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Donor,
    Recipient,
}

impl Role {
    /// The role on the other end of a flow.
    pub fn counterpart(self) -> Role {
        match self {
            Role::Donor => Role::Recipient,
            Role::Recipient => Role::Donor,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Donor => "donor",
            Role::Recipient => "recipient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single pledged aid flow from a donor to a recipient.
///
/// Records are immutable once loaded. Every aggregated view is derived
/// from a [`FlowSet`] of these, never from mutable intermediate state.
///
/// # Examples
///
/// ```
/// use aidflow_engine::core::record::{FlowRecord, Role};
///
/// let flow = FlowRecord::new("Japan", "India", 2_500_000.0, 2008)
///     .with_purpose("Energy generation");
///
/// assert_eq!(flow.entity(Role::Donor), "Japan");
/// assert_eq!(flow.purpose(), Some("Energy generation"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    donor: String,
    recipient: String,
    /// Commitment amount in constant USD. Always positive.
    amount: f64,
    year: i32,
    purpose: Option<String>,
}

impl FlowRecord {
    /// Create a new flow record.
    ///
    /// # Panics
    ///
    /// Panics if `amount` is not a positive finite number. The loader
    /// filters such rows before they ever reach this constructor.
    pub fn new(
        donor: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
        year: i32,
    ) -> Self {
        assert!(
            amount.is_finite() && amount > 0.0,
            "Flow amount must be positive, got {}",
            amount
        );
        Self {
            donor: donor.into(),
            recipient: recipient.into(),
            amount,
            year,
            purpose: None,
        }
    }

    /// Attach a purpose tag.
    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    // --- Accessors ---

    pub fn donor(&self) -> &str {
        &self.donor
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn purpose(&self) -> Option<&str> {
        self.purpose.as_deref()
    }

    /// The entity holding `role` in this flow.
    pub fn entity(&self, role: Role) -> &str {
        match role {
            Role::Donor => &self.donor,
            Role::Recipient => &self.recipient,
        }
    }
}

/// The immutable, ordered set of flows for one view session.
///
/// Input order is preserved: rankings break ties by first encounter,
/// so the order records were loaded in is observable downstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowSet {
    records: Vec<FlowRecord>,
}

impl FlowSet {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn add(&mut self, record: FlowRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[FlowRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total committed amount over all records.
    pub fn total_amount(&self) -> f64 {
        self.records.iter().map(|r| r.amount()).sum()
    }

    /// Records that carry a purpose tag. Purpose views ignore the rest.
    pub fn with_purpose(&self) -> FlowSet {
        self.filter(|r| r.purpose().is_some())
    }

    /// A new set holding the records matching `predicate`, in input order.
    pub fn filter(&self, predicate: impl Fn(&FlowRecord) -> bool) -> FlowSet {
        self.records
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }

    /// Inclusive `(first, last)` year over all records, if any.
    pub fn year_extent(&self) -> Option<(i32, i32)> {
        let first = self.records.iter().map(|r| r.year()).min()?;
        let last = self.records.iter().map(|r| r.year()).max()?;
        Some((first, last))
    }

    /// Every year between the extent bounds, gaps included.
    pub fn year_range(&self) -> Vec<i32> {
        match self.year_extent() {
            Some((first, last)) => (first..=last).collect(),
            None => Vec::new(),
        }
    }
}

impl FromIterator<FlowRecord> for FlowSet {
    fn from_iter<T: IntoIterator<Item = FlowRecord>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FlowSet {
    type Item = &'a FlowRecord;
    type IntoIter = std::slice::Iter<'a, FlowRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_creation() {
        let flow = FlowRecord::new("A", "X", 100.0, 2020);
        assert_eq!(flow.donor(), "A");
        assert_eq!(flow.recipient(), "X");
        assert_eq!(flow.amount(), 100.0);
        assert_eq!(flow.year(), 2020);
        assert_eq!(flow.purpose(), None);
    }

    #[test]
    #[should_panic(expected = "must be positive")]
    fn test_record_zero_amount() {
        FlowRecord::new("A", "X", 0.0, 2020);
    }

    #[test]
    #[should_panic(expected = "must be positive")]
    fn test_record_nan_amount() {
        FlowRecord::new("A", "X", f64::NAN, 2020);
    }

    #[test]
    fn test_role_counterpart() {
        assert_eq!(Role::Donor.counterpart(), Role::Recipient);
        assert_eq!(Role::Recipient.counterpart(), Role::Donor);
        assert_eq!(format!("{}", Role::Recipient), "recipient");
    }

    #[test]
    fn test_year_range_fills_gaps() {
        let set: FlowSet = vec![
            FlowRecord::new("A", "X", 1.0, 2003),
            FlowRecord::new("A", "X", 1.0, 2000),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.year_extent(), Some((2000, 2003)));
        assert_eq!(set.year_range(), vec![2000, 2001, 2002, 2003]);
        assert!(FlowSet::new().year_range().is_empty());
    }

    #[test]
    fn test_with_purpose_drops_untagged() {
        let set: FlowSet = vec![
            FlowRecord::new("A", "X", 1.0, 2000).with_purpose("Health"),
            FlowRecord::new("A", "X", 2.0, 2000),
        ]
        .into_iter()
        .collect();
        let tagged = set.with_purpose();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged.total_amount(), 1.0);
    }
}
