use crate::core::record::{FlowRecord, FlowSet, Role};
use indexmap::{IndexMap, IndexSet};
use log::debug;
use serde::{Deserialize, Serialize};

/// Summed amount for one entity in one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTotal {
    pub name: String,
    pub total: f64,
}

/// Group `records` by the key `key_of` extracts, sum amounts, and sort by
/// descending total.
///
/// The sort is stable over first-encounter order, so equal totals keep
/// the order in which their entities first appeared. Records for which
/// `key_of` returns `None` are ignored.
pub fn rank_by<'a, I, F>(records: I, key_of: F) -> Vec<EntityTotal>
where
    I: IntoIterator<Item = &'a FlowRecord>,
    F: Fn(&'a FlowRecord) -> Option<&'a str>,
{
    let mut totals: IndexMap<&str, f64> = IndexMap::new();
    for record in records {
        if let Some(key) = key_of(record) {
            *totals.entry(key).or_insert(0.0) += record.amount();
        }
    }

    let mut ranked: Vec<EntityTotal> = totals
        .into_iter()
        .map(|(name, total)| EntityTotal {
            name: name.to_string(),
            total,
        })
        .collect();
    ranked.sort_by(|a, b| b.total.total_cmp(&a.total));
    ranked
}

/// Rank entities holding `role` by their total committed amount.
///
/// # Examples
///
/// ```
/// use aidflow_engine::aggregate::ranking::rank;
/// use aidflow_engine::core::record::{FlowRecord, Role};
///
/// let flows = vec![
///     FlowRecord::new("A", "X", 100.0, 2020),
///     FlowRecord::new("A", "Y", 50.0, 2020),
///     FlowRecord::new("B", "X", 200.0, 2020),
/// ];
/// let donors = rank(&flows, Role::Donor);
/// assert_eq!(donors[0].name, "B");
/// assert_eq!(donors[1].total, 150.0);
/// ```
pub fn rank<'a, I>(records: I, role: Role) -> Vec<EntityTotal>
where
    I: IntoIterator<Item = &'a FlowRecord>,
{
    rank_by(records, |r| Some(r.entity(role)))
}

/// Rank purpose tags by total amount. Untagged records are ignored.
pub fn rank_purposes<'a, I>(records: I) -> Vec<EntityTotal>
where
    I: IntoIterator<Item = &'a FlowRecord>,
{
    rank_by(records, |r| r.purpose())
}

/// An ordered set of the highest-ranked names.
///
/// The order is the rendering order (rank position) and the set doubles
/// as the membership test for downstream filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopSet {
    names: IndexSet<String>,
}

impl TopSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Zero-based rank position of `name`.
    pub fn rank_of(&self, name: &str) -> Option<usize> {
        self.names.get_index_of(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Take the first `n` names of a ranking. Shorter rankings are returned
/// whole, without padding.
pub fn top_n(ranked: &[EntityTotal], n: usize) -> TopSet {
    TopSet::new(ranked.iter().take(n).map(|e| e.name.clone()))
}

/// Membership filter over top donors and top recipients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopFilter {
    pub donors: TopSet,
    pub recipients: TopSet,
}

impl TopFilter {
    /// Rank both roles over `set` and keep the top `donor_n` / `recipient_n`.
    pub fn from_totals(set: &FlowSet, donor_n: usize, recipient_n: usize) -> Self {
        Self {
            donors: top_n(&rank(set, Role::Donor), donor_n),
            recipients: top_n(&rank(set, Role::Recipient), recipient_n),
        }
    }

    pub fn top(&self, role: Role) -> &TopSet {
        match role {
            Role::Donor => &self.donors,
            Role::Recipient => &self.recipients,
        }
    }

    /// A record is admitted only if both ends are in their top sets.
    pub fn admits(&self, record: &FlowRecord) -> bool {
        self.donors.contains(record.donor()) && self.recipients.contains(record.recipient())
    }

    pub fn apply(&self, set: &FlowSet) -> FlowSet {
        set.filter(|r| self.admits(r))
    }
}

/// Outcome of the two-pass purpose refinement.
#[derive(Debug, Clone)]
pub struct PurposeRefinement {
    /// Pass-one filter on raw totals.
    pub initial: TopFilter,
    /// Top purposes within the pass-one subset, descending.
    pub purposes: TopSet,
    /// Donor order recomputed on the purpose-filtered subset.
    pub donors: Vec<EntityTotal>,
    /// Recipient order recomputed on the purpose-filtered subset.
    pub recipients: Vec<EntityTotal>,
    /// Records surviving both passes.
    pub records: FlowSet,
}

impl PurposeRefinement {
    pub fn donor_order(&self) -> TopSet {
        TopSet::new(self.donors.iter().map(|e| e.name.clone()))
    }

    pub fn recipient_order(&self) -> TopSet {
        TopSet::new(self.recipients.iter().map(|e| e.name.clone()))
    }
}

/// Two-pass ranking used by the purpose-breakdown view.
///
/// 1. Keep top `donor_n` donors × top `recipient_n` recipients on raw totals.
/// 2. Rank purposes within that subset and keep the top `purpose_n`.
/// 3. Recompute donor and recipient totals over the records carrying one of
///    those purposes. The final order reflects only those flows and may
///    differ from pass one; entities left without flows drop out.
pub fn refine_by_purpose(
    set: &FlowSet,
    donor_n: usize,
    recipient_n: usize,
    purpose_n: usize,
) -> PurposeRefinement {
    let tagged = set.with_purpose();
    let initial = TopFilter::from_totals(&tagged, donor_n, recipient_n);
    let subset = initial.apply(&tagged);

    let purposes = top_n(&rank_purposes(&subset), purpose_n);
    let records = subset.filter(|r| r.purpose().is_some_and(|p| purposes.contains(p)));

    let donors = rank(&records, Role::Donor);
    let recipients = rank(&records, Role::Recipient);
    debug!(
        "purpose refinement: {} -> {} records, {} donors, {} recipients",
        subset.len(),
        records.len(),
        donors.len(),
        recipients.len()
    );

    PurposeRefinement {
        initial,
        purposes,
        donors,
        recipients,
        records,
    }
}
