use crate::aggregate::rollup::AggregatedEdge;
use crate::core::record::Role;
use crate::graph::flow_graph::FlowGraph;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The single active selection of a view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    /// Overview: everything visible.
    #[default]
    None,
    /// One-sided neighborhood highlight.
    Entity { name: String, role: Role },
    /// Single-edge focus.
    Pair { donor: String, recipient: String },
    /// Year pinned until clicked again.
    LockedYear { year: i32 },
    /// Entity pinned until clicked again.
    LockedEntity { name: String, role: Role },
}

impl Selection {
    pub fn entity(name: impl Into<String>, role: Role) -> Self {
        Selection::Entity {
            name: name.into(),
            role,
        }
    }

    pub fn pair(donor: impl Into<String>, recipient: impl Into<String>) -> Self {
        Selection::Pair {
            donor: donor.into(),
            recipient: recipient.into(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Selection::None)
    }

    /// Locked selections survive pointer movement and suppress hover.
    pub fn is_locked(&self) -> bool {
        matches!(
            self,
            Selection::LockedYear { .. } | Selection::LockedEntity { .. }
        )
    }

    /// The focused entity, locked or not.
    pub fn focused_entity(&self) -> Option<(&str, Role)> {
        match self {
            Selection::Entity { name, role } | Selection::LockedEntity { name, role } => {
                Some((name.as_str(), *role))
            }
            _ => None,
        }
    }

    pub fn focused_pair(&self) -> Option<(&str, &str)> {
        match self {
            Selection::Pair { donor, recipient } => Some((donor.as_str(), recipient.as_str())),
            _ => None,
        }
    }

    pub fn locked_year(&self) -> Option<i32> {
        match self {
            Selection::LockedYear { year } => Some(*year),
            _ => None,
        }
    }
}

/// Transient hover state. Never part of the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Preview {
    Year { year: i32 },
    Entity { name: String, role: Role },
}

/// Click, lock and hover semantics over a single [`Selection`].
///
/// Clicking the active target clears it; clicking any other target
/// replaces it directly, so a new target never takes two clicks to
/// deselect. Hover previews are dropped while a lock is held.
///
/// # Examples
///
/// ```
/// use aidflow_engine::core::record::Role;
/// use aidflow_engine::selection::state::{Selection, SelectionModel};
///
/// let mut model = SelectionModel::new();
/// model.click_entity("A", Role::Donor);
/// model.click_entity("B", Role::Donor);
/// assert_eq!(model.selection(), &Selection::entity("B", Role::Donor));
/// model.click_entity("B", Role::Donor);
/// assert!(model.selection().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionModel {
    selection: Selection,
    preview: Option<Preview>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    fn toggle(&mut self, target: Selection) -> bool {
        if self.selection == target {
            debug!("selection cleared: {:?}", target);
            self.selection = Selection::None;
            false
        } else {
            debug!("selection set: {:?}", target);
            self.selection = target;
            true
        }
    }

    /// Toggle an entity selection. Returns whether the entity is now
    /// selected.
    pub fn click_entity(&mut self, name: &str, role: Role) -> bool {
        self.toggle(Selection::entity(name, role))
    }

    /// Toggle a pair selection. Replaces any entity selection.
    pub fn click_pair(&mut self, donor: &str, recipient: &str) -> bool {
        self.toggle(Selection::pair(donor, recipient))
    }

    /// Toggle a year lock.
    pub fn lock_year(&mut self, year: i32) -> bool {
        let locked = self.toggle(Selection::LockedYear { year });
        self.preview = None;
        locked
    }

    /// Toggle an entity lock.
    pub fn lock_entity(&mut self, name: &str, role: Role) -> bool {
        let locked = self.toggle(Selection::LockedEntity {
            name: name.to_string(),
            role,
        });
        self.preview = None;
        locked
    }

    /// Select an entity without toggling, as a dropdown does.
    pub fn set_entity(&mut self, name: &str, role: Role) {
        self.selection = Selection::entity(name, role);
    }

    /// Select a pair without toggling.
    pub fn set_pair(&mut self, donor: &str, recipient: &str) {
        self.selection = Selection::pair(donor, recipient);
    }

    /// Back to the overview.
    pub fn clear(&mut self) {
        self.selection = Selection::None;
        self.preview = None;
    }

    /// Offer a hover preview. Returns `false` when a lock suppresses it.
    pub fn hover(&mut self, preview: Preview) -> bool {
        if self.selection.is_locked() {
            return false;
        }
        self.preview = Some(preview);
        true
    }

    pub fn clear_hover(&mut self) {
        self.preview = None;
    }

    /// Year to break down: the locked year wins over a hovered one.
    pub fn focus_year(&self) -> Option<i32> {
        if let Some(year) = self.selection.locked_year() {
            return Some(year);
        }
        match &self.preview {
            Some(Preview::Year { year }) => Some(*year),
            _ => None,
        }
    }
}

/// What stays visible for a selection in one render pass.
///
/// Everything outside the neighborhood is hidden, not removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Neighborhood {
    /// No filter.
    All,
    /// The selected entity, its counterparts, and the edges between them.
    Entity {
        name: String,
        role: Role,
        neighbors: Vec<String>,
        lookup: HashSet<String>,
    },
    /// A single edge and its two endpoints.
    Pair { donor: String, recipient: String },
}

impl Neighborhood {
    pub fn of(selection: &Selection, graph: &FlowGraph) -> Self {
        if let Some((name, role)) = selection.focused_entity() {
            let neighbors = graph.neighbors(name, role);
            let lookup = neighbors.iter().cloned().collect();
            return Neighborhood::Entity {
                name: name.to_string(),
                role,
                neighbors,
                lookup,
            };
        }
        if let Some((donor, recipient)) = selection.focused_pair() {
            return Neighborhood::Pair {
                donor: donor.to_string(),
                recipient: recipient.to_string(),
            };
        }
        Neighborhood::All
    }

    /// Counterparts of the selected entity; empty for other variants.
    pub fn neighbors(&self) -> &[String] {
        match self {
            Neighborhood::Entity { neighbors, .. } => neighbors,
            _ => &[],
        }
    }

    pub fn is_filtered(&self) -> bool {
        !matches!(self, Neighborhood::All)
    }

    pub fn is_node_visible(&self, node: &str, node_role: Role) -> bool {
        match self {
            Neighborhood::All => true,
            Neighborhood::Entity {
                name, role, lookup, ..
            } => {
                (node_role == *role && node == name)
                    || (node_role == role.counterpart() && lookup.contains(node))
            }
            Neighborhood::Pair { donor, recipient } => match node_role {
                Role::Donor => node == donor,
                Role::Recipient => node == recipient,
            },
        }
    }

    pub fn is_edge_visible(&self, edge: &AggregatedEdge) -> bool {
        match self {
            Neighborhood::All => true,
            Neighborhood::Entity { name, role, .. } => edge.entity(*role) == name,
            Neighborhood::Pair { donor, recipient } => edge.connects(donor, recipient),
        }
    }
}
