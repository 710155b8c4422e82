//! View binders: each turns the flow set, the configuration and the
//! current selection into a serializable frame.

pub mod layout;
pub mod network;
pub mod purpose;
pub mod timeline;
pub mod year_network;

use serde::{Deserialize, Serialize};

/// The four views an explorer can show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    #[default]
    Network,
    Purpose,
    Timeline,
    YearNetwork,
}
