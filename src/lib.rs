//! # aidflow-engine
//!
//! Data and interaction core behind a family of aid-flow visualizations.
//!
//! Donor → recipient flow records are loaded once, ranked, filtered to the
//! top donors and recipients, aggregated into weighted edges, and mapped
//! through scales into drawable frames. A small selection model decides
//! what is highlighted; playback steps a year cursor on a scheduler.
//!
//! ## Architecture
//!
//! - **core**: Flow records, the flow set, CSV loading
//! - **aggregate**: Ranking, top-N filtering, rollups by key and year
//! - **graph**: Donor/recipient adjacency over aggregated edges
//! - **scale**: Domains, quantiles, width/colour/opacity/palette mappings
//! - **selection**: Selection/lock/hover model and year playback
//! - **views**: Layout helpers and the four view binders
//! - **render**: Frames, renderers and view events
//! - **controller**: The explorer that owns state and runs passes
//! - **simulation**: Synthetic flow generation
//!
//! # Examples
//!
//! ```
//! use aidflow_engine::prelude::*;
//!
//! let flows: FlowSet = vec![
//!     FlowRecord::new("A", "X", 100.0, 2020),
//!     FlowRecord::new("B", "Y", 60.0, 2021),
//! ]
//! .into_iter()
//! .collect();
//!
//! let mut explorer = Explorer::new(
//!     flows,
//!     ExplorerConfig::default(),
//!     RecordingRenderer::new(),
//!     ManualScheduler::new(),
//! );
//! explorer.handle(ViewEvent::node("A", Role::Donor)).unwrap();
//! assert_eq!(explorer.renderer().frames.len(), 1);
//! ```

pub mod aggregate;
pub mod config;
pub mod controller;
pub mod core;
pub mod graph;
pub mod render;
pub mod scale;
pub mod selection;
pub mod simulation;
pub mod views;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::aggregate::ranking::{rank, top_n, TopFilter, TopSet};
    pub use crate::aggregate::rollup::{pair_edges, AggregatedEdge, YearMatrix};
    pub use crate::config::ExplorerConfig;
    pub use crate::controller::Explorer;
    pub use crate::core::loader::{load_path, load_str, LoadError};
    pub use crate::core::record::{FlowRecord, FlowSet, Role};
    pub use crate::render::{
        ControlChange, Frame, JsonRenderer, RecordingRenderer, Renderer, ViewEvent,
    };
    pub use crate::selection::playback::{ManualScheduler, Playback, Scheduler};
    pub use crate::selection::state::{Selection, SelectionModel};
    pub use crate::views::ViewKind;
}
