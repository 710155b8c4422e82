//! Ranking and grouped-sum aggregation shared by every view.

pub mod ranking;
pub mod rollup;
