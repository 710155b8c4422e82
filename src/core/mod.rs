//! Foundational types: flow records and the CSV loader.

pub mod loader;
pub mod record;
