//! Synthetic flow generation for benches, property tests and demos.

pub mod synthetic;
