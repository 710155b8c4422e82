//! Scale derivation: clamped domains and the width, colour and opacity
//! mappings built on them.

pub mod domain;
pub mod mapping;
