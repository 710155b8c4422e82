//! Selection state and the playback driver that shares the current year
//! with manual scrubbing.

pub mod playback;
pub mod state;
