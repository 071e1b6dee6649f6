//! Animation playback.
//!
//! - `track` holds per-clip playback state (cursor, loop mode, pause) and poses the graph
//! - `driver` binds the body and camera tracks to scroll progress or the wall clock

pub mod driver;
pub mod track;
