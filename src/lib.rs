//! Hardtrack logs "I started doing X now" events and shows them as a timeline of the day, where
//! every activity lasts until the next one begins.
//!
//! [store] owns the history and publishes snapshots of it, [screen] turns a snapshot into the
//! daily view, and [overlay] drives a floating record button for hosts that can draw one.
//! [cli] wires everything to a terminal.

pub mod cli;
pub mod overlay;
pub mod screen;
pub mod storage;
pub mod store;
pub mod utils;
