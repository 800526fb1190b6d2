//! The event log.
//!
//! [event_store::EventStore] owns the canonical ordered collection of [entities::TimeEvent]s.
//! Every consumer (the screen, the overlay) gets a handle to the same store and only changes
//! the log through its operations, observing results through published snapshots.

pub mod entities;
pub mod event_store;

pub use entities::{EventId, TimeEvent};
pub use event_store::{EventStore, Snapshot};
