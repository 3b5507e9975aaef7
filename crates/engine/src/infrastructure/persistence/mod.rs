//! Snapshot persistence over the storage port.

pub mod migrations;
mod snapshot;

pub use snapshot::{
    Snapshot, SnapshotStore, CALENDAR_KEY, CURRENT_SESSION_KEY, ENCOUNTER_KEY, PINNED_KEY,
    RECENT_KEY, SESSIONS_KEY,
};
