//! Whole-document snapshots under fixed storage keys.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use vault_domain::{
    CalendarState, EncounterState, PinnedList, RecentList, ScratchSession, SessionHistory,
};

use super::migrations;
use crate::infrastructure::ports::StoragePort;

pub const CALENDAR_KEY: &str = "dnd_vault_calendar";
pub const ENCOUNTER_KEY: &str = "dnd_vault_encounter";
pub const CURRENT_SESSION_KEY: &str = "scratchpad_current_session";
pub const SESSIONS_KEY: &str = "scratchpad_sessions";
pub const RECENT_KEY: &str = "dnd_vault_recent";
pub const PINNED_KEY: &str = "dnd_vault_pinned";

/// A document persisted as one JSON value under `KEY`.
pub trait Snapshot: Serialize + DeserializeOwned {
    const KEY: &'static str;

    /// Upgrades an older layout of the raw document.
    fn migrate(value: Value) -> Value {
        value
    }
}

impl Snapshot for CalendarState {
    const KEY: &'static str = CALENDAR_KEY;

    fn migrate(value: Value) -> Value {
        migrations::migrate_calendar(value)
    }
}

impl Snapshot for EncounterState {
    const KEY: &'static str = ENCOUNTER_KEY;

    fn migrate(value: Value) -> Value {
        migrations::migrate_encounter(value)
    }
}

impl Snapshot for ScratchSession {
    const KEY: &'static str = CURRENT_SESSION_KEY;

    fn migrate(value: Value) -> Value {
        migrations::migrate_session(value)
    }
}

impl Snapshot for SessionHistory {
    const KEY: &'static str = SESSIONS_KEY;

    fn migrate(value: Value) -> Value {
        migrations::migrate_session_history(value)
    }
}

impl Snapshot for RecentList {
    const KEY: &'static str = RECENT_KEY;
}

impl Snapshot for PinnedList {
    const KEY: &'static str = PINNED_KEY;
}

/// The only code that touches storage.
#[derive(Clone)]
pub struct SnapshotStore {
    storage: Arc<dyn StoragePort>,
}

impl SnapshotStore {
    pub fn new(storage: Arc<dyn StoragePort>) -> Self {
        Self { storage }
    }

    /// `None` when nothing is stored or the stored document is unusable.
    pub fn load<T: Snapshot>(&self) -> Option<T> {
        let raw = self.storage.load(T::KEY)?;

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(
                    key = T::KEY,
                    error = %e,
                    "Stored snapshot is not valid JSON, using default"
                );
                return None;
            }
        };

        match serde_json::from_value(T::migrate(value)) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(
                    key = T::KEY,
                    error = %e,
                    "Stored snapshot has an unknown layout, using default"
                );
                None
            }
        }
    }

    pub fn load_or_default<T: Snapshot + Default>(&self) -> T {
        self.load().unwrap_or_default()
    }

    pub fn save<T: Snapshot>(&self, snapshot: &T) {
        match serde_json::to_string(snapshot) {
            Ok(json) => self.storage.save(T::KEY, &json),
            Err(e) => tracing::error!(key = T::KEY, error = %e, "Failed to serialize snapshot"),
        }
    }

    pub fn remove<T: Snapshot>(&self) {
        self.storage.remove(T::KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockStoragePort;
    use crate::infrastructure::storage::InMemoryStorage;

    #[test]
    fn round_trips_through_storage() {
        let store = SnapshotStore::new(Arc::new(InMemoryStorage::new()));
        let mut state = CalendarState::default();
        state.date.day = 9;
        store.save(&state);

        let loaded: CalendarState = store.load().unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn absent_key_loads_none() {
        let mut storage = MockStoragePort::new();
        storage
            .expect_load()
            .withf(|key| key == ENCOUNTER_KEY)
            .times(1)
            .returning(|_| None);

        let store = SnapshotStore::new(Arc::new(storage));
        assert!(store.load::<EncounterState>().is_none());
    }

    #[test]
    fn corrupt_json_falls_back_to_default() {
        let mut storage = MockStoragePort::new();
        storage
            .expect_load()
            .returning(|_| Some("{\"year\": 376,".to_string()));

        let store = SnapshotStore::new(Arc::new(storage));
        let state: CalendarState = store.load_or_default();
        assert_eq!(state, CalendarState::default());
    }

    #[test]
    fn wrong_shape_falls_back_to_default() {
        let mut storage = MockStoragePort::new();
        storage
            .expect_load()
            .returning(|_| Some("{\"name\": 5}".to_string()));

        let store = SnapshotStore::new(Arc::new(storage));
        assert!(store.load::<EncounterState>().is_none());
    }

    #[test]
    fn save_writes_under_the_type_key() {
        let mut storage = MockStoragePort::new();
        storage
            .expect_save()
            .withf(|key, value| key == PINNED_KEY && value == "[]")
            .times(1)
            .return_const(());

        let store = SnapshotStore::new(Arc::new(storage));
        store.save(&PinnedList::default());
    }
}
