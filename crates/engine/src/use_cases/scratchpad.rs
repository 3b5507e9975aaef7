//! Scratchpad use cases.
//!
//! Edits land in memory and are committed once the autosave delay has
//! passed without another edit. `flush_due` is polled by the caller; there
//! are no timers.

use chrono::Duration;
use std::sync::Arc;

use vault_domain::{Debouncer, ScratchSession, SessionHistory, SessionId};

use crate::infrastructure::persistence::SnapshotStore;
use crate::infrastructure::ports::{ClockPort, RandomPort};

pub struct ScratchpadService {
    current: ScratchSession,
    history: SessionHistory,
    debouncer: Debouncer,
    store: SnapshotStore,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
}

impl ScratchpadService {
    /// Restores the current session, starting (and saving) a fresh one when
    /// none is stored or it cannot be read.
    pub fn load(
        autosave_delay: Duration,
        store: SnapshotStore,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        let history: SessionHistory = store.load_or_default();
        let stored: Option<ScratchSession> = store.load();
        let needs_commit = stored.is_none();
        let current = stored.unwrap_or_else(|| {
            ScratchSession::new(SessionId::from_uuid(random.gen_uuid()), clock.now())
        });

        let mut service = Self {
            current,
            history,
            debouncer: Debouncer::new(autosave_delay),
            store,
            clock,
            random,
        };
        if needs_commit {
            service.commit();
        }
        tracing::debug!(
            session_id = %service.current.id,
            history = service.history.len(),
            "Scratchpad loaded"
        );
        service
    }

    pub fn current(&self) -> &ScratchSession {
        &self.current
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    pub fn has_pending_changes(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn download_file_name(&self) -> String {
        self.current.download_file_name()
    }

    // =========================================================================
    // Editing
    // =========================================================================

    pub fn edit_title(&mut self, title: impl Into<String>) {
        self.current.title = title.into();
        self.debouncer.touch(self.clock.now());
    }

    pub fn edit_content(&mut self, content: impl Into<String>) {
        self.current.content = content.into();
        self.debouncer.touch(self.clock.now());
    }

    /// Commits pending edits once the quiet period has elapsed.
    ///
    /// Returns `true` if a commit happened.
    pub fn flush_due(&mut self) -> bool {
        if !self.debouncer.take_due(self.clock.now()) {
            return false;
        }
        self.commit();
        true
    }

    /// Commits immediately, pending or not.
    pub fn save_now(&mut self) {
        self.debouncer.cancel();
        self.commit();
        tracing::info!(title = %self.current.title, "Session saved");
    }

    fn commit(&mut self) {
        self.current.last_saved = Some(self.clock.now());
        self.store.save(&self.current);
        self.history.upsert(self.current.clone());
        self.store.save(&self.history);
    }

    fn commit_pending(&mut self) {
        if self.debouncer.is_pending() {
            self.debouncer.cancel();
            self.commit();
        }
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Starts an empty session. Unsaved edits to the old one are kept.
    pub fn new_session(&mut self) -> SessionId {
        self.commit_pending();
        let id = SessionId::from_uuid(self.random.gen_uuid());
        self.current = ScratchSession::new(id, self.clock.now());
        self.commit();
        tracing::info!(session_id = %id, "New session started");
        id
    }

    /// Switches to a session from history. Unknown ids do nothing.
    pub fn load_session(&mut self, id: SessionId) -> bool {
        let Some(session) = self.history.find(id).cloned() else {
            return false;
        };
        self.commit_pending();
        self.current = session;
        self.store.save(&self.current);
        tracing::info!(session_id = %id, title = %self.current.title, "Session loaded");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::{CURRENT_SESSION_KEY, SESSIONS_KEY};
    use crate::infrastructure::ports::{MockClockPort, MockRandomPort, StoragePort};
    use crate::infrastructure::storage::InMemoryStorage;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Clock whose time the test moves by hand
    struct ManualClock(Mutex<DateTime<Utc>>);

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(Utc.with_ymd_and_hms(2024, 5, 4, 20, 0, 0).unwrap())))
        }

        fn advance_ms(&self, ms: i64) {
            let mut now = self.0.lock().unwrap();
            *now += Duration::milliseconds(ms);
        }
    }

    impl ClockPort for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn counting_random() -> Arc<MockRandomPort> {
        let mut random = MockRandomPort::new();
        let mut next = 0u128;
        random.expect_gen_uuid().returning(move || {
            next += 1;
            Uuid::from_u128(next)
        });
        Arc::new(random)
    }

    fn service(storage: Arc<InMemoryStorage>, clock: Arc<ManualClock>) -> ScratchpadService {
        ScratchpadService::load(
            Duration::milliseconds(500),
            SnapshotStore::new(storage),
            clock,
            counting_random(),
        )
    }

    fn stored_current(storage: &Arc<InMemoryStorage>) -> ScratchSession {
        SnapshotStore::new(storage.clone()).load().unwrap()
    }

    mod loading {
        use super::*;

        #[test]
        fn first_run_creates_and_saves_session() {
            let storage = Arc::new(InMemoryStorage::new());
            let service = service(storage.clone(), ManualClock::new());

            assert_eq!(service.current().title, "Session May 4, 2024 8:00 PM");
            assert!(storage.load(CURRENT_SESSION_KEY).is_some());
            assert_eq!(service.history().len(), 1);
        }

        #[test]
        fn unreadable_session_is_replaced() {
            let storage = Arc::new(InMemoryStorage::new());
            storage.save(CURRENT_SESSION_KEY, "{oops");
            let service = service(storage.clone(), ManualClock::new());
            assert_eq!(stored_current(&storage).id, service.current().id);
        }

        #[test]
        fn existing_session_is_restored_without_writing() {
            let storage = Arc::new(InMemoryStorage::new());
            let first_id = service(storage.clone(), ManualClock::new()).current().id;
            storage.remove(SESSIONS_KEY);

            let mut clock = MockClockPort::new();
            clock.expect_now().never();
            let restored = ScratchpadService::load(
                Duration::milliseconds(500),
                SnapshotStore::new(storage.clone()),
                Arc::new(clock),
                counting_random(),
            );
            assert_eq!(restored.current().id, first_id);
            assert!(storage.load(SESSIONS_KEY).is_none());
        }
    }

    mod autosave {
        use super::*;

        #[test]
        fn burst_of_edits_commits_last_value_once() {
            let storage = Arc::new(InMemoryStorage::new());
            let clock = ManualClock::new();
            let mut service = service(storage.clone(), clock.clone());

            for text in ["G", "Go", "Gob", "Gobl"] {
                service.edit_content(text);
                clock.advance_ms(200);
                assert!(!service.flush_due());
            }
            assert_eq!(stored_current(&storage).content, "");

            clock.advance_ms(300);
            assert!(service.flush_due());
            assert_eq!(stored_current(&storage).content, "Gobl");
            assert!(!service.flush_due());
        }

        #[test]
        fn save_now_skips_the_wait() {
            let storage = Arc::new(InMemoryStorage::new());
            let clock = ManualClock::new();
            let mut service = service(storage.clone(), clock.clone());

            service.edit_title("The Drowned Chapel");
            service.save_now();
            assert_eq!(stored_current(&storage).title, "The Drowned Chapel");
            assert!(!service.has_pending_changes());
            clock.advance_ms(1_000);
            assert!(!service.flush_due());
        }

        #[test]
        fn commit_updates_history_entry() {
            let storage = Arc::new(InMemoryStorage::new());
            let mut service = service(storage.clone(), ManualClock::new());
            service.edit_content("first notes");
            service.save_now();

            let history: SessionHistory = SnapshotStore::new(storage).load().unwrap();
            assert_eq!(history.len(), 1);
            assert_eq!(history.sessions()[0].content, "first notes");
        }
    }

    mod sessions {
        use super::*;

        #[test]
        fn new_session_keeps_pending_edits() {
            let storage = Arc::new(InMemoryStorage::new());
            let mut service = service(storage.clone(), ManualClock::new());
            let first = service.current().id;
            service.edit_content("unsaved");

            let second = service.new_session();
            assert_ne!(first, second);
            assert_eq!(service.history().sessions()[0].id, second);
            assert_eq!(service.history().find(first).unwrap().content, "unsaved");
        }

        #[test]
        fn load_session_switches_current() {
            let storage = Arc::new(InMemoryStorage::new());
            let mut service = service(storage.clone(), ManualClock::new());
            let first = service.current().id;
            service.new_session();

            assert!(service.load_session(first));
            assert_eq!(service.current().id, first);
            assert_eq!(stored_current(&storage).id, first);
            assert!(!service.load_session(SessionId::from_uuid(Uuid::from_u128(99))));
        }

        #[test]
        fn download_name_tracks_title() {
            let mut service = service(Arc::new(InMemoryStorage::new()), ManualClock::new());
            service.edit_title("Loot & XP");
            assert_eq!(
                service.download_file_name(),
                "Loot___XP_00000000-0000-0000-0000-000000000001.txt"
            );
        }
    }
}
