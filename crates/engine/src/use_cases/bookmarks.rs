//! Recently viewed and pinned content.

use std::sync::Arc;

use vault_domain::{EntityKind, PinnedEntry, PinnedList, RecentEntry, RecentList};

use crate::infrastructure::persistence::SnapshotStore;
use crate::infrastructure::ports::ClockPort;

pub struct BookmarkService {
    recent: RecentList,
    pinned: PinnedList,
    store: SnapshotStore,
    clock: Arc<dyn ClockPort>,
}

impl BookmarkService {
    pub fn load(store: SnapshotStore, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            recent: store.load_or_default(),
            pinned: store.load_or_default(),
            store,
            clock,
        }
    }

    pub fn add_recent(&mut self, kind: EntityKind, id: &str, name: &str) {
        let timestamp = self.clock.now().timestamp_millis();
        self.recent.record(kind, id, name, timestamp);
        self.store.save(&self.recent);
    }

    pub fn recent(&self) -> &[RecentEntry] {
        self.recent.entries()
    }

    /// Returns `true` when the entry is now pinned.
    pub fn toggle_pinned(&mut self, kind: EntityKind, id: &str, name: &str) -> bool {
        let pinned = self.pinned.toggle(kind, id, name);
        self.store.save(&self.pinned);
        tracing::debug!(kind = %kind, id, pinned, "Pin toggled");
        pinned
    }

    pub fn is_pinned(&self, kind: EntityKind, id: &str) -> bool {
        self.pinned.is_pinned(kind, id)
    }

    pub fn pinned(&self) -> &[PinnedEntry] {
        self.pinned.entries()
    }
}
