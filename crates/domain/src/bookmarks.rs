//! Recently viewed and pinned content entries

use serde::{Deserialize, Serialize};
use std::fmt;

/// Most entries kept in the recent list
pub const MAX_RECENT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Item,
    Monster,
    Character,
    Shop,
    Quest,
}

impl EntityKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            EntityKind::Item => "Item",
            EntityKind::Monster => "Monster",
            EntityKind::Character => "Character",
            EntityKind::Shop => "Shop",
            EntityKind::Quest => "Quest",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentEntry {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub id: String,
    pub name: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedEntry {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub id: String,
    pub name: String,
}

/// Most recent first, one entry per (kind, id)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentList(Vec<RecentEntry>);

impl RecentList {
    pub fn record(
        &mut self,
        kind: EntityKind,
        id: impl Into<String>,
        name: impl Into<String>,
        timestamp: i64,
    ) {
        let id = id.into();
        self.0.retain(|e| !(e.kind == kind && e.id == id));
        self.0.insert(
            0,
            RecentEntry {
                kind,
                id,
                name: name.into(),
                timestamp,
            },
        );
        self.0.truncate(MAX_RECENT);
    }

    pub fn entries(&self) -> &[RecentEntry] {
        &self.0
    }
}

/// Pinned entries in the order they were pinned
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinnedList(Vec<PinnedEntry>);

impl PinnedList {
    /// Pins or unpins. Returns `true` when the entry is now pinned.
    pub fn toggle(
        &mut self,
        kind: EntityKind,
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> bool {
        let id = id.into();
        if self.is_pinned(kind, &id) {
            self.0.retain(|e| !(e.kind == kind && e.id == id));
            false
        } else {
            self.0.push(PinnedEntry {
                kind,
                id,
                name: name.into(),
            });
            true
        }
    }

    pub fn is_pinned(&self, kind: EntityKind, id: &str) -> bool {
        self.0.iter().any(|e| e.kind == kind && e.id == id)
    }

    pub fn entries(&self) -> &[PinnedEntry] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_dedupes_and_caps() {
        let mut recent = RecentList::default();
        for n in 0..12 {
            recent.record(EntityKind::Item, n.to_string(), format!("Item {}", n), n);
        }
        recent.record(EntityKind::Item, "5", "Item 5", 100);

        assert_eq!(recent.entries().len(), MAX_RECENT);
        assert_eq!(recent.entries()[0].id, "5");
        assert_eq!(recent.entries().iter().filter(|e| e.id == "5").count(), 1);
    }

    #[test]
    fn same_id_different_kind_is_distinct() {
        let mut recent = RecentList::default();
        recent.record(EntityKind::Item, "1", "Rope", 1);
        recent.record(EntityKind::Monster, "1", "Goblin", 2);
        assert_eq!(recent.entries().len(), 2);
    }

    #[test]
    fn pin_toggles() {
        let mut pinned = PinnedList::default();
        assert!(pinned.toggle(EntityKind::Quest, "q1", "The Lost Bell"));
        assert!(pinned.is_pinned(EntityKind::Quest, "q1"));
        assert!(!pinned.toggle(EntityKind::Quest, "q1", "The Lost Bell"));
        assert!(pinned.entries().is_empty());
    }

    #[test]
    fn entries_use_type_field() {
        let mut pinned = PinnedList::default();
        pinned.toggle(EntityKind::Shop, "s1", "Smithy");
        let json = serde_json::to_value(&pinned).unwrap();
        assert_eq!(json[0]["type"], "shop");
    }
}
