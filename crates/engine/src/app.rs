//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    content::CampaignContent,
    persistence::SnapshotStore,
    ports::{ClockPort, ContentError, ContentSourcePort, RandomPort, StoragePort},
    settings::Settings,
};
use crate::use_cases::{BookmarkService, CalendarService, EncounterService, ScratchpadService};

/// Main application state.
///
/// Holds the loaded content and one service per persisted concern.
pub struct App {
    pub content: Arc<CampaignContent>,
    pub calendar: CalendarService,
    pub encounter: EncounterService,
    pub scratchpad: ScratchpadService,
    pub bookmarks: BookmarkService,
}

impl App {
    /// Loads content, then restores every service from storage.
    ///
    /// Content errors are fatal; storage problems fall back to defaults.
    pub async fn load(
        settings: &Settings,
        content_source: &dyn ContentSourcePort,
        storage: Arc<dyn StoragePort>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Result<Self, ContentError> {
        let content = Arc::new(content_source.load().await?);
        tracing::info!(
            items = content.items.len(),
            monsters = content.monsters.len(),
            characters = content.characters.len(),
            shops = content.shops.len(),
            quests = content.quests.len(),
            custom_calendar = content.calendar.is_some(),
            "Campaign content loaded"
        );

        let store = SnapshotStore::new(storage);

        let calendar = CalendarService::load(
            content.calendar_or_default(),
            store.clone(),
            clock.clone(),
            random.clone(),
        );
        let encounter = EncounterService::load(
            content.clone(),
            settings.initiative_dice,
            store.clone(),
            clock.clone(),
            random.clone(),
        );
        let scratchpad =
            ScratchpadService::load(settings.autosave_delay, store.clone(), clock.clone(), random);
        let bookmarks = BookmarkService::load(store, clock);

        Ok(Self {
            content,
            calendar,
            encounter,
            scratchpad,
            bookmarks,
        })
    }

    /// Commits anything still waiting on the autosave delay.
    pub fn shutdown(&mut self) {
        if self.scratchpad.has_pending_changes() {
            self.scratchpad.save_now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::{FixedClock, ScriptedRandom};
    use crate::infrastructure::persistence::{CALENDAR_KEY, ENCOUNTER_KEY, SESSIONS_KEY};
    use crate::infrastructure::ports::MockContentSourcePort;
    use crate::infrastructure::storage::InMemoryStorage;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn clock() -> Arc<dyn ClockPort> {
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 5, 4, 20, 0, 0).unwrap()))
    }

    #[tokio::test]
    async fn load_restores_every_document() {
        let mut source = MockContentSourcePort::new();
        source
            .expect_load()
            .times(1)
            .returning(|| Ok(CampaignContent::default()));
        let storage = Arc::new(InMemoryStorage::new());

        let mut app = App::load(
            &Settings::default(),
            &source,
            storage.clone(),
            clock(),
            Arc::new(ScriptedRandom::new([4])),
        )
        .await
        .unwrap();

        assert!(storage.load(CALENDAR_KEY).is_some());
        assert!(storage.load(SESSIONS_KEY).is_some());
        assert!(storage.load(ENCOUNTER_KEY).is_none());

        app.scratchpad.edit_content("pending");
        app.shutdown();
        assert_eq!(app.scratchpad.history().sessions()[0].content, "pending");
    }

    #[tokio::test]
    async fn content_errors_are_fatal() {
        let mut source = MockContentSourcePort::new();
        source.expect_load().returning(|| {
            Err(ContentError::Invalid {
                path: PathBuf::from("data/dolmenwood-calendar.json"),
                message: "a year has 12 months, found 3".into(),
            })
        });

        let result = App::load(
            &Settings::default(),
            &source,
            Arc::new(InMemoryStorage::new()),
            clock(),
            Arc::new(ScriptedRandom::new([4])),
        )
        .await;
        assert!(matches!(result, Err(ContentError::Invalid { .. })));
    }
}
