//! Static campaign content loaded from a directory of JSON files.
//!
//! Layout:
//! - `items.json`, `monsters.json`, `characters.json`, `shops.json`,
//!   `quests.json`: arrays of freeform records, each with an `id` and `name`
//! - `dolmenwood-calendar.json` (optional): replaces the built-in calendar

use async_trait::async_trait;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;

use vault_domain::{CalendarDefinition, EntityKind, MonsterTemplate, PartyMember};

use crate::infrastructure::ports::{ContentError, ContentSourcePort};

pub const CALENDAR_FILE: &str = "dolmenwood-calendar.json";

/// Hit points given to PCs whose record has none
const DEFAULT_PC_HP: i32 = 10;

// =============================================================================
// Records
// =============================================================================

/// One freeform content record.
///
/// Only `id` and `name` are interpreted up front; everything else is kept
/// as raw JSON and read on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

impl EntityRecord {
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Integer field, accepting numeric strings too.
    pub fn int_field(&self, key: &str) -> Option<i64> {
        match self.fields.get(key)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Renders a scalar field as text ("2", "3*", "1+1").
    fn text_field(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn monster_template(&self) -> MonsterTemplate {
        MonsterTemplate {
            monster_id: self.id.clone(),
            name: self.name.clone(),
            hd: self.text_field("hd"),
            hp: self.hp_field("hp"),
        }
    }

    /// The party member for a `type: "PC"` character record.
    ///
    /// Zero or missing HP falls back to max HP, then to 10. Current HP never
    /// starts above max.
    pub fn party_member(&self) -> Option<PartyMember> {
        if self.str_field("type") != Some("PC") {
            return None;
        }
        let max_hp = self.hp_field("max_hp").unwrap_or(DEFAULT_PC_HP);
        let current_hp = self.hp_field("current_hp").unwrap_or(max_hp).min(max_hp);
        let mut member = PartyMember::new(self.id.clone(), self.name.clone(), max_hp);
        member.current_hp = current_hp;
        member.race_class = self.str_field("race_class").map(str::to_string);
        Some(member)
    }

    fn hp_field(&self, key: &str) -> Option<i32> {
        self.int_field(key)
            .and_then(|v| i32::try_from(v).ok())
            .filter(|&v| v > 0)
    }
}

// =============================================================================
// Campaign content
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct CampaignContent {
    pub items: Vec<EntityRecord>,
    pub monsters: Vec<EntityRecord>,
    pub characters: Vec<EntityRecord>,
    pub shops: Vec<EntityRecord>,
    pub quests: Vec<EntityRecord>,
    /// Present only when the content directory overrides the calendar
    pub calendar: Option<CalendarDefinition>,
}

impl CampaignContent {
    pub fn collection(&self, kind: EntityKind) -> &[EntityRecord] {
        match kind {
            EntityKind::Item => &self.items,
            EntityKind::Monster => &self.monsters,
            EntityKind::Character => &self.characters,
            EntityKind::Shop => &self.shops,
            EntityKind::Quest => &self.quests,
        }
    }

    pub fn find(&self, kind: EntityKind, id: &str) -> Option<&EntityRecord> {
        self.collection(kind).iter().find(|r| r.id == id)
    }

    pub fn monster(&self, id: &str) -> Option<MonsterTemplate> {
        self.find(EntityKind::Monster, id)
            .map(EntityRecord::monster_template)
    }

    pub fn player_characters(&self) -> Vec<PartyMember> {
        self.characters
            .iter()
            .filter_map(EntityRecord::party_member)
            .collect()
    }

    /// The configured calendar, or the built-in Dolmenwood one.
    pub fn calendar_or_default(&self) -> CalendarDefinition {
        self.calendar.clone().unwrap_or_default()
    }
}

// =============================================================================
// Directory loader
// =============================================================================

/// Loads campaign content from a directory on disk.
pub struct FileContentSource {
    content_dir: PathBuf,
}

impl FileContentSource {
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
        }
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    /// Missing file is `Ok(None)`; anything else that goes wrong is fatal.
    async fn read_optional(
        &self,
        filename: &str,
    ) -> Result<Option<(PathBuf, String)>, ContentError> {
        let path = self.content_dir.join(filename);
        match fs::read_to_string(&path).await {
            Ok(text) => Ok(Some((path, text))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ContentError::Io { path, source }),
        }
    }

    async fn load_collection(&self, filename: &str) -> Result<Vec<EntityRecord>, ContentError> {
        let Some((path, text)) = self.read_optional(filename).await? else {
            tracing::warn!(file = filename, "Content file missing, using empty collection");
            return Ok(Vec::new());
        };

        let records: Vec<EntityRecord> =
            serde_json::from_str(&text).map_err(|source| ContentError::Json { path, source })?;
        tracing::debug!(file = filename, count = records.len(), "Loaded content collection");
        Ok(records)
    }

    async fn load_calendar(&self) -> Result<Option<CalendarDefinition>, ContentError> {
        let Some((path, text)) = self.read_optional(CALENDAR_FILE).await? else {
            return Ok(None);
        };

        let calendar: CalendarDefinition =
            serde_json::from_str(&text).map_err(|source| ContentError::Json {
                path: path.clone(),
                source,
            })?;
        calendar.validate().map_err(|e| ContentError::Invalid {
            path,
            message: e.to_string(),
        })?;
        Ok(Some(calendar))
    }
}

#[async_trait]
impl ContentSourcePort for FileContentSource {
    async fn load(&self) -> Result<CampaignContent, ContentError> {
        let (items, monsters, characters, shops, quests, calendar) = tokio::try_join!(
            self.load_collection("items.json"),
            self.load_collection("monsters.json"),
            self.load_collection("characters.json"),
            self.load_collection("shops.json"),
            self.load_collection("quests.json"),
            self.load_calendar(),
        )?;

        Ok(CampaignContent {
            items,
            monsters,
            characters,
            shops,
            quests,
            calendar,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, value: Value) {
        std::fs::write(dir.path().join(name), value.to_string()).unwrap();
    }

    mod records {
        use super::*;

        fn record(value: Value) -> EntityRecord {
            serde_json::from_value(value).unwrap()
        }

        #[test]
        fn numeric_ids_become_strings() {
            let r = record(json!({"id": 42, "name": "Lantern", "cost": "1gp"}));
            assert_eq!(r.id, "42");
            assert_eq!(r.str_field("cost"), Some("1gp"));
        }

        #[test]
        fn monster_template_reads_hd_and_hp() {
            let r = record(json!({"id": "gob", "name": "Goblin", "hd": 1}));
            let template = r.monster_template();
            assert_eq!(template.hd.as_deref(), Some("1"));
            assert_eq!(template.hp, None);
            assert_eq!(template.max_hp(), 8);

            let r = record(json!({"id": "ogre", "name": "Ogre", "hd": "4+1", "hp": "25"}));
            assert_eq!(r.monster_template().max_hp(), 25);
        }

        #[test]
        fn only_pcs_become_party_members() {
            let npc = record(json!({"id": "n1", "name": "Mossy", "type": "NPC"}));
            assert!(npc.party_member().is_none());

            let pc = record(json!({
                "id": "p1", "name": "Ardent", "type": "PC",
                "max_hp": 12, "race_class": "Elf Knight"
            }));
            let member = pc.party_member().unwrap();
            assert_eq!((member.current_hp, member.max_hp), (12, 12));
            assert_eq!(member.race_class.as_deref(), Some("Elf Knight"));

            let bare = record(json!({
                "id": "p2", "name": "Bramble", "type": "PC", "current_hp": 0
            }));
            let member = bare.party_member().unwrap();
            assert_eq!((member.current_hp, member.max_hp), (10, 10));
        }

        #[test]
        fn current_hp_is_capped_at_max() {
            let pc = record(json!({
                "id": "p3", "name": "Wren", "type": "PC", "max_hp": 9, "current_hp": 40
            }));
            let member = pc.party_member().unwrap();
            assert_eq!((member.current_hp, member.max_hp), (9, 9));

            let hurt = record(json!({
                "id": "p4", "name": "Tansy", "type": "PC", "max_hp": 9, "current_hp": 4
            }));
            assert_eq!(hurt.party_member().unwrap().current_hp, 4);
        }
    }

    mod loading {
        use super::*;

        #[tokio::test]
        async fn missing_collections_are_empty() {
            let dir = TempDir::new().unwrap();
            write(&dir, "monsters.json", json!([{"id": "gob", "name": "Goblin", "hd": "1"}]));

            let content = FileContentSource::new(dir.path()).load().await.unwrap();
            assert_eq!(content.monsters.len(), 1);
            assert!(content.items.is_empty());
            assert!(content.calendar.is_none());
            assert_eq!(content.calendar_or_default().month_count(), 12);
            assert!(content.monster("gob").is_some());
            assert!(content.monster("ghoul").is_none());
        }

        #[tokio::test]
        async fn malformed_collection_is_fatal() {
            let dir = TempDir::new().unwrap();
            std::fs::write(dir.path().join("quests.json"), "[{\"id\": ").unwrap();

            let err = FileContentSource::new(dir.path()).load().await.unwrap_err();
            assert!(matches!(err, ContentError::Json { .. }));
            assert!(err.to_string().contains("quests.json"));
        }

        #[tokio::test]
        async fn calendar_override_is_validated() {
            let dir = TempDir::new().unwrap();
            write(
                &dir,
                CALENDAR_FILE,
                json!({"weekDays": ["One"], "months": []}),
            );

            let err = FileContentSource::new(dir.path()).load().await.unwrap_err();
            assert!(matches!(err, ContentError::Invalid { .. }));
        }

        #[tokio::test]
        async fn calendar_override_round_trips_builtin() {
            let dir = TempDir::new().unwrap();
            let builtin = CalendarDefinition::dolmenwood();
            write(&dir, CALENDAR_FILE, serde_json::to_value(&builtin).unwrap());

            let content = FileContentSource::new(dir.path()).load().await.unwrap();
            assert_eq!(content.calendar, Some(builtin));
        }

        #[tokio::test]
        async fn party_comes_from_pc_characters() {
            let dir = TempDir::new().unwrap();
            write(
                &dir,
                "characters.json",
                json!([
                    {"id": "p1", "name": "Ardent", "type": "PC", "max_hp": 9},
                    {"id": "n1", "name": "Mossy", "type": "NPC"}
                ]),
            );

            let content = FileContentSource::new(dir.path()).load().await.unwrap();
            let party = content.player_characters();
            assert_eq!(party.len(), 1);
            assert_eq!(party[0].name, "Ardent");
        }
    }
}
