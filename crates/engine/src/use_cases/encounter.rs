//! Encounter use cases.
//!
//! Wraps the encounter tracker with persistence, the loaded campaign
//! content (party and monster stats) and the configured initiative dice.

use std::collections::HashMap;
use std::sync::Arc;

use vault_domain::{
    CombatantRef, DiceFormula, EncounterId, EncounterPhase, EncounterState, InitiativeEntry,
    PartyMember, RoundOutcome, TurnOutcome,
};

use crate::infrastructure::clock::range_fn;
use crate::infrastructure::content::CampaignContent;
use crate::infrastructure::persistence::SnapshotStore;
use crate::infrastructure::ports::{ClockPort, RandomPort};

pub struct EncounterService {
    state: EncounterState,
    content: Arc<CampaignContent>,
    initiative_dice: DiceFormula,
    store: SnapshotStore,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
}

impl EncounterService {
    /// Restores the saved encounter. An empty party is filled from the
    /// campaign's player characters.
    pub fn load(
        content: Arc<CampaignContent>,
        initiative_dice: DiceFormula,
        store: SnapshotStore,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        let mut service = Self {
            state: store.load_or_default(),
            content,
            initiative_dice,
            store,
            clock,
            random,
        };
        if service.fill_party() > 0 {
            service.save();
        }
        tracing::info!(
            name = %service.state.name,
            phase = %service.state.phase(),
            party = service.state.party.len(),
            squads = service.state.monsters.len(),
            "Encounter loaded"
        );
        service
    }

    pub fn state(&self) -> &EncounterState {
        &self.state
    }

    pub fn phase(&self) -> EncounterPhase {
        self.state.phase()
    }

    pub fn current_entry(&self) -> Option<&InitiativeEntry> {
        self.state.current_entry()
    }

    fn save(&self) {
        self.store.save(&self.state);
    }

    fn fill_party(&mut self) -> usize {
        self.state
            .populate_party_if_empty(self.content.player_characters())
    }

    // =========================================================================
    // Setup
    // =========================================================================

    /// Discards the current encounter, log included.
    pub fn new_encounter(&mut self) -> EncounterId {
        let id = EncounterId::from_uuid(self.random.gen_uuid());
        self.state = EncounterState::new(id);
        self.fill_party();
        self.save();
        tracing::info!(encounter_id = %id, "New encounter started");
        id
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.state.rename(name, self.clock.now());
        self.save();
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.state.set_location(location);
        self.save();
    }

    pub fn add_party_member(&mut self, member: PartyMember) -> bool {
        let added = self.state.add_party_member(member, self.clock.now());
        if added {
            self.save();
        }
        added
    }

    /// Adds `count` of a monster from the content. Unknown ids do nothing.
    pub fn add_monster(&mut self, monster_id: &str, count: u32) -> bool {
        let Some(template) = self.content.monster(monster_id) else {
            tracing::debug!(monster_id, "Ignored unknown monster");
            return false;
        };
        self.state
            .add_monster_squad(&template, count, self.clock.now());
        self.save();
        tracing::info!(monster = %template.name, count = count.max(1), "Monsters added");
        true
    }

    // =========================================================================
    // Initiative
    // =========================================================================

    /// Builds the turn order from rolls entered at the table.
    pub fn roll_initiative(
        &mut self,
        pc_rolls: &HashMap<String, i32>,
        squad_rolls: &HashMap<String, i32>,
    ) {
        self.state
            .roll_initiative(pc_rolls, squad_rolls, self.clock.now());
        self.save();
        self.log_combat_start();
    }

    /// Rolls the configured dice once per PC and once per squad.
    pub fn roll_initiative_auto(&mut self) {
        let now = self.clock.now();
        let mut rng = range_fn(self.random.as_ref());
        self.state
            .roll_initiative_with(&self.initiative_dice, &mut rng, now);
        self.save();
        self.log_combat_start();
    }

    fn log_combat_start(&self) {
        tracing::info!(
            combatants = self.state.initiative.len(),
            first = ?self.state.current_entry().map(InitiativeEntry::label),
            "Combat started"
        );
    }

    pub fn next_turn(&mut self) -> TurnOutcome {
        let outcome = self.state.next_turn(self.clock.now());
        if outcome == TurnOutcome::NoInitiative {
            return outcome;
        }
        self.save();
        if let TurnOutcome::NewRound(round) = outcome {
            self.log_round(round);
        }
        outcome
    }

    pub fn new_round(&mut self) -> RoundOutcome {
        let outcome = self.state.new_round(self.clock.now());
        self.save();
        self.log_round(outcome);
        outcome
    }

    fn log_round(&self, outcome: RoundOutcome) {
        match outcome.first_active {
            Some(_) => tracing::info!(round = outcome.round, "New round"),
            None => tracing::info!(round = outcome.round, "New round with no active combatants"),
        }
    }

    // =========================================================================
    // Combatants
    // =========================================================================

    pub fn adjust_hp(&mut self, target: &CombatantRef, delta: i32) -> Option<i32> {
        let hp = self.state.adjust_hp(target, delta, self.clock.now())?;
        self.save();
        Some(hp)
    }

    pub fn set_hp(&mut self, target: &CombatantRef, value: i32) -> Option<i32> {
        let hp = self.state.set_hp(target, value, self.clock.now())?;
        self.save();
        Some(hp)
    }

    pub fn toggle_defeat(&mut self, monster_id: &str, instance_id: u32) -> Option<bool> {
        let defeated = self
            .state
            .toggle_defeat(monster_id, instance_id, self.clock.now())?;
        self.save();
        Some(defeated)
    }

    pub fn add_condition(&mut self, character_id: &str, condition: &str) -> bool {
        let added = self
            .state
            .add_condition(character_id, condition, self.clock.now());
        if added {
            self.save();
        }
        added
    }

    pub fn remove_condition(&mut self, character_id: &str, condition: &str) -> bool {
        let removed = self
            .state
            .remove_condition(character_id, condition, self.clock.now());
        if removed {
            self.save();
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::{FixedClock, ScriptedRandom};
    use crate::infrastructure::content::EntityRecord;
    use crate::infrastructure::persistence::ENCOUNTER_KEY;
    use crate::infrastructure::ports::{MockRandomPort, StoragePort};
    use crate::infrastructure::storage::InMemoryStorage;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use uuid::Uuid;

    fn record(value: serde_json::Value) -> EntityRecord {
        serde_json::from_value(value).unwrap()
    }

    fn content() -> Arc<CampaignContent> {
        Arc::new(CampaignContent {
            monsters: vec![
                record(json!({"id": "goblin", "name": "Goblin", "hd": "1"})),
                record(json!({"id": "ogre", "name": "Ogre", "hd": "4+1", "hp": 22})),
            ],
            characters: vec![
                record(json!({"id": "pc-1", "name": "Ardent", "type": "PC", "max_hp": 12})),
                record(json!({"id": "pc-2", "name": "Bramble", "type": "PC", "max_hp": 7})),
                record(json!({"id": "npc-1", "name": "Mossy", "type": "NPC"})),
            ],
            ..CampaignContent::default()
        })
    }

    fn service(storage: Arc<InMemoryStorage>, random: Arc<dyn RandomPort>) -> EncounterService {
        EncounterService::load(
            content(),
            DiceFormula::ONE_D6,
            SnapshotStore::new(storage),
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 5, 4, 20, 0, 0).unwrap())),
            random,
        )
    }

    fn saved(storage: &Arc<InMemoryStorage>) -> EncounterState {
        SnapshotStore::new(storage.clone()).load().unwrap()
    }

    #[test]
    fn empty_party_is_filled_from_pcs() {
        let storage = Arc::new(InMemoryStorage::new());
        let service = service(storage.clone(), Arc::new(ScriptedRandom::new([1])));

        let names: Vec<&str> = service.state().party.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Ardent", "Bramble"]);
        assert_eq!(saved(&storage).party.len(), 2);
    }

    #[test]
    fn saved_party_is_kept() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut state = EncounterState::default();
        state.party.push(PartyMember::new("pc-9", "Wren", 5));
        storage.save(ENCOUNTER_KEY, &serde_json::to_string(&state).unwrap());

        let service = service(storage, Arc::new(ScriptedRandom::new([1])));
        assert_eq!(service.state().party.len(), 1);
        assert_eq!(service.state().party[0].name, "Wren");
    }

    #[test]
    fn unknown_monster_is_ignored() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut service = service(storage, Arc::new(ScriptedRandom::new([1])));
        assert!(!service.add_monster("dragon", 1));
        assert!(service.state().monsters.is_empty());
    }

    #[test]
    fn monsters_use_content_stats() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut service = service(storage.clone(), Arc::new(ScriptedRandom::new([1])));
        assert!(service.add_monster("ogre", 2));
        assert!(service.add_monster("goblin", 0));

        let state = saved(&storage);
        assert_eq!(state.monsters[0].instances[0].max_hp, 22);
        assert_eq!(state.monsters[1].instances.len(), 1);
        assert_eq!(state.monsters[1].instances[0].max_hp, 8);
    }

    #[test]
    fn auto_initiative_rolls_configured_dice() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut service = service(storage.clone(), Arc::new(ScriptedRandom::new([2, 5, 4])));
        service.add_monster("goblin", 2);
        service.roll_initiative_auto();

        let order: Vec<String> = service
            .state()
            .initiative
            .iter()
            .map(InitiativeEntry::label)
            .collect();
        assert_eq!(order, vec!["Bramble", "Goblin #1", "Goblin #2", "Ardent"]);
        assert_eq!(service.phase(), EncounterPhase::InCombat);
        assert_eq!(saved(&storage).initiative.len(), 4);
    }

    #[test]
    fn turns_persist_and_skip_defeated() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut service = service(storage.clone(), Arc::new(ScriptedRandom::new([6, 1, 3])));
        service.add_monster("goblin", 1);
        service.roll_initiative_auto();
        // Order: Ardent (6), Goblin #1 (3), Bramble (1)
        assert_eq!(service.adjust_hp(&CombatantRef::monster("goblin", 1), -50), Some(0));

        assert_eq!(service.next_turn(), TurnOutcome::Turn(2));
        assert!(matches!(
            service.next_turn(),
            TurnOutcome::NewRound(RoundOutcome { round: 2, .. })
        ));
        assert_eq!(saved(&storage).round, 2);
    }

    #[test]
    fn next_turn_before_initiative_does_not_write() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut service = service(storage.clone(), Arc::new(ScriptedRandom::new([1])));
        storage.remove(ENCOUNTER_KEY);

        assert_eq!(service.next_turn(), TurnOutcome::NoInitiative);
        assert!(storage.load(ENCOUNTER_KEY).is_none());
    }

    #[test]
    fn new_encounter_takes_id_from_random_port() {
        let mut random = MockRandomPort::new();
        random
            .expect_gen_uuid()
            .times(1)
            .returning(|| Uuid::from_u128(7));

        let storage = Arc::new(InMemoryStorage::new());
        let mut service = service(storage.clone(), Arc::new(random));
        service.add_condition("pc-1", "Blessed");

        let id = service.new_encounter();
        assert_eq!(id, EncounterId::from_uuid(Uuid::from_u128(7)));
        let state = saved(&storage);
        assert_eq!(state.id, Some(id));
        assert!(state.log.is_empty());
        assert!(state.party[0].conditions.is_empty());
    }
}
