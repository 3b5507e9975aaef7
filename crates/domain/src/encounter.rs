//! Encounter and initiative tracking
//!
//! An encounter starts in setup (party and monster squads, no initiative
//! order). Rolling initiative expands the party and every monster instance
//! into a sorted turn order and starts round 1. Turns then advance around
//! the order, skipping defeated combatants, with a new round each time the
//! order wraps.
//!
//! Unknown ids are no-ops everywhere: this runs at the table mid-combat,
//! where ignoring a stale click beats failing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::dice::DiceFormula;
use crate::ids::EncounterId;

/// Conditions offered in the picker. Any other string is accepted too.
pub const STANDARD_CONDITIONS: [&str; 10] = [
    "Blessed",
    "Frightened",
    "Poisoned",
    "Stunned",
    "Prone",
    "Invisible",
    "Concentrating",
    "Inspired",
    "Deafened",
    "Charmed",
];

/// Hit points per hit die when a monster has no explicit HP.
const HP_PER_HIT_DIE: i32 = 4;
const HP_BONUS: i32 = 4;

// ============================================================================
// Combatants
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyMember {
    pub character_id: String,
    pub name: String,
    pub current_hp: i32,
    pub max_hp: i32,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub initiative: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race_class: Option<String>,
}

impl PartyMember {
    pub fn new(character_id: impl Into<String>, name: impl Into<String>, max_hp: i32) -> Self {
        Self {
            character_id: character_id.into(),
            name: name.into(),
            current_hp: max_hp,
            max_hp,
            conditions: Vec::new(),
            initiative: 0,
            race_class: None,
        }
    }

    pub fn has_condition(&self, condition: &str) -> bool {
        self.conditions.iter().any(|c| c == condition)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterInstance {
    pub id: u32,
    pub current_hp: i32,
    pub max_hp: i32,
    #[serde(default)]
    pub defeated: bool,
}

/// All instances of one monster type in the encounter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterSquad {
    pub monster_id: String,
    pub name: String,
    pub instances: Vec<MonsterInstance>,
    #[serde(default)]
    pub initiative: i32,
}

impl MonsterSquad {
    fn next_instance_id(&self) -> u32 {
        self.instances.iter().map(|i| i.id).max().unwrap_or(0) + 1
    }

    pub fn active_count(&self) -> usize {
        self.instances.iter().filter(|i| !i.defeated).count()
    }
}

/// The stats needed to field a monster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonsterTemplate {
    pub monster_id: String,
    pub name: String,
    /// Hit dice notation, e.g. "2", "3*", "1+1"
    pub hd: Option<String>,
    pub hp: Option<i32>,
}

impl MonsterTemplate {
    /// First run of digits in the HD notation, 1 when there is none.
    pub fn hit_dice(&self) -> i32 {
        self.hd
            .as_deref()
            .and_then(leading_integer)
            .unwrap_or(1)
    }

    /// Explicit HP when given, otherwise HD × 4 + 4.
    pub fn max_hp(&self) -> i32 {
        match self.hp {
            Some(hp) if hp > 0 => hp,
            _ => self.hit_dice() * HP_PER_HIT_DIE + HP_BONUS,
        }
    }
}

fn leading_integer(text: &str) -> Option<i32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombatantKind {
    Pc,
    Monster,
}

/// One slot in the turn order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeEntry {
    #[serde(rename = "type")]
    pub kind: CombatantKind,
    pub ref_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<u32>,
    pub name: String,
    pub init: i32,
    #[serde(default)]
    pub defeated: bool,
}

impl InitiativeEntry {
    /// "Goblin #2" for monster instances, the name for PCs.
    pub fn label(&self) -> String {
        match self.instance_id {
            Some(id) => format!("{} #{}", self.name, id),
            None => self.name.clone(),
        }
    }
}

/// Points at a party member or a monster instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombatantRef {
    Pc(String),
    Monster { monster_id: String, instance_id: u32 },
}

impl CombatantRef {
    pub fn pc(character_id: impl Into<String>) -> Self {
        Self::Pc(character_id.into())
    }

    pub fn monster(monster_id: impl Into<String>, instance_id: u32) -> Self {
        Self::Monster {
            monster_id: monster_id.into(),
            instance_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatLogLine {
    pub round: u32,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Phase and outcomes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterPhase {
    /// No initiative order yet
    Setup,
    InCombat,
    /// Every combatant in the order is defeated
    NoActiveCombatants,
}

impl EncounterPhase {
    pub fn display_name(&self) -> &'static str {
        match self {
            EncounterPhase::Setup => "Setup",
            EncounterPhase::InCombat => "In Combat",
            EncounterPhase::NoActiveCombatants => "No Active Combatants",
        }
    }
}

impl fmt::Display for EncounterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Initiative has not been rolled
    NoInitiative,
    /// Moved to the entry at this index in the same round
    Turn(usize),
    /// The order wrapped and a new round began
    NewRound(RoundOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundOutcome {
    pub round: u32,
    /// First active entry, `None` when everyone is defeated
    pub first_active: Option<usize>,
}

// ============================================================================
// EncounterState
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterState {
    #[serde(default)]
    pub id: Option<EncounterId>,
    pub name: String,
    #[serde(default)]
    pub location: String,
    pub round: u32,
    pub current_turn: usize,
    #[serde(default)]
    pub party: Vec<PartyMember>,
    #[serde(default)]
    pub monsters: Vec<MonsterSquad>,
    #[serde(default)]
    pub initiative: Vec<InitiativeEntry>,
    #[serde(default)]
    pub log: Vec<CombatLogLine>,
}

impl Default for EncounterState {
    fn default() -> Self {
        Self {
            id: None,
            name: "New Encounter".to_string(),
            location: String::new(),
            round: 1,
            current_turn: 0,
            party: Vec::new(),
            monsters: Vec::new(),
            initiative: Vec::new(),
            log: Vec::new(),
        }
    }
}

impl EncounterState {
    /// A fresh encounter. Everything, the log included, starts empty.
    pub fn new(id: EncounterId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn phase(&self) -> EncounterPhase {
        if self.initiative.is_empty() {
            EncounterPhase::Setup
        } else if self.initiative.iter().all(|e| e.defeated) {
            EncounterPhase::NoActiveCombatants
        } else {
            EncounterPhase::InCombat
        }
    }

    pub fn current_entry(&self) -> Option<&InitiativeEntry> {
        self.initiative.get(self.current_turn)
    }

    fn push_log(&mut self, text: impl Into<String>, now: DateTime<Utc>) {
        self.log.push(CombatLogLine {
            round: self.round,
            text: text.into(),
            timestamp: now,
        });
    }

    // ------------------------------------------------------------------------
    // Setup
    // ------------------------------------------------------------------------

    pub fn rename(&mut self, name: impl Into<String>, now: DateTime<Utc>) {
        let name = name.into();
        if name == self.name {
            return;
        }
        self.push_log(format!("Encounter renamed to {}", name), now);
        self.name = name;
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = location.into();
    }

    /// Adds a PC. Returns `false` if that character is already in the party.
    pub fn add_party_member(&mut self, member: PartyMember, now: DateTime<Utc>) -> bool {
        if self.party.iter().any(|p| p.character_id == member.character_id) {
            return false;
        }
        self.push_log(format!("{} joins the party", member.name), now);
        self.party.push(member);
        true
    }

    /// Fills an empty party. Does nothing once anyone is in it.
    pub fn populate_party_if_empty(
        &mut self,
        members: impl IntoIterator<Item = PartyMember>,
    ) -> usize {
        if !self.party.is_empty() {
            return 0;
        }
        self.party.extend(members);
        self.party.len()
    }

    /// Adds `count` instances of a monster. A squad that already exists
    /// keeps growing, with instance ids continuing from its highest.
    pub fn add_monster_squad(
        &mut self,
        template: &MonsterTemplate,
        count: u32,
        now: DateTime<Utc>,
    ) {
        let count = count.max(1);
        let max_hp = template.max_hp();

        let squad = match self
            .monsters
            .iter()
            .position(|m| m.monster_id == template.monster_id)
        {
            Some(index) => &mut self.monsters[index],
            None => {
                self.monsters.push(MonsterSquad {
                    monster_id: template.monster_id.clone(),
                    name: template.name.clone(),
                    instances: Vec::new(),
                    initiative: 0,
                });
                let last = self.monsters.len() - 1;
                &mut self.monsters[last]
            }
        };

        let first_id = squad.next_instance_id();
        squad.instances.extend((0..count).map(|offset| MonsterInstance {
            id: first_id + offset,
            current_hp: max_hp,
            max_hp,
            defeated: false,
        }));

        self.push_log(format!("Added {}× {}", count, template.name), now);
    }

    // ------------------------------------------------------------------------
    // Initiative
    // ------------------------------------------------------------------------

    /// Builds the turn order from one roll per PC and one per squad.
    ///
    /// Missing rolls count as 0. Entries are sorted by roll, highest first,
    /// keeping party-then-squad order among ties. Starts round 1 at the top.
    pub fn roll_initiative(
        &mut self,
        pc_rolls: &HashMap<String, i32>,
        squad_rolls: &HashMap<String, i32>,
        now: DateTime<Utc>,
    ) {
        let mut order = Vec::new();

        for pc in &mut self.party {
            pc.initiative = pc_rolls.get(&pc.character_id).copied().unwrap_or(0);
            order.push(InitiativeEntry {
                kind: CombatantKind::Pc,
                ref_id: pc.character_id.clone(),
                instance_id: None,
                name: pc.name.clone(),
                init: pc.initiative,
                defeated: false,
            });
        }

        for squad in &mut self.monsters {
            squad.initiative = squad_rolls.get(&squad.monster_id).copied().unwrap_or(0);
            order.extend(squad.instances.iter().map(|inst| InitiativeEntry {
                kind: CombatantKind::Monster,
                ref_id: squad.monster_id.clone(),
                instance_id: Some(inst.id),
                name: squad.name.clone(),
                init: squad.initiative,
                defeated: inst.defeated,
            }));
        }

        // sort_by is stable
        order.sort_by(|a, b| b.init.cmp(&a.init));
        self.initiative = order;
        self.current_turn = 0;
        self.round = 1;
        self.push_log("Combat started! Round 1", now);
    }

    /// Rolls `formula` once per PC and once per squad, then builds the order.
    pub fn roll_initiative_with<R>(
        &mut self,
        formula: &DiceFormula,
        gen_range: &mut R,
        now: DateTime<Utc>,
    ) where
        R: FnMut(i32, i32) -> i32 + ?Sized,
    {
        let pc_rolls = self
            .party
            .iter()
            .map(|pc| (pc.character_id.clone(), formula.roll_with(gen_range).total))
            .collect();
        let squad_rolls = self
            .monsters
            .iter()
            .map(|squad| (squad.monster_id.clone(), formula.roll_with(gen_range).total))
            .collect();
        self.roll_initiative(&pc_rolls, &squad_rolls, now);
    }

    /// Advances to the next non-defeated entry, starting a new round when
    /// the order wraps. Tries at most one full lap.
    pub fn next_turn(&mut self, now: DateTime<Utc>) -> TurnOutcome {
        let len = self.initiative.len();
        if len == 0 {
            return TurnOutcome::NoInitiative;
        }

        let mut next = self.current_turn;
        let mut attempts = 0;
        loop {
            next = (next + 1) % len;
            attempts += 1;
            if !self.initiative[next].defeated || attempts >= len {
                break;
            }
        }

        if next <= self.current_turn {
            return TurnOutcome::NewRound(self.new_round(now));
        }

        self.current_turn = next;
        let label = self.initiative[next].label();
        self.push_log(format!("{}'s turn", label), now);
        TurnOutcome::Turn(next)
    }

    /// Increments the round and moves to the first non-defeated entry.
    ///
    /// With nobody left standing the turn rests on index 0 and the
    /// encounter reports `NoActiveCombatants`.
    pub fn new_round(&mut self, now: DateTime<Utc>) -> RoundOutcome {
        self.round += 1;
        let first_active = self.initiative.iter().position(|e| !e.defeated);
        self.current_turn = first_active.unwrap_or(0);

        match first_active {
            Some(_) => self.push_log(format!("--- Round {} ---", self.round), now),
            None => self.push_log(
                format!("--- Round {} --- (no active combatants)", self.round),
                now,
            ),
        }

        RoundOutcome {
            round: self.round,
            first_active,
        }
    }

    // ------------------------------------------------------------------------
    // Hit points and defeat
    // ------------------------------------------------------------------------

    /// Applies damage (negative) or healing (positive).
    ///
    /// Both PCs and monster instances stay within `[0, max_hp]`, whatever
    /// the size of `delta`. A monster reaching 0 is marked defeated; healing
    /// never revives it.
    pub fn adjust_hp(
        &mut self,
        target: &CombatantRef,
        delta: i32,
        now: DateTime<Utc>,
    ) -> Option<i32> {
        if delta == 0 {
            return None;
        }
        let verb = |delta: i32| {
            if delta < 0 {
                format!("takes {} damage", delta.unsigned_abs())
            } else {
                format!("heals {}", delta)
            }
        };

        match target {
            CombatantRef::Pc(character_id) => {
                let pc = self.party.iter_mut().find(|p| &p.character_id == character_id)?;
                pc.current_hp = pc
                    .current_hp
                    .saturating_add(delta)
                    .clamp(0, pc.max_hp.max(0));
                let (hp, text) = (
                    pc.current_hp,
                    format!("{} {} ({}/{} HP)", pc.name, verb(delta), pc.current_hp, pc.max_hp),
                );
                self.push_log(text, now);
                Some(hp)
            }
            CombatantRef::Monster {
                monster_id,
                instance_id,
            } => {
                let (name, instance) = self.monster_instance_mut(monster_id, *instance_id)?;
                instance.current_hp = instance
                    .current_hp
                    .saturating_add(delta)
                    .min(instance.max_hp)
                    .max(0);
                let hp = instance.current_hp;
                let text = format!(
                    "{} #{} {} ({}/{} HP)",
                    name,
                    instance_id,
                    verb(delta),
                    hp,
                    instance.max_hp
                );
                self.push_log(text, now);
                self.defeat_if_down(monster_id, *instance_id, now);
                Some(hp)
            }
        }
    }

    /// Sets HP directly. PCs are clamped to `[0, max_hp]`. Monsters only
    /// floor at 0, leaving room to enter temporary HP.
    pub fn set_hp(
        &mut self,
        target: &CombatantRef,
        value: i32,
        now: DateTime<Utc>,
    ) -> Option<i32> {
        match target {
            CombatantRef::Pc(character_id) => {
                let pc = self.party.iter_mut().find(|p| &p.character_id == character_id)?;
                pc.current_hp = value.clamp(0, pc.max_hp.max(0));
                let hp = pc.current_hp;
                let text = format!("{} HP set to {}", pc.name, hp);
                self.push_log(text, now);
                Some(hp)
            }
            CombatantRef::Monster {
                monster_id,
                instance_id,
            } => {
                let (name, instance) = self.monster_instance_mut(monster_id, *instance_id)?;
                instance.current_hp = value.max(0);
                let hp = instance.current_hp;
                let text = format!("{} #{} HP set to {}", name, instance_id, hp);
                self.push_log(text, now);
                self.defeat_if_down(monster_id, *instance_id, now);
                Some(hp)
            }
        }
    }

    /// Flips an instance's defeated flag and its initiative mirror.
    ///
    /// Returns the new flag, or `None` for an unknown instance.
    pub fn toggle_defeat(
        &mut self,
        monster_id: &str,
        instance_id: u32,
        now: DateTime<Utc>,
    ) -> Option<bool> {
        let (name, instance) = self.monster_instance_mut(monster_id, instance_id)?;
        instance.defeated = !instance.defeated;
        let defeated = instance.defeated;
        self.mirror_defeat(monster_id, instance_id, defeated);
        let status = if defeated { "defeated!" } else { "revived" };
        self.push_log(format!("{} #{} {}", name, instance_id, status), now);
        Some(defeated)
    }

    fn defeat_if_down(&mut self, monster_id: &str, instance_id: u32, now: DateTime<Utc>) {
        let down = self
            .monster_instance_mut(monster_id, instance_id)
            .is_some_and(|(_, inst)| inst.current_hp <= 0 && !inst.defeated);
        if down {
            self.toggle_defeat(monster_id, instance_id, now);
        }
    }

    fn mirror_defeat(&mut self, monster_id: &str, instance_id: u32, defeated: bool) {
        if let Some(entry) = self.initiative.iter_mut().find(|e| {
            e.kind == CombatantKind::Monster
                && e.ref_id == monster_id
                && e.instance_id == Some(instance_id)
        }) {
            entry.defeated = defeated;
        }
    }

    fn monster_instance_mut(
        &mut self,
        monster_id: &str,
        instance_id: u32,
    ) -> Option<(String, &mut MonsterInstance)> {
        let squad = self.monsters.iter_mut().find(|m| m.monster_id == monster_id)?;
        let name = squad.name.clone();
        let instance = squad.instances.iter_mut().find(|i| i.id == instance_id)?;
        Some((name, instance))
    }

    // ------------------------------------------------------------------------
    // Conditions
    // ------------------------------------------------------------------------

    /// Returns `false` for unknown PCs and conditions they already have.
    pub fn add_condition(
        &mut self,
        character_id: &str,
        condition: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(pc) = self.party.iter_mut().find(|p| p.character_id == character_id) else {
            return false;
        };
        if pc.has_condition(condition) {
            return false;
        }
        pc.conditions.push(condition.to_string());
        let text = format!("{} gains {}", pc.name, condition);
        self.push_log(text, now);
        true
    }

    /// Logs the removal for any known PC, even one without the condition.
    ///
    /// Returns `false` only for unknown PCs.
    pub fn remove_condition(
        &mut self,
        character_id: &str,
        condition: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(pc) = self.party.iter_mut().find(|p| p.character_id == character_id) else {
            return false;
        };
        pc.conditions.retain(|c| c != condition);
        let text = format!("{} loses {}", pc.name, condition);
        self.push_log(text, now);
        true
    }
}
