//! Moon phases and moon signs
//!
//! Every month has a new-moon and a full-moon day. Those drive two things:
//! the 8-step visual phase shown on the calendar grid, and the three-slot
//! lunar phase (waxing, full, waning) that selects which moon sign is in
//! effect. Each month of a year gets one sign per slot, rolled up front.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::calendar::{CalendarDefinition, MonthDefinition};

// ============================================================================
// MoonPhase
// ============================================================================

/// The eight visual phases of the moon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoonPhase {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl MoonPhase {
    const ORDER: [MoonPhase; 8] = [
        MoonPhase::NewMoon,
        MoonPhase::WaxingCrescent,
        MoonPhase::FirstQuarter,
        MoonPhase::WaxingGibbous,
        MoonPhase::FullMoon,
        MoonPhase::WaningGibbous,
        MoonPhase::LastQuarter,
        MoonPhase::WaningCrescent,
    ];

    /// Visual phase for a day of a month.
    ///
    /// Days since new moon are taken modulo 30 and spread over the eight
    /// phases on a 29-day cycle.
    pub fn for_day(month: &MonthDefinition, day: u8) -> Self {
        let since_new = (day as i32 - month.new_moon as i32 + 30).rem_euclid(30);
        let index = ((since_new * 8) / 29) % 8;
        Self::ORDER[index as usize]
    }

    pub fn index(&self) -> usize {
        Self::ORDER.iter().position(|p| p == self).unwrap_or(0)
    }

    pub fn icon(&self) -> &'static str {
        match self {
            MoonPhase::NewMoon => "🌑",
            MoonPhase::WaxingCrescent => "🌒",
            MoonPhase::FirstQuarter => "🌓",
            MoonPhase::WaxingGibbous => "🌔",
            MoonPhase::FullMoon => "🌕",
            MoonPhase::WaningGibbous => "🌖",
            MoonPhase::LastQuarter => "🌗",
            MoonPhase::WaningCrescent => "🌘",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MoonPhase::NewMoon => "New Moon",
            MoonPhase::WaxingCrescent => "Waxing Crescent",
            MoonPhase::FirstQuarter => "First Quarter",
            MoonPhase::WaxingGibbous => "Waxing Gibbous",
            MoonPhase::FullMoon => "Full Moon",
            MoonPhase::WaningGibbous => "Waning Gibbous",
            MoonPhase::LastQuarter => "Last Quarter",
            MoonPhase::WaningCrescent => "Waning Crescent",
        }
    }
}

impl fmt::Display for MoonPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.icon(), self.display_name())
    }
}

// ============================================================================
// LunarPhase
// ============================================================================

/// The three phase slots a moon sign can be rolled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LunarPhase {
    Waxing,
    Full,
    Waning,
}

impl LunarPhase {
    /// Full for the full-moon day and one day either side, waxing from the
    /// new moon up to that window, waning for everything else.
    pub fn for_day(month: &MonthDefinition, day: u8) -> Self {
        let day = day as i32;
        let (new_moon, full_moon) = (month.new_moon as i32, month.full_moon as i32);
        if (full_moon - 1..=full_moon + 1).contains(&day) {
            LunarPhase::Full
        } else if day >= new_moon && day < full_moon - 1 {
            LunarPhase::Waxing
        } else {
            LunarPhase::Waning
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            LunarPhase::Waxing => "Waxing",
            LunarPhase::Full => "Full",
            LunarPhase::Waning => "Waning",
        }
    }
}

impl fmt::Display for LunarPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// MoonSign
// ============================================================================

/// The twelve moon signs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoonSign {
    Grinning,
    Dead,
    Beast,
    Squamous,
    #[serde(rename = "Knight’s", alias = "Knight's")]
    Knights,
    Rotting,
    #[serde(rename = "Maiden’s", alias = "Maiden's")]
    Maidens,
    #[serde(rename = "Witch’s", alias = "Witch's")]
    Witchs,
    #[serde(rename = "Robber’s", alias = "Robber's")]
    Robbers,
    Goat,
    Narrow,
    Black,
}

impl MoonSign {
    pub const ALL: [MoonSign; 12] = [
        MoonSign::Grinning,
        MoonSign::Dead,
        MoonSign::Beast,
        MoonSign::Squamous,
        MoonSign::Knights,
        MoonSign::Rotting,
        MoonSign::Maidens,
        MoonSign::Witchs,
        MoonSign::Robbers,
        MoonSign::Goat,
        MoonSign::Narrow,
        MoonSign::Black,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            MoonSign::Grinning => "Grinning",
            MoonSign::Dead => "Dead",
            MoonSign::Beast => "Beast",
            MoonSign::Squamous => "Squamous",
            MoonSign::Knights => "Knight's",
            MoonSign::Rotting => "Rotting",
            MoonSign::Maidens => "Maiden's",
            MoonSign::Witchs => "Witch's",
            MoonSign::Robbers => "Robber's",
            MoonSign::Goat => "Goat",
            MoonSign::Narrow => "Narrow",
            MoonSign::Black => "Black",
        }
    }

    /// Rolls one of the twelve signs uniformly.
    pub fn roll<R>(gen_range: &mut R) -> Self
    where
        R: FnMut(i32, i32) -> i32 + ?Sized,
    {
        let index = gen_range(0, Self::ALL.len() as i32 - 1).clamp(0, Self::ALL.len() as i32 - 1);
        Self::ALL[index as usize]
    }

    /// What the sign grants during a given phase.
    pub fn effect(&self, phase: LunarPhase) -> &'static str {
        use LunarPhase::{Full, Waning, Waxing};
        match (self, phase) {
            (MoonSign::Grinning, Waxing) => {
                "50% chance of guardian undead ignoring the character's presence. (Though they \
                 act normally if provoked.)"
            }
            (MoonSign::Grinning, Full) => {
                "+1 bonus to Saving Throws against the powers of undead monsters."
            }
            (MoonSign::Grinning, Waning) => "+1 Attack bonus against undead monsters.",
            (MoonSign::Dead, Waxing) => {
                "+1 bonus to Attack and Damage Rolls the Round after killing a foe."
            }
            (MoonSign::Dead, Full) => {
                "If killed by non-magical means, the character returns to life after 1 Turn with \
                 1 Hit Point. Their Constitution and Wisdom are permanently halved. Once ever."
            }
            (MoonSign::Dead, Waning) => {
                "Undead monsters attack all others in the party before attacking the character."
            }
            (MoonSign::Beast, Waxing) => {
                "+2 bonus to Charisma (maximum 18) when interacting with dogs and horses."
            }
            (MoonSign::Beast, Full) => {
                "Wild animals attack all others in the party before attacking the character."
            }
            (MoonSign::Beast, Waning) => "+1 Attack bonus against wolves and bears.",
            (MoonSign::Squamous, Waxing) => "Effects of poison are delayed by 1 Turn.",
            (MoonSign::Squamous, Full) => {
                "+2 bonus to Saving Throws against the breath attacks and magical powers of wyrms \
                 and dragons."
            }
            (MoonSign::Squamous, Waning) => "+1 Attack bonus against serpents and wyrms.",
            (MoonSign::Knights, Waxing) => {
                "+2 bonus to Charisma (maximum 18) when interacting with nobles."
            }
            (MoonSign::Knights, Full) => "+1 AC bonus against attacks with metal weapons.",
            (MoonSign::Knights, Waning) => {
                "On a tied Initiative roll when in melee with knights or soldiers, the character \
                 acts first."
            }
            (MoonSign::Rotting, Waxing) => {
                "+2 bonus to Charisma (maximum 18) when interacting with sentient fungi."
            }
            (MoonSign::Rotting, Full) => "+2 AC bonus against attacks by fungal monsters.",
            (MoonSign::Rotting, Waning) => {
                "In the character's presence, fungal monsters suffer a –1 penalty to Attack and \
                 Damage Rolls."
            }
            (MoonSign::Maidens, Waxing) => {
                "+2 bonus to Charisma (maximum 18) when interacting with demi-fey."
            }
            (MoonSign::Maidens, Full) => "+2 bonus to Saving Throws against charms and glamours.",
            (MoonSign::Maidens, Waning) => {
                "+1 bonus to Attack and Damage Rolls against shape-changers and those cloaked \
                 with illusions."
            }
            (MoonSign::Witchs, Waxing) => {
                "When the character receives magical healing, they gain 1 additional Hit Point. \
                 (Max once per day/type)."
            }
            (MoonSign::Witchs, Full) => "+1 bonus to Saving Throws against holy magic.",
            (MoonSign::Witchs, Waning) => {
                "+1 bonus to Attack Rolls against witches and holy spell casters."
            }
            (MoonSign::Robbers, Waxing) => {
                "+2 bonus to Charisma (maximum 18) when interacting with Chaotic mortals."
            }
            (MoonSign::Robbers, Full) => {
                "+1 AC bonus against attacks by Chaotic mortals, fairies, or demi-fey."
            }
            (MoonSign::Robbers, Waning) => {
                "+1 Attack bonus against Chaotic mortals, fairies, and demi-fey."
            }
            (MoonSign::Goat, Waxing) => {
                "+2 bonus to Charisma (maximum 18) when interacting with breggles (including \
                 crookhorns)."
            }
            (MoonSign::Goat, Full) => {
                "Breggles (including crookhorns) attack all others in the party before attacking \
                 the character."
            }
            (MoonSign::Goat, Waning) => "+1 Attack bonus against breggles (including crookhorns).",
            (MoonSign::Narrow, Waxing) => {
                "+2 bonus to Charisma (maximum 18) when interacting with fairies, but suffer a –1 \
                 penalty to all Saving Throws against fairy magic."
            }
            (MoonSign::Narrow, Full) => {
                "If the character is afflicted by a curse or a Geas spell, there is a 1-in-4 \
                 chance of the caster also being affected by their own magic."
            }
            (MoonSign::Narrow, Waning) => "+1 Attack bonus against fairies and demi-fey.",
            (MoonSign::Black, Waxing) => "+1 bonus to Search Checks to find secret doors.",
            (MoonSign::Black, Full) => "+2 bonus to AC and Saving Throws when surprised.",
            (MoonSign::Black, Waning) => "+2 bonus to Saving Throws versus illusions and glamours.",
        }
    }
}

impl fmt::Display for MoonSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Assignments
// ============================================================================

/// The sign rolled for each phase slot of one month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSigns {
    pub waxing: MoonSign,
    pub full: MoonSign,
    pub waning: MoonSign,
}

impl MonthSigns {
    pub fn for_phase(&self, phase: LunarPhase) -> MoonSign {
        match phase {
            LunarPhase::Waxing => self.waxing,
            LunarPhase::Full => self.full,
            LunarPhase::Waning => self.waning,
        }
    }
}

/// A moon sign in effect on a particular day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoonEffect {
    pub sign: MoonSign,
    pub phase: LunarPhase,
    #[serde(rename = "desc")]
    pub description: String,
}

/// Sign assignments keyed year → month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoonSignLedger(BTreeMap<i32, BTreeMap<u8, MonthSigns>>);

impl MoonSignLedger {
    pub fn has_year(&self, year: i32) -> bool {
        self.0.contains_key(&year)
    }

    pub fn signs(&self, year: i32, month: u8) -> Option<&MonthSigns> {
        self.0.get(&year)?.get(&month)
    }

    /// Rolls three signs for every month of a year, replacing any existing
    /// assignment for it.
    pub fn generate_year<R>(&mut self, year: i32, calendar: &CalendarDefinition, gen_range: &mut R)
    where
        R: FnMut(i32, i32) -> i32 + ?Sized,
    {
        let months = calendar
            .months
            .iter()
            .map(|month| {
                let signs = MonthSigns {
                    waxing: MoonSign::roll(gen_range),
                    full: MoonSign::roll(gen_range),
                    waning: MoonSign::roll(gen_range),
                };
                (month.id, signs)
            })
            .collect();
        self.0.insert(year, months);
    }

    /// The sign in effect on a date, or `None` when nothing was rolled for
    /// that month.
    pub fn effect_for_date(
        &self,
        calendar: &CalendarDefinition,
        year: i32,
        month: u8,
        day: u8,
    ) -> Option<MoonEffect> {
        let signs = self.signs(year, month)?;
        let month_def = calendar.month(month)?;
        let phase = LunarPhase::for_day(month_def, day);
        let sign = signs.for_phase(phase);
        Some(MoonEffect {
            sign,
            phase,
            description: sign.effect(phase).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month_with_moons(new_moon: u8, full_moon: u8) -> MonthDefinition {
        let mut month = CalendarDefinition::dolmenwood().months[1].clone();
        month.new_moon = new_moon;
        month.full_moon = full_moon;
        month
    }

    mod moon_phase {
        use super::*;

        #[test]
        fn new_moon_day_is_new() {
            let month = month_with_moons(3, 17);
            assert_eq!(MoonPhase::for_day(&month, 3), MoonPhase::NewMoon);
        }

        #[test]
        fn follows_thirty_day_formula() {
            let month = month_with_moons(3, 17);
            // 14 days after new: floor(14 / 29 * 8) = 3
            assert_eq!(MoonPhase::for_day(&month, 17), MoonPhase::WaxingGibbous);
            // 15 days after new: floor(15 / 29 * 8) = 4
            assert_eq!(MoonPhase::for_day(&month, 18), MoonPhase::FullMoon);
            // 2 days before new: 28 days since, floor(28 / 29 * 8) = 7
            assert_eq!(MoonPhase::for_day(&month, 1), MoonPhase::WaningCrescent);
        }

        #[test]
        fn twenty_nine_days_wraps_to_new() {
            let month = month_with_moons(1, 15);
            assert_eq!(MoonPhase::for_day(&month, 30), MoonPhase::NewMoon);
        }

        #[test]
        fn display_includes_icon() {
            assert_eq!(MoonPhase::FullMoon.to_string(), "🌕 Full Moon");
            assert_eq!(MoonPhase::LastQuarter.index(), 6);
        }
    }

    mod lunar_phase {
        use super::*;

        #[test]
        fn full_window_is_three_days() {
            let month = month_with_moons(3, 17);
            assert_eq!(LunarPhase::for_day(&month, 15), LunarPhase::Waxing);
            assert_eq!(LunarPhase::for_day(&month, 16), LunarPhase::Full);
            assert_eq!(LunarPhase::for_day(&month, 17), LunarPhase::Full);
            assert_eq!(LunarPhase::for_day(&month, 18), LunarPhase::Full);
            assert_eq!(LunarPhase::for_day(&month, 19), LunarPhase::Waning);
        }

        #[test]
        fn waxing_runs_from_new_moon() {
            let month = month_with_moons(3, 17);
            assert_eq!(LunarPhase::for_day(&month, 2), LunarPhase::Waning);
            for day in 3..=15 {
                assert_eq!(LunarPhase::for_day(&month, day), LunarPhase::Waxing, "day {}", day);
            }
        }

        #[test]
        fn new_moon_after_full_moon() {
            // Obthryme: full on 5, new on 19
            let month = month_with_moons(19, 5);
            assert_eq!(LunarPhase::for_day(&month, 1), LunarPhase::Waning);
            assert_eq!(LunarPhase::for_day(&month, 4), LunarPhase::Full);
            assert_eq!(LunarPhase::for_day(&month, 20), LunarPhase::Waning);
        }
    }

    mod ledger {
        use super::*;

        #[test]
        fn effect_is_none_without_assignment() {
            let calendar = CalendarDefinition::dolmenwood();
            let ledger = MoonSignLedger::default();
            assert!(ledger.effect_for_date(&calendar, 376, 11, 4).is_none());
        }

        #[test]
        fn generate_year_assigns_every_month() {
            let calendar = CalendarDefinition::dolmenwood();
            let mut ledger = MoonSignLedger::default();
            ledger.generate_year(376, &calendar, &mut |_, _| 0);
            for month in 1..=12 {
                let signs = ledger.signs(376, month).unwrap();
                assert_eq!(signs.full, MoonSign::Grinning);
            }
            assert!(!ledger.has_year(377));
        }

        #[test]
        fn effect_uses_phase_slot() {
            let calendar = CalendarDefinition::dolmenwood();
            let mut rolls = vec![0, 1, 11].into_iter();
            let mut ledger = MoonSignLedger::default();
            ledger.generate_year(376, &calendar, &mut |_, _| rolls.next().unwrap_or(2));

            // Grimvold: new 5, full 19
            let waxing = ledger.effect_for_date(&calendar, 376, 1, 10).unwrap();
            assert_eq!(waxing.sign, MoonSign::Grinning);
            assert_eq!(waxing.phase, LunarPhase::Waxing);

            let full = ledger.effect_for_date(&calendar, 376, 1, 19).unwrap();
            assert_eq!(full.sign, MoonSign::Dead);
            assert!(full.description.starts_with("If killed by non-magical means"));

            let waning = ledger.effect_for_date(&calendar, 376, 1, 25).unwrap();
            assert_eq!(waning.sign, MoonSign::Black);
            assert_eq!(
                waning.description,
                "+2 bonus to Saving Throws versus illusions and glamours."
            );
        }

        #[test]
        fn reads_curly_apostrophe_names() {
            let json = r#"{
                "376": {"1": {"waxing": "Knight’s", "full": "Witch's", "waning": "Goat"}}
            }"#;
            let ledger: MoonSignLedger = serde_json::from_str(json).unwrap();
            let signs = ledger.signs(376, 1).unwrap();
            assert_eq!(signs.waxing, MoonSign::Knights);
            assert_eq!(signs.full, MoonSign::Witchs);
        }
    }

    #[test]
    fn roll_clamps_out_of_range_values() {
        assert_eq!(MoonSign::roll(&mut |_, _| 99), MoonSign::Black);
        assert_eq!(MoonSign::roll(&mut |_, _| -4), MoonSign::Grinning);
    }
}
