//! Static calendar reference data
//!
//! A Dolmenwood-style year: 12 months of 28 standard days, each followed by
//! zero to three named wysendays that sit outside the 7-day week. The
//! definition is read-only once loaded; every other calendar operation
//! borrows it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::DomainError;

/// Standard (week-bound) days in every month.
pub const STANDARD_DAYS: u8 = 28;
/// Months in a year.
pub const MONTHS_PER_YEAR: u8 = 12;
/// Days in a week.
pub const DAYS_PER_WEEK: usize = 7;
/// Most wysendays a single month may carry.
pub const MAX_WYSENDAYS: usize = 3;
/// Longest month allowed.
pub const MAX_MONTH_DAYS: u8 = STANDARD_DAYS + MAX_WYSENDAYS as u8;

fn default_standard_days() -> u8 {
    STANDARD_DAYS
}

// ============================================================================
// FixedEvent
// ============================================================================

/// Category of a calendar-defined event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedEventKind {
    Festival,
    Saint,
    #[serde(alias = "extra_day")]
    Wysenday,
    Moon,
    #[serde(other)]
    Other,
}

impl FixedEventKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            FixedEventKind::Festival => "Festival",
            FixedEventKind::Saint => "Saint's Day",
            FixedEventKind::Wysenday => "Wysenday",
            FixedEventKind::Moon => "Moon",
            FixedEventKind::Other => "Event",
        }
    }
}

/// An event that recurs on the same month and day every year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedEvent {
    pub day: u8,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FixedEventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FixedEvent {
    pub fn new(day: u8, name: impl Into<String>, kind: FixedEventKind) -> Self {
        Self {
            day,
            name: name.into(),
            kind,
            description: None,
        }
    }
}

// ============================================================================
// MonthDefinition
// ============================================================================

/// Configuration for a single month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthDefinition {
    /// Month number, 1-indexed
    pub id: u8,
    pub name: String,
    /// Free-text season tag, e.g. "Deep Winter" or "Summer's Fading"
    pub season: String,
    #[serde(default = "default_standard_days")]
    pub standard_days: u8,
    /// Explicit day count; wins over the wysenday list when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<u8>,
    /// Named days appended after the standard days
    #[serde(default, alias = "extraDays")]
    pub wysendays: Vec<String>,
    pub new_moon: u8,
    pub full_moon: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moon_name: Option<String>,
    #[serde(default)]
    pub events: Vec<FixedEvent>,
}

impl MonthDefinition {
    /// Total days in the month, wysendays included.
    ///
    /// Days past the named wysendays still count when `days` says so; they
    /// are plain "Wysenday"s.
    pub fn day_count(&self) -> u8 {
        self.days
            .unwrap_or(self.standard_days + self.wysendays.len() as u8)
    }

    pub fn contains_day(&self, day: u8) -> bool {
        (1..=self.day_count()).contains(&day)
    }

    /// The wysenday name for a day past the standard days, if any.
    pub fn wysenday_name(&self, day: u8) -> Option<&str> {
        if day <= self.standard_days {
            return None;
        }
        self.wysendays
            .get((day - self.standard_days - 1) as usize)
            .map(String::as_str)
    }

    pub fn events_on(&self, day: u8) -> impl Iterator<Item = &FixedEvent> {
        self.events.iter().filter(move |e| e.day == day)
    }
}

// ============================================================================
// SpecialSeasonInfo
// ============================================================================

/// Display data for one of the toggleable special seasons
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialSeasonInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

// ============================================================================
// CalendarDefinition
// ============================================================================

/// Full calendar configuration: week day names, months, special seasons
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDefinition {
    pub week_days: Vec<String>,
    pub months: Vec<MonthDefinition>,
    #[serde(default)]
    pub special_seasons: BTreeMap<String, SpecialSeasonInfo>,
}

impl CalendarDefinition {
    /// Checks the structural invariants every other operation relies on.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the week is not 7 days, there
    /// are not exactly 12 months numbered 1..=12 in order, a month has more
    /// than 3 wysendays or a day count outside 28..=31, or a moon day falls
    /// outside its month.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.week_days.len() != DAYS_PER_WEEK {
            return Err(DomainError::validation(format!(
                "a week has {} days, found {}",
                DAYS_PER_WEEK,
                self.week_days.len()
            )));
        }
        if self.months.len() != MONTHS_PER_YEAR as usize {
            return Err(DomainError::validation(format!(
                "a year has {} months, found {}",
                MONTHS_PER_YEAR,
                self.months.len()
            )));
        }
        for (index, month) in self.months.iter().enumerate() {
            if month.id as usize != index + 1 {
                return Err(DomainError::validation(format!(
                    "month '{}' has id {} but is in position {}",
                    month.name,
                    month.id,
                    index + 1
                )));
            }
            if month.wysendays.len() > MAX_WYSENDAYS {
                return Err(DomainError::validation(format!(
                    "month '{}' has {} wysendays (max {})",
                    month.name,
                    month.wysendays.len(),
                    MAX_WYSENDAYS
                )));
            }
            if let Some(days) = month.days {
                let named = month.standard_days as usize + month.wysendays.len();
                if !(STANDARD_DAYS..=MAX_MONTH_DAYS).contains(&days) || (days as usize) < named {
                    return Err(DomainError::validation(format!(
                        "month '{}' has {} days, expected {}..={} covering its {} named days",
                        month.name, days, STANDARD_DAYS, MAX_MONTH_DAYS, named
                    )));
                }
            }
            if !month.contains_day(month.new_moon) || !month.contains_day(month.full_moon) {
                return Err(DomainError::validation(format!(
                    "month '{}' has a moon day outside its {} days",
                    month.name,
                    month.day_count()
                )));
            }
        }
        Ok(())
    }

    /// Looks up a month by its 1-indexed number.
    pub fn month(&self, month: u8) -> Option<&MonthDefinition> {
        month
            .checked_sub(1)
            .and_then(|index| self.months.get(index as usize))
    }

    /// Day count of a month, 0 when the month does not exist.
    pub fn days_in_month(&self, month: u8) -> u8 {
        self.month(month).map_or(0, MonthDefinition::day_count)
    }

    pub fn month_count(&self) -> u8 {
        self.months.len() as u8
    }

    /// Name of a day: its weekday for standard days, the wysenday's own name
    /// for days past them, or the generic "Wysenday".
    pub fn day_name(&self, month: u8, day: u8) -> String {
        let standard_days = self.month(month).map_or(STANDARD_DAYS, |m| m.standard_days);
        if (1..=standard_days).contains(&day) {
            let index = (day as usize - 1) % DAYS_PER_WEEK;
            if let Some(name) = self.week_days.get(index) {
                return name.clone();
            }
        }
        match self.month(month).and_then(|m| m.wysenday_name(day)) {
            Some(name) => format!("{} (Wysenday)", name),
            None => "Wysenday".to_string(),
        }
    }

    /// Display name of a special season, falling back to its id.
    pub fn special_season_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.special_seasons
            .get(id)
            .map_or(id, |info| info.name.as_str())
    }

    // Built-in calendar

    /// The Dolmenwood calendar used when no calendar file is supplied.
    pub fn dolmenwood() -> Self {
        use FixedEventKind::{Festival, Saint, Wysenday};

        let week_days = ["Colly", "Chime", "Hayme", "Moot", "Frisk", "Eggfast", "Sunning"]
            .iter()
            .map(|d| d.to_string())
            .collect();

        let months = vec![
            dolmenwood_month(
                1,
                "Grimvold",
                "Deep Winter",
                &["Hanglemas", "Dyboll's Day"],
                5,
                19,
                "Grinning Moon",
                vec![
                    (1, "Feast of Saint Hoargrime", Saint),
                    (29, "Hanglemas", Wysenday),
                    (30, "Dyboll's Day", Wysenday),
                ],
            ),
            dolmenwood_month(
                2,
                "Lymewald",
                "Winter's Fading",
                &[],
                3,
                17,
                "Dead Moon",
                vec![
                    (12, "Saint Wick's Vigil", Saint),
                    (21, "Candlefall", Festival),
                ],
            ),
            dolmenwood_month(
                3,
                "Haggryme",
                "Spring Onset",
                &["Yarl's Day", "The Day of Virgins"],
                2,
                16,
                "Beast Moon",
                vec![
                    (7, "Saint Waylaine", Saint),
                    (29, "Yarl's Day", Wysenday),
                    (30, "The Day of Virgins", Wysenday),
                ],
            ),
            dolmenwood_month(
                4,
                "Symswald",
                "High Spring",
                &["Hopfast"],
                1,
                15,
                "Squamous Moon",
                vec![
                    (14, "Feast of Saint Clewyd", Saint),
                    (29, "Hopfast", Wysenday),
                ],
            ),
            dolmenwood_month(
                5,
                "Harchment",
                "Spring's Fading",
                &["Smithing"],
                27,
                13,
                "Knight's Moon",
                vec![
                    (3, "Saint Sedge", Saint),
                    (29, "Smithing", Wysenday),
                ],
            ),
            dolmenwood_month(
                6,
                "Iggwyld",
                "Summer Onset",
                &["Shortening", "Longshank's Day"],
                26,
                12,
                "Rotting Moon",
                vec![
                    (20, "Midsummer Eve", Festival),
                    (29, "Shortening", Wysenday),
                    (30, "Longshank's Day", Wysenday),
                ],
            ),
            dolmenwood_month(
                7,
                "Chysting",
                "High Summer",
                &["Bradging", "Copsewallow", "Chalice"],
                25,
                11,
                "Maiden's Moon",
                vec![
                    (9, "Saint Thorne", Saint),
                    (29, "Bradging", Wysenday),
                    (30, "Copsewallow", Wysenday),
                    (31, "Chalice", Wysenday),
                ],
            ),
            dolmenwood_month(
                8,
                "Lillipythe",
                "Summer's Fading",
                &["Old Dobey's Day"],
                23,
                9,
                "Witch's Moon",
                vec![
                    (16, "Feast of Saint Fael", Saint),
                    (29, "Old Dobey's Day", Wysenday),
                ],
            ),
            dolmenwood_month(
                9,
                "Haelhold",
                "Autumn Onset",
                &[],
                22,
                8,
                "Robber's Moon",
                vec![
                    (1, "Harvest Home", Festival),
                    (22, "Saint Eggort", Saint),
                ],
            ),
            dolmenwood_month(
                10,
                "Reedwryme",
                "Deep Autumn",
                &["Shub's Eve", "Druden Day"],
                20,
                6,
                "Goat Moon",
                vec![
                    (13, "Saint Goodwick", Saint),
                    (29, "Shub's Eve", Wysenday),
                    (30, "Druden Day", Wysenday),
                ],
            ),
            dolmenwood_month(
                11,
                "Obthryme",
                "Autumn's Fading",
                &[],
                19,
                5,
                "Narrow Moon",
                vec![
                    (2, "Saint Jorrael", Saint),
                    (25, "Feast of the Dead", Festival),
                ],
            ),
            dolmenwood_month(
                12,
                "Braghold",
                "Winter Onset",
                &["The Day of Doors", "Dolmenday"],
                17,
                3,
                "Black Moon",
                vec![
                    (10, "Saint Wyrmsbane", Saint),
                    (29, "The Day of Doors", Wysenday),
                    (30, "Dolmenday", Wysenday),
                ],
            ),
        ];

        let special_seasons = [
            (
                "hitching",
                "Hitching Season",
                "Warm damp mists roll through the wood and fairy roads open more readily.",
            ),
            (
                "vague",
                "The Vague",
                "Unnatural fogs rise from the earth; the dead are restless and the land shifts.",
            ),
            (
                "colliggwyld",
                "Colliggwyld",
                "The fungal bloom: spring weather regardless of the month.",
            ),
            (
                "chame",
                "Chame",
                "The serpent season: summer weather regardless of the month.",
            ),
        ]
        .into_iter()
        .map(|(id, name, description)| {
            (
                id.to_string(),
                SpecialSeasonInfo {
                    name: name.to_string(),
                    description: description.to_string(),
                },
            )
        })
        .collect();

        Self {
            week_days,
            months,
            special_seasons,
        }
    }
}

impl Default for CalendarDefinition {
    fn default() -> Self {
        Self::dolmenwood()
    }
}

impl fmt::Display for MonthDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[allow(clippy::too_many_arguments)]
fn dolmenwood_month(
    id: u8,
    name: &str,
    season: &str,
    wysendays: &[&str],
    new_moon: u8,
    full_moon: u8,
    moon_name: &str,
    events: Vec<(u8, &str, FixedEventKind)>,
) -> MonthDefinition {
    MonthDefinition {
        id,
        name: name.to_string(),
        season: season.to_string(),
        standard_days: STANDARD_DAYS,
        days: None,
        wysendays: wysendays.iter().map(|d| d.to_string()).collect(),
        new_moon,
        full_moon,
        moon_name: Some(moon_name.to_string()),
        events: events
            .into_iter()
            .map(|(day, name, kind)| FixedEvent::new(day, name, kind))
            .collect(),
    }
}
