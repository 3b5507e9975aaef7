//! Custom events, deadlines and per-day session logs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::calendar::{CalendarDate, CalendarDefinition, FixedEventKind};

// ============================================================================
// CustomEvent
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomEventKind {
    Custom,
    Urgent,
    Quest,
}

impl CustomEventKind {
    /// Urgent and quest events show up in the deadline list.
    pub fn is_deadline(&self) -> bool {
        matches!(self, CustomEventKind::Urgent | CustomEventKind::Quest)
    }
}

/// A user-created event pinned to a month and day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomEvent {
    pub month: u8,
    pub day: u8,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CustomEventKind,
}

impl CustomEvent {
    pub fn new(month: u8, day: u8, name: impl Into<String>, kind: CustomEventKind) -> Self {
        Self {
            month,
            day,
            name: name.into(),
            kind,
        }
    }
}

// ============================================================================
// DayLog
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Travel,
    Event,
    Combat,
    Note,
}

impl LogKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            LogKind::Travel => "Travel",
            LogKind::Event => "Event",
            LogKind::Combat => "Combat",
            LogKind::Note => "Note",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One free-text line recorded against a day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayLogEntry {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub timestamp: DateTime<Utc>,
}

/// Composite "year-month-day" key used for day logs.
pub fn day_key(year: i32, month: u8, day: u8) -> String {
    format!("{}-{}-{}", year, month, day)
}

// ============================================================================
// Read models
// ============================================================================

/// Where an entry in a day's event list comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "type", rename_all = "snake_case")]
pub enum DayEventKind {
    Fixed(FixedEventKind),
    Custom(CustomEventKind),
    NewMoon,
    FullMoon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayEvent {
    pub name: String,
    pub kind: DayEventKind,
}

/// A deadline with its signed distance from today
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deadline {
    pub event: CustomEvent,
    pub month_name: String,
    pub days_until: i32,
}

impl Deadline {
    pub fn is_today(&self) -> bool {
        self.days_until == 0
    }

    /// Three days or fewer out.
    pub fn is_critical(&self) -> bool {
        self.days_until <= 3
    }
}

// ============================================================================
// EventLedger
// ============================================================================

/// Custom events plus the day logs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLedger {
    #[serde(default)]
    pub custom_events: Vec<CustomEvent>,
    #[serde(default)]
    pub logs: BTreeMap<String, Vec<DayLogEntry>>,
}

impl EventLedger {
    /// Appends an event. Duplicates are allowed.
    pub fn add_custom_event(&mut self, event: CustomEvent) {
        self.custom_events.push(event);
    }

    /// Removes the event at `index`. Out of range is a no-op.
    pub fn remove_custom_event_at(&mut self, index: usize) -> Option<CustomEvent> {
        (index < self.custom_events.len()).then(|| self.custom_events.remove(index))
    }

    /// Removes every event matching the predicate, returning how many went.
    pub fn remove_custom_events_where<P>(&mut self, mut predicate: P) -> usize
    where
        P: FnMut(&CustomEvent) -> bool,
    {
        let before = self.custom_events.len();
        self.custom_events.retain(|e| !predicate(e));
        before - self.custom_events.len()
    }

    pub fn custom_events_on(&self, month: u8, day: u8) -> impl Iterator<Item = &CustomEvent> {
        self.custom_events
            .iter()
            .filter(move |e| e.month == month && e.day == day)
    }

    /// Fixed events for the day, then custom events, then moon markers.
    pub fn events_for_day(
        &self,
        calendar: &CalendarDefinition,
        month: u8,
        day: u8,
    ) -> Vec<DayEvent> {
        let mut events = Vec::new();
        let month_def = calendar.month(month);

        if let Some(month_def) = month_def {
            events.extend(month_def.events_on(day).map(|e| DayEvent {
                name: e.name.clone(),
                kind: DayEventKind::Fixed(e.kind),
            }));
        }

        events.extend(self.custom_events_on(month, day).map(|e| DayEvent {
            name: e.name.clone(),
            kind: DayEventKind::Custom(e.kind),
        }));

        if let Some(month_def) = month_def {
            if day == month_def.new_moon {
                events.push(DayEvent {
                    name: "New Moon".to_string(),
                    kind: DayEventKind::NewMoon,
                });
            }
            if day == month_def.full_moon {
                events.push(DayEvent {
                    name: "Full Moon".to_string(),
                    kind: DayEventKind::FullMoon,
                });
            }
        }

        events
    }

    pub fn append_log(
        &mut self,
        year: i32,
        month: u8,
        day: u8,
        text: impl Into<String>,
        kind: LogKind,
        now: DateTime<Utc>,
    ) {
        self.logs
            .entry(day_key(year, month, day))
            .or_default()
            .push(DayLogEntry {
                text: text.into(),
                kind,
                timestamp: now,
            });
    }

    /// Removes a log entry by position. Unknown days and indexes are no-ops.
    pub fn delete_log(
        &mut self,
        year: i32,
        month: u8,
        day: u8,
        index: usize,
    ) -> Option<DayLogEntry> {
        let entries = self.logs.get_mut(&day_key(year, month, day))?;
        (index < entries.len()).then(|| entries.remove(index))
    }

    pub fn logs_for_day(&self, year: i32, month: u8, day: u8) -> &[DayLogEntry] {
        self.logs
            .get(&day_key(year, month, day))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Urgent and quest events ordered by days until, ties in insertion order.
    pub fn deadlines(&self, today: &CalendarDate, calendar: &CalendarDefinition) -> Vec<Deadline> {
        let mut deadlines: Vec<Deadline> = self
            .custom_events
            .iter()
            .filter(|e| e.kind.is_deadline())
            .map(|e| Deadline {
                event: e.clone(),
                month_name: calendar
                    .month(e.month)
                    .map_or_else(|| format!("Month {}", e.month), |m| m.name.clone()),
                days_until: today.days_until(calendar, e.month, e.day),
            })
            .collect();
        deadlines.sort_by_key(|d| d.days_until);
        deadlines
    }
}
