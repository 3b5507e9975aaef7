//! The campaign calendar state and the clock operations over it
//!
//! `CalendarState` is the whole persisted calendar document: the current
//! date, the active special seasons, custom events and logs, and the rolled
//! weather and moon signs. Operations that may roll dice take an injected
//! `gen_range(min, max)` closure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::date::{CalendarDate, TimeUnit, DAWN_HOUR, HOURS_PER_DAY, SUNSET_HOUR};
use super::definition::CalendarDefinition;
use crate::ledger::{
    CustomEvent, CustomEventKind, DayEvent, DayLogEntry, Deadline, EventLedger, LogKind,
};
use crate::moon::{MoonEffect, MoonPhase, MoonSignLedger};
use crate::weather::{
    self, ActiveSeasons, SpecialSeason, WeatherLedger, WeatherRecord, WeatherSeason,
};

/// Current layout of the persisted calendar document.
pub const CALENDAR_SCHEMA_VERSION: u32 = 2;

/// Shown after a long rest.
pub const REST_NOTICE: &str = "Long rest completed!";

// ============================================================================
// CalendarState
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarState {
    pub schema_version: u32,
    pub date: CalendarDate,
    #[serde(default)]
    pub active_seasons: ActiveSeasons,
    #[serde(default)]
    pub events: EventLedger,
    #[serde(default)]
    pub year_weather: WeatherLedger,
    #[serde(default)]
    pub year_moon_effects: MoonSignLedger,
    /// Cached weather for `date`
    #[serde(default, rename = "weather")]
    pub current_weather: Option<WeatherRecord>,
}

impl Default for CalendarState {
    fn default() -> Self {
        let mut events = EventLedger::default();
        events.add_custom_event(CustomEvent::new(
            11,
            28,
            "Azelach Contract Due!",
            CustomEventKind::Urgent,
        ));
        Self {
            schema_version: CALENDAR_SCHEMA_VERSION,
            date: CalendarDate::campaign_start(),
            active_seasons: ActiveSeasons::new(),
            events,
            year_weather: WeatherLedger::default(),
            year_moon_effects: MoonSignLedger::default(),
            current_weather: None,
        }
    }
}

/// What an advance did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceOutcome {
    pub days_advanced: u32,
    /// Years entered during the advance
    pub new_years: Vec<i32>,
    pub notice: Option<&'static str>,
}

/// Everything shown for a single day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayView {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub month_name: String,
    pub day_name: String,
    pub moon_phase: MoonPhase,
    pub moon_name: Option<String>,
    pub moon_effect: Option<MoonEffect>,
    pub weather: Option<WeatherRecord>,
    pub events: Vec<DayEvent>,
    pub logs: Vec<DayLogEntry>,
}

impl CalendarState {
    // ------------------------------------------------------------------------
    // Generation
    // ------------------------------------------------------------------------

    /// Rolls weather and moon signs for a year when either is missing.
    ///
    /// Returns `true` if anything was generated.
    pub fn ensure_year<R>(
        &mut self,
        year: i32,
        calendar: &CalendarDefinition,
        gen_range: &mut R,
    ) -> bool
    where
        R: FnMut(i32, i32) -> i32 + ?Sized,
    {
        let mut generated = false;
        if !self.year_weather.has_year(year) {
            self.year_weather.generate_year(
                year,
                calendar,
                self.date.month,
                &self.active_seasons,
                gen_range,
            );
            generated = true;
        }
        if !self.year_moon_effects.has_year(year) {
            self.year_moon_effects.generate_year(year, calendar, gen_range);
            generated = true;
        }
        generated
    }

    /// Copies today's stored weather into the cache, rolling and storing a
    /// record if the day has none.
    pub fn refresh_current_weather<R>(&mut self, calendar: &CalendarDefinition, gen_range: &mut R)
    where
        R: FnMut(i32, i32) -> i32 + ?Sized,
    {
        let CalendarDate { year, month, day, .. } = self.date;
        let record = match self.year_weather.get(year, month, day) {
            Some(record) => record.clone(),
            None => {
                let record = weather::roll_for_day(self.current_season(calendar), gen_range);
                self.year_weather.set(year, month, day, record.clone());
                record
            }
        };
        self.current_weather = Some(record);
    }

    /// Rolls new weather for today, replacing the stored record.
    pub fn reroll_weather<R>(
        &mut self,
        calendar: &CalendarDefinition,
        gen_range: &mut R,
    ) -> WeatherRecord
    where
        R: FnMut(i32, i32) -> i32 + ?Sized,
    {
        let CalendarDate { year, month, day, .. } = self.date;
        let record = weather::roll_for_day(self.current_season(calendar), gen_range);
        self.year_weather.set(year, month, day, record.clone());
        self.current_weather = Some(record.clone());
        record
    }

    /// Weather table for the current month, special seasons included.
    pub fn current_season(&self, calendar: &CalendarDefinition) -> WeatherSeason {
        match calendar.month(self.date.month) {
            Some(month) => WeatherSeason::for_month(month, true, &self.active_seasons),
            None => self
                .active_seasons
                .iter()
                .next()
                .map_or(WeatherSeason::Winter, SpecialSeason::weather_season),
        }
    }

    // ------------------------------------------------------------------------
    // Time
    // ------------------------------------------------------------------------

    /// Moves one day forward, generating the new year's data when a year
    /// boundary is crossed, then refreshes the weather cache.
    ///
    /// Returns the year entered, if any.
    pub fn advance_day<R>(
        &mut self,
        calendar: &CalendarDefinition,
        gen_range: &mut R,
    ) -> Option<i32>
    where
        R: FnMut(i32, i32) -> i32 + ?Sized,
    {
        let crossed = self.date.next_day(calendar);
        self.ensure_year(self.date.year, calendar, gen_range);
        self.refresh_current_weather(calendar, gen_range);
        crossed.then_some(self.date.year)
    }

    pub fn advance<R>(
        &mut self,
        unit: TimeUnit,
        calendar: &CalendarDefinition,
        gen_range: &mut R,
    ) -> AdvanceOutcome
    where
        R: FnMut(i32, i32) -> i32 + ?Sized,
    {
        let (days, hour, notice): (u32, Option<u8>, Option<&'static str>) = match unit {
            TimeUnit::Hour => {
                if self.date.hour + 1 >= HOURS_PER_DAY {
                    (1, Some(0), None)
                } else {
                    self.date.hour += 1;
                    (0, None, None)
                }
            }
            TimeUnit::ToSunset => {
                if self.date.hour < SUNSET_HOUR {
                    self.date.hour = SUNSET_HOUR;
                    (0, None, None)
                } else {
                    (1, Some(SUNSET_HOUR), None)
                }
            }
            TimeUnit::ToDawn => (1, Some(DAWN_HOUR), None),
            TimeUnit::Day => (1, None, None),
            TimeUnit::Week => (7, None, None),
            TimeUnit::Rest => (1, Some(DAWN_HOUR), Some(REST_NOTICE)),
        };

        if let Some(hour) = hour {
            self.date.hour = hour;
        }

        let mut new_years = Vec::new();
        for _ in 0..days {
            if let Some(year) = self.advance_day(calendar, gen_range) {
                new_years.push(year);
            }
        }

        AdvanceOutcome {
            days_advanced: days,
            new_years,
            notice,
        }
    }

    /// Browses to another month. The new month's year gets its data rolled
    /// if it has none.
    pub fn change_month<R>(&mut self, delta: i32, calendar: &CalendarDefinition, gen_range: &mut R)
    where
        R: FnMut(i32, i32) -> i32 + ?Sized,
    {
        self.date.change_month(delta, calendar);
        self.ensure_year(self.date.year, calendar, gen_range);
        self.refresh_current_weather(calendar, gen_range);
    }

    /// Moves to another day of the current month. Out-of-range days are
    /// ignored.
    pub fn jump_to_day<R>(
        &mut self,
        day: u8,
        calendar: &CalendarDefinition,
        gen_range: &mut R,
    ) -> bool
    where
        R: FnMut(i32, i32) -> i32 + ?Sized,
    {
        if !self.date.jump_to_day(day, calendar) {
            return false;
        }
        self.refresh_current_weather(calendar, gen_range);
        true
    }

    pub fn days_until(&self, calendar: &CalendarDefinition, month: u8, day: u8) -> i32 {
        self.date.days_until(calendar, month, day)
    }

    // ------------------------------------------------------------------------
    // Seasons
    // ------------------------------------------------------------------------

    /// Returns `false` if the season was already active.
    pub fn activate_season(&mut self, season: SpecialSeason) -> bool {
        self.active_seasons.insert(season)
    }

    /// Returns `false` if the season was not active.
    pub fn end_season(&mut self, season: SpecialSeason) -> bool {
        self.active_seasons.remove(&season)
    }

    // ------------------------------------------------------------------------
    // Events and logs
    // ------------------------------------------------------------------------

    pub fn add_custom_event(&mut self, event: CustomEvent) {
        self.events.add_custom_event(event);
    }

    pub fn remove_custom_event(&mut self, index: usize) -> Option<CustomEvent> {
        self.events.remove_custom_event_at(index)
    }

    /// Logs against today.
    pub fn log_today(&mut self, text: impl Into<String>, kind: LogKind, now: DateTime<Utc>) {
        let CalendarDate { year, month, day, .. } = self.date;
        self.events.append_log(year, month, day, text, kind, now);
    }

    pub fn deadlines(&self, calendar: &CalendarDefinition) -> Vec<Deadline> {
        self.events.deadlines(&self.date, calendar)
    }

    // ------------------------------------------------------------------------
    // Read models
    // ------------------------------------------------------------------------

    pub fn moon_effect_today(&self, calendar: &CalendarDefinition) -> Option<MoonEffect> {
        let CalendarDate { year, month, day, .. } = self.date;
        self.year_moon_effects.effect_for_date(calendar, year, month, day)
    }

    /// Aggregates a day for display. `None` for days outside the calendar.
    pub fn day_view(
        &self,
        calendar: &CalendarDefinition,
        year: i32,
        month: u8,
        day: u8,
    ) -> Option<DayView> {
        let month_def = calendar.month(month)?;
        if !month_def.contains_day(day) {
            return None;
        }
        Some(DayView {
            year,
            month,
            day,
            month_name: month_def.name.clone(),
            day_name: calendar.day_name(month, day),
            moon_phase: MoonPhase::for_day(month_def, day),
            moon_name: month_def.moon_name.clone(),
            moon_effect: self.year_moon_effects.effect_for_date(calendar, year, month, day),
            weather: self.year_weather.get(year, month, day).cloned(),
            events: self.events.events_for_day(calendar, month, day),
            logs: self.events.logs_for_day(year, month, day).to_vec(),
        })
    }

    pub fn today(&self, calendar: &CalendarDefinition) -> Option<DayView> {
        let CalendarDate { year, month, day, .. } = self.date;
        self.day_view(calendar, year, month, day)
    }
}
