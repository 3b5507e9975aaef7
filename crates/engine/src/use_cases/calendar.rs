//! Calendar use cases.
//!
//! Owns the calendar document for the session: every mutation goes through
//! the domain state, then the whole document is written back.

use std::sync::Arc;

use vault_domain::{
    AdvanceOutcome, CalendarDefinition, CalendarState, CustomEvent, DayLogEntry, DayView,
    Deadline, LogKind, SpecialSeason, TimeUnit, WeatherRecord,
};

use crate::infrastructure::clock::range_fn;
use crate::infrastructure::persistence::SnapshotStore;
use crate::infrastructure::ports::{ClockPort, RandomPort};

pub struct CalendarService {
    calendar: CalendarDefinition,
    state: CalendarState,
    store: SnapshotStore,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
}

impl CalendarService {
    /// Restores the saved calendar (or the campaign start) and makes sure
    /// the current year has weather, moon signs and today's weather cached.
    ///
    /// A saved date that does not exist in `calendar` is clamped into it.
    pub fn load(
        calendar: CalendarDefinition,
        store: SnapshotStore,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        let mut state: CalendarState = store.load_or_default();

        let saved_date = state.date;
        if state.date.clamp_to(&calendar) {
            tracing::warn!(
                saved = ?saved_date,
                healed = ?state.date,
                "Saved date is outside the calendar, clamped"
            );
        }

        {
            let mut rng = range_fn(random.as_ref());
            let year = state.date.year;
            if state.ensure_year(year, &calendar, &mut rng) {
                tracing::debug!(year, "Generated weather and moon signs for current year");
            }
            state.refresh_current_weather(&calendar, &mut rng);
        }
        store.save(&state);

        tracing::info!(
            date = %state.date.display_full(&calendar),
            time = %state.date.format_time(),
            "Calendar loaded"
        );

        Self {
            calendar,
            state,
            store,
            clock,
            random,
        }
    }

    pub fn state(&self) -> &CalendarState {
        &self.state
    }

    pub fn definition(&self) -> &CalendarDefinition {
        &self.calendar
    }

    fn save(&self) {
        self.store.save(&self.state);
    }

    // =========================================================================
    // Time
    // =========================================================================

    pub fn advance(&mut self, unit: TimeUnit) -> AdvanceOutcome {
        let mut rng = range_fn(self.random.as_ref());
        let outcome = self.state.advance(unit, &self.calendar, &mut rng);
        self.save();

        for year in &outcome.new_years {
            tracing::info!(year, "New year entered, weather and moon signs rolled");
        }
        tracing::info!(
            unit = %unit,
            days = outcome.days_advanced,
            date = %self.state.date.display_full(&self.calendar),
            time = %self.state.date.format_time(),
            "Time advanced"
        );
        if let Some(notice) = outcome.notice {
            tracing::info!("{}", notice);
        }
        outcome
    }

    pub fn change_month(&mut self, delta: i32) {
        let mut rng = range_fn(self.random.as_ref());
        self.state.change_month(delta, &self.calendar, &mut rng);
        self.save();
        tracing::debug!(
            month = self.state.date.month,
            year = self.state.date.year,
            "Changed month"
        );
    }

    /// Returns `false` (and changes nothing) for days outside the month.
    pub fn jump_to_day(&mut self, day: u8) -> bool {
        let mut rng = range_fn(self.random.as_ref());
        if !self.state.jump_to_day(day, &self.calendar, &mut rng) {
            tracing::debug!(day, "Ignored jump to a day outside the current month");
            return false;
        }
        self.save();
        true
    }

    pub fn reroll_weather(&mut self) -> WeatherRecord {
        let mut rng = range_fn(self.random.as_ref());
        let record = self.state.reroll_weather(&self.calendar, &mut rng);
        self.save();
        tracing::info!(roll = record.roll, weather = %record.description, "Weather re-rolled");
        record
    }

    pub fn days_until(&self, month: u8, day: u8) -> i32 {
        self.state.days_until(&self.calendar, month, day)
    }

    pub fn format_time(&self) -> String {
        self.state.date.format_time()
    }

    pub fn display_date(&self) -> String {
        self.state.date.display_full(&self.calendar)
    }

    // =========================================================================
    // Special seasons
    // =========================================================================

    /// Starts a special season. Affects rolls from now on, not stored days.
    pub fn activate_season(&mut self, season: SpecialSeason) -> bool {
        let changed = self.state.activate_season(season);
        if changed {
            self.save();
            tracing::info!(season = %season.id(), "Special season started");
        }
        changed
    }

    pub fn end_season(&mut self, season: SpecialSeason) -> bool {
        let changed = self.state.end_season(season);
        if changed {
            self.save();
            tracing::info!(season = %season.id(), "Special season ended");
        }
        changed
    }

    // =========================================================================
    // Events and logs
    // =========================================================================

    pub fn add_custom_event(&mut self, event: CustomEvent) {
        tracing::info!(
            name = %event.name,
            month = event.month,
            day = event.day,
            "Custom event added"
        );
        self.state.add_custom_event(event);
        self.save();
    }

    pub fn remove_custom_event(&mut self, index: usize) -> Option<CustomEvent> {
        let removed = self.state.remove_custom_event(index)?;
        self.save();
        Some(removed)
    }

    pub fn log_today(&mut self, text: impl Into<String>, kind: LogKind) {
        self.state.log_today(text, kind, self.clock.now());
        self.save();
    }

    pub fn log_for_day(
        &mut self,
        year: i32,
        month: u8,
        day: u8,
        text: impl Into<String>,
        kind: LogKind,
    ) {
        self.state
            .events
            .append_log(year, month, day, text, kind, self.clock.now());
        self.save();
    }

    pub fn delete_log(
        &mut self,
        year: i32,
        month: u8,
        day: u8,
        index: usize,
    ) -> Option<DayLogEntry> {
        let removed = self.state.events.delete_log(year, month, day, index)?;
        self.save();
        Some(removed)
    }

    pub fn deadlines(&self) -> Vec<Deadline> {
        self.state.deadlines(&self.calendar)
    }

    // =========================================================================
    // Read models
    // =========================================================================

    pub fn today(&self) -> Option<DayView> {
        self.state.today(&self.calendar)
    }

    pub fn day_view(&self, year: i32, month: u8, day: u8) -> Option<DayView> {
        self.state.day_view(&self.calendar, year, month, day)
    }
}
