//! In-world date and the arithmetic over it

use serde::{Deserialize, Serialize};
use std::fmt;

use super::definition::CalendarDefinition;

/// Hour the sun sets.
pub const SUNSET_HOUR: u8 = 18;
/// Hour the sun rises.
pub const DAWN_HOUR: u8 = 6;
pub const HOURS_PER_DAY: u8 = 24;

// ============================================================================
// TimeUnit
// ============================================================================

/// Units the game master can advance time by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    /// One hour; wraps past midnight into the next day
    Hour,
    /// Jump to 18:00; if already at or past it, 18:00 on the next day
    ToSunset,
    /// 06:00 on the next day
    ToDawn,
    Day,
    /// Seven single-day advances
    Week,
    /// A long rest: 06:00 on the next day
    Rest,
}

impl TimeUnit {
    pub fn display_name(&self) -> &'static str {
        match self {
            TimeUnit::Hour => "+1 Hour",
            TimeUnit::ToSunset => "To Sunset",
            TimeUnit::ToDawn => "To Dawn",
            TimeUnit::Day => "+1 Day",
            TimeUnit::Week => "+1 Week",
            TimeUnit::Rest => "Long Rest",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// CalendarDate
// ============================================================================

/// A position in campaign time, down to the hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarDate {
    pub year: i32,
    /// Month number, 1-indexed
    pub month: u8,
    /// Day of month, 1-indexed
    pub day: u8,
    /// Hour, 0-23
    pub hour: u8,
}

impl CalendarDate {
    pub fn new(year: i32, month: u8, day: u8, hour: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
        }
    }

    /// Noon on the 4th of Obthryme, 376: where a fresh campaign begins.
    pub fn campaign_start() -> Self {
        Self::new(376, 11, 4, 12)
    }

    /// Moves to the next day, rolling month and year.
    ///
    /// Returns `true` when the step crossed into a new year.
    pub fn next_day(&mut self, calendar: &CalendarDefinition) -> bool {
        self.day += 1;
        if self.day <= calendar.days_in_month(self.month) {
            return false;
        }
        self.day = 1;
        self.month += 1;
        if self.month <= calendar.month_count() {
            return false;
        }
        self.month = 1;
        self.year += 1;
        true
    }

    /// Signed day distance to a date in the same year.
    ///
    /// Positive for dates ahead, zero for today, negative for dates already
    /// past. Never wraps into the next year.
    pub fn days_until(&self, calendar: &CalendarDefinition, month: u8, day: u8) -> i32 {
        let days_in = |m: u8| calendar.days_in_month(m) as i32;
        let (current_month, current_day) = (self.month, self.day as i32);
        let target_day = day as i32;

        if month == current_month {
            return target_day - current_day;
        }

        if month > current_month {
            let rest_of_month = days_in(current_month) - current_day;
            let between: i32 = (current_month + 1..month).map(days_in).sum();
            rest_of_month + between + target_day
        } else {
            let rest_of_target = days_in(month) - target_day;
            let between: i32 = (month + 1..current_month).map(days_in).sum();
            -(rest_of_target + between + current_day)
        }
    }

    /// Browses to another month, wrapping the year and clamping the day.
    pub fn change_month(&mut self, delta: i32, calendar: &CalendarDefinition) {
        let months = calendar.month_count().max(1) as i32;
        let zero_based = self.month as i32 - 1 + delta;
        self.year += zero_based.div_euclid(months);
        self.month = (zero_based.rem_euclid(months) + 1) as u8;

        let days = calendar.days_in_month(self.month);
        if self.day > days {
            self.day = days;
        }
    }

    /// Sets the day within the current month. Out-of-range days are ignored.
    ///
    /// Returns whether the date changed.
    pub fn jump_to_day(&mut self, day: u8, calendar: &CalendarDefinition) -> bool {
        let in_range = calendar
            .month(self.month)
            .is_some_and(|m| m.contains_day(day));
        if in_range && day != self.day {
            self.day = day;
            return true;
        }
        false
    }

    /// Pulls a date that does not exist in `calendar` back inside it:
    /// month into 1..=12, day into the month, hour into 0..=23.
    ///
    /// Returns `true` if anything changed.
    pub fn clamp_to(&mut self, calendar: &CalendarDefinition) -> bool {
        let before = *self;
        self.month = self.month.clamp(1, calendar.month_count().max(1));
        self.day = self.day.clamp(1, calendar.days_in_month(self.month).max(1));
        self.hour = self.hour.min(HOURS_PER_DAY - 1);
        *self != before
    }

    /// Clock time on a 12-hour dial, e.g. "12:00 PM".
    pub fn format_time(&self) -> String {
        let period = if self.hour >= 12 { "PM" } else { "AM" };
        let display_hour = match self.hour % 12 {
            0 => 12,
            h => h,
        };
        format!("{}:00 {}", display_hour, period)
    }

    /// e.g. "4th of Obthryme, Year 376"
    pub fn display_full(&self, calendar: &CalendarDefinition) -> String {
        let month_name = calendar
            .month(self.month)
            .map_or("Unknown", |m| m.name.as_str());
        format!(
            "{}{} of {}, Year {}",
            self.day,
            ordinal_suffix(self.day),
            month_name,
            self.year
        )
    }
}

impl Default for CalendarDate {
    fn default() -> Self {
        Self::campaign_start()
    }
}

/// Returns the ordinal suffix for a day number (st, nd, rd, th).
fn ordinal_suffix(day: u8) -> &'static str {
    match day {
        1 | 21 | 31 => "st",
        2 | 22 => "nd",
        3 | 23 => "rd",
        _ => "th",
    }
}
