//! Campaign calendar: static definition, dates and the persisted state

mod date;
mod definition;
mod state;

pub use date::{CalendarDate, TimeUnit, DAWN_HOUR, HOURS_PER_DAY, SUNSET_HOUR};
pub use definition::{
    CalendarDefinition, FixedEvent, FixedEventKind, MonthDefinition, SpecialSeasonInfo,
    DAYS_PER_WEEK, MAX_WYSENDAYS, MONTHS_PER_YEAR, STANDARD_DAYS,
};
pub use state::{AdvanceOutcome, CalendarState, DayView, CALENDAR_SCHEMA_VERSION, REST_NOTICE};
