//! Campaign vault domain: calendar, weather, moon signs, encounters and notes.
//!
//! Pure logic only. Randomness arrives as a `FnMut(min, max) -> i32` range
//! generator (inclusive bounds) and the current instant as a `DateTime<Utc>`.

pub mod bookmarks;
pub mod calendar;
pub mod dice;
pub mod encounter;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod moon;
pub mod scratchpad;
pub mod weather;

pub use bookmarks::{EntityKind, PinnedEntry, PinnedList, RecentEntry, RecentList, MAX_RECENT};

pub use calendar::{
    AdvanceOutcome, CalendarDate, CalendarDefinition, CalendarState, DayView, FixedEvent,
    FixedEventKind, MonthDefinition, SpecialSeasonInfo, TimeUnit, CALENDAR_SCHEMA_VERSION,
    REST_NOTICE,
};

pub use dice::{DiceFormula, DiceParseError, DiceRollResult};

pub use encounter::{
    CombatLogLine, CombatantKind, CombatantRef, EncounterPhase, EncounterState, InitiativeEntry,
    MonsterInstance, MonsterSquad, MonsterTemplate, PartyMember, RoundOutcome, TurnOutcome,
    STANDARD_CONDITIONS,
};

pub use error::DomainError;

pub use ids::{EncounterId, SessionId};

pub use ledger::{
    CustomEvent, CustomEventKind, DayEvent, DayEventKind, DayLogEntry, Deadline, EventLedger,
    LogKind,
};

pub use moon::{LunarPhase, MonthSigns, MoonEffect, MoonPhase, MoonSign, MoonSignLedger};

pub use scratchpad::{
    Debouncer, ScratchSession, SessionHistory, DEFAULT_AUTOSAVE_DELAY_MS, MAX_SESSION_HISTORY,
};

pub use weather::{
    roll_for_day, ActiveSeasons, SpecialSeason, WeatherEffect, WeatherLedger, WeatherRecord,
    WeatherSeason,
};
