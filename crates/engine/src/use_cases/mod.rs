//! Use cases - orchestration of domain state, persistence and ports.
//!
//! Each service owns one persisted document, mutates it through the domain
//! crate and writes it back after every change.

pub mod bookmarks;
pub mod calendar;
pub mod encounter;
pub mod scratchpad;

pub use bookmarks::BookmarkService;
pub use calendar::CalendarService;
pub use encounter::EncounterService;
pub use scratchpad::ScratchpadService;
