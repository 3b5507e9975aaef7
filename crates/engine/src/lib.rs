//! Campaign vault engine library.
//!
//! ## Structure
//!
//! - `use_cases/` - Calendar, encounter, scratchpad and bookmark services
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
