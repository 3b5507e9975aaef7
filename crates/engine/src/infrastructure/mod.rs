//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod clock;
pub mod content;
pub mod persistence;
pub mod ports;
pub mod settings;
pub mod storage;
