//! Port traits for infrastructure boundaries.
//!
//! These are the only abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Key/value storage (could swap a JSON file -> browser storage or SQLite)
//! - Static campaign content (could swap a directory -> bundled assets)
//! - Clock/Random (for testing)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use uuid::Uuid;

use super::content::CampaignContent;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid content in {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

// =============================================================================
// Storage Port
// =============================================================================

/// Opaque string values under string keys.
///
/// Writes never fail from the caller's point of view. Adapters log what
/// they could not persist.
#[cfg_attr(test, mockall::automock)]
pub trait StoragePort: Send + Sync {
    fn save(&self, key: &str, value: &str);
    fn load(&self, key: &str) -> Option<String>;
    fn remove(&self, key: &str);
}

// =============================================================================
// Content Port
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentSourcePort: Send + Sync {
    /// Loads every collection once. Missing collections come back empty.
    async fn load(&self) -> Result<CampaignContent, ContentError>;
}

// =============================================================================
// Testability Ports
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[cfg_attr(test, mockall::automock)]
pub trait RandomPort: Send + Sync {
    /// Inclusive on both ends.
    fn gen_range(&self, min: i32, max: i32) -> i32;
    fn gen_uuid(&self) -> Uuid;
}
