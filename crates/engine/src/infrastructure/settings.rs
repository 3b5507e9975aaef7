//! Runtime settings read from the environment.

use chrono::Duration;
use std::path::PathBuf;

use vault_domain::{DiceFormula, DEFAULT_AUTOSAVE_DELAY_MS};

use super::storage::FileStorage;

pub const DEFAULT_CONTENT_DIR: &str = "./data";
pub const DEFAULT_INITIATIVE_DICE: &str = "1d6";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Directory holding the campaign JSON files
    pub content_dir: PathBuf,
    /// JSON file backing the key/value storage
    pub storage_path: PathBuf,
    /// Quiet period before scratchpad edits are committed
    pub autosave_delay: Duration,
    /// Rolled per PC and per monster squad
    pub initiative_dice: DiceFormula,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from(DEFAULT_CONTENT_DIR),
            storage_path: FileStorage::default_path(),
            autosave_delay: Duration::milliseconds(DEFAULT_AUTOSAVE_DELAY_MS),
            initiative_dice: DiceFormula::ONE_D6,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any variable source. Unparseable values fall
    /// back to the default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let content_dir = lookup("VAULT_CONTENT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.content_dir);
        let storage_path = lookup("VAULT_STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_path);

        let autosave_delay = match lookup("VAULT_AUTOSAVE_DELAY_MS") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(ms) => Duration::milliseconds(i64::from(ms)),
                Err(e) => {
                    tracing::warn!(
                        value = %raw,
                        error = %e,
                        "Invalid VAULT_AUTOSAVE_DELAY_MS, using default"
                    );
                    defaults.autosave_delay
                }
            },
            None => defaults.autosave_delay,
        };

        let initiative_dice = match lookup("VAULT_INITIATIVE_DICE") {
            Some(raw) => DiceFormula::parse(&raw).unwrap_or_else(|e| {
                tracing::warn!(
                    value = %raw,
                    error = %e,
                    "Invalid VAULT_INITIATIVE_DICE, using default"
                );
                defaults.initiative_dice
            }),
            None => defaults.initiative_dice,
        };

        Self {
            content_dir,
            storage_path,
            autosave_delay,
            initiative_dice,
        }
    }
}
