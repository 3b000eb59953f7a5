//! Engine configuration and persisted user preferences
//!
//! [`EngineConfig`] is operator configuration, layered with figment:
//!
//! 1. Built-in defaults
//! 2. An optional TOML file
//! 3. Environment variables prefixed `KANBAN_` (e.g. `KANBAN_MAX_HISTORY=10`)
//!
//! [`EngineSettings`] are end-user preferences. They round-trip through a
//! [`SettingsStore`] as plain strings, one key per setting.

use crate::error::Result;
use crate::store::SettingsStore;
use crate::types::BoardId;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "KANBAN_";

/// Prefix for keys written to the settings store
pub const SETTINGS_KEY_PREFIX: &str = "kanban.settings.";

/// Operator configuration for an engine instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Route commands through the undo/redo history
    pub enable_undo_redo: bool,
    /// Undo entries kept before the oldest is dropped
    pub max_history: usize,
    /// Enforcement used by `move_task_default`
    pub enforce_wip_hard: bool,
    /// How long status messages stay up
    pub status_message_seconds: u64,
    /// Minimum spacing between done-aging runs triggered by ticks
    pub done_aging_interval_minutes: u64,
    /// Run auto-archive immediately when done/auto-archive settings change
    pub auto_archive_check_on_config_change: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_undo_redo: true,
            max_history: crate::command::DEFAULT_MAX_HISTORY,
            enforce_wip_hard: false,
            status_message_seconds: 4,
            done_aging_interval_minutes: 60,
            auto_archive_check_on_config_change: true,
        }
    }
}

impl EngineConfig {
    /// Load defaults, then `path` if given and present, then `KANBAN_*` env vars
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if path.exists() {
                debug!(path = %path.display(), "loading engine config file");
                figment = figment.merge(Toml::file(path));
            } else {
                debug!(path = %path.display(), "engine config file not found, using defaults");
            }
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Extract from a caller-built figment
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract()?;
        debug!(?config, "engine config loaded");
        Ok(config)
    }
}

/// Where newly added cards go in their column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddCardPlacement {
    Top,
    #[default]
    Bottom,
}

impl AddCardPlacement {
    fn as_str(self) -> &'static str {
        match self {
            AddCardPlacement::Top => "top",
            AddCardPlacement::Bottom => "bottom",
        }
    }
}

impl FromStr for AddCardPlacement {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(AddCardPlacement::Top),
            "bottom" => Ok(AddCardPlacement::Bottom),
            other => Err(format!("unknown placement '{}'", other)),
        }
    }
}

/// End-user preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub confirm_column_removals: bool,
    pub confirm_card_removals: bool,
    pub auto_save_after_edits: bool,
    pub add_card_placement: AddCardPlacement,
    pub last_board_id: Option<BoardId>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            confirm_column_removals: true,
            confirm_card_removals: true,
            auto_save_after_edits: true,
            add_card_placement: AddCardPlacement::Bottom,
            last_board_id: None,
        }
    }
}

const CONFIRM_COLUMN_REMOVALS: &str = "confirm_column_removals";
const CONFIRM_CARD_REMOVALS: &str = "confirm_card_removals";
const AUTO_SAVE_AFTER_EDITS: &str = "auto_save_after_edits";
const ADD_CARD_PLACEMENT: &str = "add_card_placement";
const LAST_BOARD_ID: &str = "last_board_id";

fn key(name: &str) -> String {
    format!("{}{}", SETTINGS_KEY_PREFIX, name)
}

fn parse_or<T: FromStr>(store: &dyn SettingsStore, name: &str, default: T) -> Result<T> {
    match store.get(&key(name))? {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => Ok(value),
            Err(_) => {
                warn!(setting = name, value = %raw, "ignoring unparseable setting");
                Ok(default)
            }
        },
        None => Ok(default),
    }
}

impl EngineSettings {
    /// Read every setting, keeping defaults for missing or malformed values
    pub fn load_from(store: &dyn SettingsStore) -> Result<Self> {
        let defaults = Self::default();
        let last_board_id = store
            .get(&key(LAST_BOARD_ID))?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(BoardId::from_string);
        Ok(Self {
            confirm_column_removals: parse_or(
                store,
                CONFIRM_COLUMN_REMOVALS,
                defaults.confirm_column_removals,
            )?,
            confirm_card_removals: parse_or(
                store,
                CONFIRM_CARD_REMOVALS,
                defaults.confirm_card_removals,
            )?,
            auto_save_after_edits: parse_or(
                store,
                AUTO_SAVE_AFTER_EDITS,
                defaults.auto_save_after_edits,
            )?,
            add_card_placement: parse_or(store, ADD_CARD_PLACEMENT, defaults.add_card_placement)?,
            last_board_id,
        })
    }

    /// Write every setting
    pub fn save_to(&self, store: &dyn SettingsStore) -> Result<()> {
        store.set(
            &key(CONFIRM_COLUMN_REMOVALS),
            &self.confirm_column_removals.to_string(),
        )?;
        store.set(
            &key(CONFIRM_CARD_REMOVALS),
            &self.confirm_card_removals.to_string(),
        )?;
        store.set(
            &key(AUTO_SAVE_AFTER_EDITS),
            &self.auto_save_after_edits.to_string(),
        )?;
        store.set(&key(ADD_CARD_PLACEMENT), self.add_card_placement.as_str())?;
        match &self.last_board_id {
            Some(id) => store.set(&key(LAST_BOARD_ID), id.as_str())?,
            None => store.remove(&key(LAST_BOARD_ID))?,
        }
        Ok(())
    }
}
