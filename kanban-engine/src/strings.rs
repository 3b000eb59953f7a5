//! User-facing string lookup
//!
//! The engine never hard-codes display text. It asks a [`StringLookup`] for a
//! key and supplies the English fallback.

use std::collections::HashMap;

pub const KEY_BLOCKED: &str = "Kanban_Blocked";
pub const KEY_ARCHIVE_COLUMN: &str = "Kanban_ArchiveColumn";
pub const KEY_WIP_WARNING: &str = "Kanban_WipWarning";
pub const KEY_BOARD_UNTITLED: &str = "Kanban_Board_Untitled";
pub const KEY_LANES_UNASSIGNED: &str = "Kanban_Lanes_Unassigned";
pub const KEY_COLUMN_BACKLOG: &str = "Kanban_Column_Backlog";
pub const KEY_COLUMN_TODO: &str = "Kanban_Column_ToDo";
pub const KEY_COLUMN_IN_PROGRESS: &str = "Kanban_Column_InProgress";
pub const KEY_COLUMN_DONE: &str = "Kanban_Column_Done";

/// Resolves a key to localized text
pub trait StringLookup: Send + Sync {
    fn get_string(&self, key: &str, fallback: &str) -> String;
}

/// Always returns the fallback
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinStrings;

impl StringLookup for BuiltinStrings {
    fn get_string(&self, _key: &str, fallback: &str) -> String {
        fallback.to_string()
    }
}

/// Table of overrides; unknown keys fall back
#[derive(Debug, Clone, Default)]
pub struct MapStrings {
    strings: HashMap<String, String>,
}

impl MapStrings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.strings.insert(key.into(), value.into());
        self
    }
}

impl StringLookup for MapStrings {
    fn get_string(&self, key: &str, fallback: &str) -> String {
        self.strings
            .get(key)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Substitute `{0}`, `{1}`, ... placeholders
pub fn format_placeholders(template: &str, args: &[&str]) -> String {
    args.iter()
        .enumerate()
        .fold(template.to_string(), |text, (i, arg)| {
            text.replace(&format!("{{{}}}", i), arg)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_strings_fall_back() {
        let strings = MapStrings::new().with(KEY_BLOCKED, "Blockiert");
        assert_eq!(strings.get_string(KEY_BLOCKED, "Blocked"), "Blockiert");
        assert_eq!(strings.get_string(KEY_ARCHIVE_COLUMN, "Archive"), "Archive");
        assert_eq!(BuiltinStrings.get_string(KEY_BLOCKED, "Blocked"), "Blocked");
    }

    #[test]
    fn test_format_placeholders() {
        assert_eq!(
            format_placeholders("WIP limit exceeded ({0}).", &["3/2"]),
            "WIP limit exceeded (3/2)."
        );
        assert_eq!(format_placeholders("{1} then {0}", &["a", "b"]), "b then a");
    }
}
