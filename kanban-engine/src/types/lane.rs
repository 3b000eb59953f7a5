//! Lanes (swimlanes) and lane-key normalization
//!
//! A lane is a grouping key orthogonal to columns. Tasks reference lanes by id
//! only; a missing, blank, `"0"` or `"__unassigned__"` id all mean the task
//! sits in the canonical Unassigned lane.

use super::ids::LaneId;
use serde::{Deserialize, Serialize};

/// Canonical key of the Unassigned lane
pub const UNASSIGNED_LANE_KEY: &str = "__unassigned__";

/// A swimlane providing horizontal grouping orthogonal to columns
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lane {
    pub id: LaneId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Lane {
    /// Create a new lane with a fresh id
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: LaneId::new(),
            title: title.into(),
            description: None,
        }
    }

    /// Set an explicit id
    pub fn with_id(mut self, id: impl Into<LaneId>) -> Self {
        self.id = id.into();
        self
    }
}

/// True when the lane id resolves to the Unassigned lane.
pub fn is_unassigned_lane_id(lane_id: Option<&str>) -> bool {
    match lane_id.map(str::trim) {
        None | Some("") | Some("0") => true,
        Some(trimmed) => trimmed == UNASSIGNED_LANE_KEY,
    }
}

/// Trim a lane id, mapping blank ids to `None`.
///
/// Unlike [`lane_key`] this keeps `"0"` and the sentinel as-is.
pub fn normalize_lane_id(lane_id: Option<&str>) -> Option<String> {
    lane_id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Key used to group tasks for WIP purposes.
///
/// Every spelling of "unassigned" collapses to [`UNASSIGNED_LANE_KEY`];
/// everything else is trimmed.
pub fn lane_key(lane_id: Option<&str>) -> String {
    if is_unassigned_lane_id(lane_id) {
        return UNASSIGNED_LANE_KEY.to_string();
    }
    normalize_lane_id(lane_id).unwrap_or_else(|| UNASSIGNED_LANE_KEY.to_string())
}

/// Two lane ids are equal for WIP purposes iff their keys are equal.
pub fn lane_keys_match(left: Option<&str>, right: Option<&str>) -> bool {
    lane_key(left) == lane_key(right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_unassigned_spellings() {
        for id in [None, Some(""), Some("   "), Some("0"), Some(" 0 "), Some("__unassigned__")] {
            assert!(is_unassigned_lane_id(id), "{:?} should be unassigned", id);
            assert_eq!(lane_key(id), UNASSIGNED_LANE_KEY);
        }
        assert!(!is_unassigned_lane_id(Some("Engineering")));
    }

    #[test]
    fn test_keys_are_trimmed() {
        assert_eq!(lane_key(Some(" Engineering ")), "Engineering");
        assert!(lane_keys_match(Some("Engineering"), Some(" Engineering ")));
        assert!(!lane_keys_match(Some("Engineering"), Some("engineering")));
    }

    #[test]
    fn test_normalize_lane_id() {
        assert_eq!(normalize_lane_id(Some("  ops ")), Some("ops".to_string()));
        assert_eq!(normalize_lane_id(Some("  ")), None);
        assert_eq!(normalize_lane_id(None), None);
    }

    proptest! {
        #[test]
        fn prop_lane_key_ignores_surrounding_whitespace(
            core in "[A-Za-z][A-Za-z0-9_-]{0,12}",
            left in " {0,3}",
            right in " {0,3}",
        ) {
            let padded = format!("{}{}{}", left, core, right);
            prop_assert!(lane_keys_match(Some(&core), Some(&padded)));
        }

        #[test]
        fn prop_lane_key_is_idempotent(raw in "[ A-Za-z0-9_]{0,16}") {
            let once = lane_key(Some(&raw));
            prop_assert_eq!(lane_key(Some(&once)), once.clone());
        }
    }
}
