//! Identifier newtypes
//!
//! Every entity on the board is addressed by a string id. Fresh ids are ULIDs;
//! ids loaded from storage are kept verbatim so that references written by
//! other tools still resolve.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh ULID-based id
            pub fn new() -> Self {
                Self(ulid::Ulid::new().to_string())
            }

            /// Wrap an existing id string
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Get the id as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Identifier of a board (also its storage key)
    BoardId
);
define_id!(
    /// Identifier of a column
    ColumnId
);
define_id!(
    /// Identifier of a lane (swimlane)
    LaneId
);
define_id!(
    /// Identifier of a task/card
    TaskId
);
define_id!(
    /// Identifier of a subtask
    SubtaskId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_ulids() {
        let id = TaskId::new();
        assert_eq!(id.as_str().len(), 26);
        assert_ne!(id, TaskId::new());
    }

    #[test]
    fn test_from_string_round_trips() {
        let id = ColumnId::from_string("doing");
        assert_eq!(id.as_str(), "doing");
        assert_eq!(id.to_string(), "doing");
        assert_eq!(ColumnId::from("doing"), id);
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let id = LaneId::from_string("eng");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"eng\"");
    }
}
