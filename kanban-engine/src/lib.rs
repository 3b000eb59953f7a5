//! Kanban board domain engine
//!
//! This crate owns the rules of a kanban board: where a card may move, what
//! a move does to its lane and completion time, and how those changes are
//! undone. Rendering and dialogs are left to the caller.
//!
//! ## Overview
//!
//! - **Guarded moves** - WIP limits (per column, or per lane inside a column)
//!   either block or warn; blocked cards cannot move forward or into the
//!   archive; observers may veto a move before anything changes
//! - **Undoable commands** - add, delete, move, archive, edit, and block
//!   changes are recorded and can be reverted exactly
//! - **Done aging** - cards in the done column are stamped on arrival and
//!   archived after a configurable number of days
//! - **Selection and bulk operations** over the selected cards
//! - **Search** - free text or structured criteria drive a per-card match flag
//! - **Persistence** through pluggable board and settings stores
//!
//! ## Basic Usage
//!
//! ```rust
//! use kanban_engine::{Board, Column, KanbanEngine, MoveResult, Task};
//!
//! let doing = Column::new("Doing").with_wip_limit(1);
//! let doing_id = doing.id.clone();
//! let todo = Column::new("Todo");
//! let todo_id = todo.id.clone();
//! let board = Board::new("Release").with_column(todo).with_column(doing);
//!
//! let mut engine = KanbanEngine::new(board);
//! let first = engine.add_task(&todo_id, Task::new("Write notes")).unwrap();
//! let second = engine.add_task(&todo_id, Task::new("Tag release")).unwrap();
//!
//! assert_eq!(
//!     engine.try_move_task_with_wip_enforcement(&first, &doing_id, None, None, true),
//!     MoveResult::Success
//! );
//! assert_eq!(
//!     engine.try_move_task_with_wip_enforcement(&second, &doing_id, None, None, true),
//!     MoveResult::BlockedByWip
//! );
//! assert!(engine.undo());
//! ```

pub mod clock;
pub mod command;
pub mod config;
mod engine;
mod error;
pub mod search;
mod shared;
pub mod store;
pub mod strings;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AddCardPlacement, EngineConfig, EngineSettings};
pub use engine::{DoneTimestampUpdate, KanbanEngine, StatusMessage, WipContext};
pub use error::{KanbanError, Result};
pub use search::{DateRange, FilterCriteria};
pub use shared::SharedEngine;
pub use store::{BoardStore, FileBoardStore, MemoryBoardStore, MemorySettingsStore, SettingsStore};
pub use strings::{BuiltinStrings, MapStrings, StringLookup};

// Re-export commonly used types
pub use types::{
    Board, BoardEvent, BoardId, BoardMetadata, BoardObserver, BoardStatistics, CardMovingArgs,
    Column, ColumnId, EventRecorder, GroupBy, Lane, LaneId, MoveResult, Palette,
    PersistenceOperation, Priority, Subtask, SubtaskId, Task, TaskId, TaskPatch,
};
