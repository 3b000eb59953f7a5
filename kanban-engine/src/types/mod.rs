//! Core types for the kanban engine

mod board;
mod event;
mod ids;
mod lane;
mod task;

// Re-export all types
pub use board::{
    Board, BoardMetadata, BoardStatistics, Column, GroupBy, BOARD_SCHEMA_VERSION,
    DEFAULT_AUTO_ARCHIVE_DAYS, MAX_AUTO_ARCHIVE_DAYS,
};
pub use event::{
    BoardEvent, BoardObserver, CardMovingArgs, EventRecorder, MoveResult, PersistenceOperation,
};
pub use ids::{BoardId, ColumnId, LaneId, SubtaskId, TaskId};
pub use lane::{
    is_unassigned_lane_id, lane_key, lane_keys_match, normalize_lane_id, Lane, UNASSIGNED_LANE_KEY,
};
pub use task::{Palette, Priority, Subtask, Task, TaskPatch};
