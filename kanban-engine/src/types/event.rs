//! Events raised to collaborators, and the move result type

use super::board::GroupBy;
use super::ids::{BoardId, ColumnId, LaneId, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Outcome of a guarded move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveResult {
    /// The move completed
    Success,
    /// An observer canceled the move (this includes the blocked-task gate)
    CanceledByEvent,
    /// The move would exceed a WIP limit under hard enforcement
    BlockedByWip,
    /// The move completed but the target is now over its WIP limit
    AllowedWithWipWarning,
    /// The task is not on the board
    NotFound,
}

impl MoveResult {
    /// True when the task actually moved
    pub fn is_moved(self) -> bool {
        matches!(self, MoveResult::Success | MoveResult::AllowedWithWipWarning)
    }
}

/// Which persistence call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceOperation {
    SaveBoard,
    LoadBoard,
    ListBoards,
    RenameBoard,
    DeleteBoard,
    DuplicateBoard,
    ExportBoard,
    SaveSettings,
    LoadSettings,
}

impl fmt::Display for PersistenceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PersistenceOperation::SaveBoard => "save board",
            PersistenceOperation::LoadBoard => "load board",
            PersistenceOperation::ListBoards => "list boards",
            PersistenceOperation::RenameBoard => "rename board",
            PersistenceOperation::DeleteBoard => "delete board",
            PersistenceOperation::DuplicateBoard => "duplicate board",
            PersistenceOperation::ExportBoard => "export board",
            PersistenceOperation::SaveSettings => "save settings",
            PersistenceOperation::LoadSettings => "load settings",
        };
        f.write_str(name)
    }
}

/// Informational events. Raised synchronously after the change is applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardEvent {
    CardMoved {
        task_id: TaskId,
        source_column_id: ColumnId,
        target_column_id: ColumnId,
    },
    CardEdited {
        task_id: TaskId,
    },
    ColumnEdited {
        column_id: ColumnId,
    },
    BoardEdited {
        /// Name of the board property that changed, when known
        property: Option<String>,
    },
    LaneGroupingChanged {
        group_by: GroupBy,
    },
    /// One or more tasks changed their search-match flag
    SearchFilterChanged {
        changed: usize,
    },
    PersistenceFailed {
        operation: PersistenceOperation,
        error: String,
    },
    BoardLoaded {
        board_id: BoardId,
    },
    BoardSaved {
        board_id: BoardId,
    },
    /// The transient status message was set (`Some`) or cleared (`None`)
    StatusMessage {
        message: Option<String>,
    },
}

/// Cancelable notification raised before a guarded move mutates anything
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardMovingArgs {
    pub task_id: TaskId,
    pub source_column_id: ColumnId,
    pub target_column_id: ColumnId,
    pub target_index: usize,
    /// Lane the task will have after the move
    pub target_lane_id: Option<LaneId>,
    /// Effective WIP count after the move
    pub target_wip_count: usize,
    pub target_wip_limit: Option<u32>,
    pub would_exceed_wip: bool,
    /// Set by any observer to veto the move
    pub cancel: bool,
    pub cancel_reason: Option<String>,
}

/// Receives engine notifications on the engine's own thread
pub trait BoardObserver: Send {
    /// Called before a guarded move. Set `args.cancel` to veto it.
    fn card_moving(&mut self, _args: &mut CardMovingArgs) {}

    /// Called after a change has been applied
    fn on_event(&mut self, _event: &BoardEvent) {}
}

#[derive(Debug, Default)]
struct Recorded {
    events: Vec<BoardEvent>,
    moving: Vec<CardMovingArgs>,
}

/// Observer that records everything it sees into a shared buffer.
///
/// Clones share the same buffer, so keep one clone and register the other.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    inner: Arc<Mutex<Recorded>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn recorded(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the recorded events
    pub fn events(&self) -> Vec<BoardEvent> {
        self.recorded().events.clone()
    }

    /// Snapshot of the recorded CardMoving notifications
    pub fn moving(&self) -> Vec<CardMovingArgs> {
        self.recorded().moving.clone()
    }

    /// Drain the recorded events
    pub fn take(&self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.recorded().events)
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        let mut recorded = self.recorded();
        recorded.events.clear();
        recorded.moving.clear();
    }

    /// Count events matching a predicate
    pub fn count(&self, predicate: impl Fn(&BoardEvent) -> bool) -> usize {
        self.recorded().events.iter().filter(|e| predicate(e)).count()
    }
}

impl BoardObserver for EventRecorder {
    fn card_moving(&mut self, args: &mut CardMovingArgs) {
        self.recorded().moving.push(args.clone());
    }

    fn on_event(&mut self, event: &BoardEvent) {
        self.recorded().events.push(event.clone());
    }
}
