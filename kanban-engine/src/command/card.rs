//! Commands that create, remove, or edit a single card in place

use super::{insert_task, take_task, Change};
use crate::types::{Board, ColumnId, Palette, Task, TaskId};
use chrono::{DateTime, Utc};

/// Insert a new task into a column.
///
/// While the task is off the board (before apply, after revert) the command
/// holds it.
#[derive(Debug, Clone, PartialEq)]
pub struct AddCard {
    pub(crate) task_id: TaskId,
    pub(crate) column_id: ColumnId,
    pub(crate) index: usize,
    parked: Option<Task>,
}

impl AddCard {
    pub fn new(task: Task, column_id: ColumnId, index: usize) -> Self {
        Self {
            task_id: task.id.clone(),
            column_id,
            index,
            parked: Some(task),
        }
    }

    pub(crate) fn apply(&mut self, board: &mut Board) {
        if let Some(task) = self.parked.take() {
            if let Err(task) = insert_task(board, &self.column_id, self.index, task) {
                self.parked = Some(task);
            }
        }
    }

    pub(crate) fn revert(&mut self, board: &mut Board) {
        if let Some(task) = take_task(board, &self.task_id) {
            self.parked = Some(task);
        }
    }
}

/// Hard-remove a task, remembering where it was
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteCard {
    pub(crate) task_id: TaskId,
    column_id: ColumnId,
    index: usize,
    parked: Option<Task>,
}

impl DeleteCard {
    pub fn new(task_id: TaskId, column_id: ColumnId, index: usize) -> Self {
        Self {
            task_id,
            column_id,
            index,
            parked: None,
        }
    }

    pub(crate) fn apply(&mut self, board: &mut Board) {
        if let Some(task) = take_task(board, &self.task_id) {
            self.parked = Some(task);
        }
    }

    pub(crate) fn revert(&mut self, board: &mut Board) {
        if let Some(task) = self.parked.take() {
            if let Err(task) = insert_task(board, &self.column_id, self.index, task) {
                self.parked = Some(task);
            }
        }
    }
}

/// Edit title, description, and palette
#[derive(Debug, Clone, PartialEq)]
pub struct EditCard {
    pub(crate) task_id: TaskId,
    title: Change<String>,
    description: Change<String>,
    palette: Change<Palette>,
}

impl EditCard {
    /// Unset values keep the task's current value
    pub fn new(
        task: &Task,
        title: Option<String>,
        description: Option<String>,
        palette: Option<Palette>,
    ) -> Self {
        Self {
            task_id: task.id.clone(),
            title: Change::new(task.title.clone(), title.unwrap_or_else(|| task.title.clone())),
            description: Change::new(
                task.description.clone(),
                description.unwrap_or_else(|| task.description.clone()),
            ),
            palette: Change::new(task.palette, palette.unwrap_or(task.palette)),
        }
    }

    /// True when the edit would change nothing
    pub fn is_noop(&self) -> bool {
        self.title.old == self.title.new
            && self.description.old == self.description.new
            && self.palette.old == self.palette.new
    }

    pub(crate) fn apply(&mut self, board: &mut Board) {
        if let Some(task) = board.task_mut(&self.task_id) {
            task.title = self.title.new.clone();
            task.description = self.description.new.clone();
            task.palette = self.palette.new;
        }
    }

    pub(crate) fn revert(&mut self, board: &mut Board) {
        if let Some(task) = board.task_mut(&self.task_id) {
            task.title = self.title.old.clone();
            task.description = self.description.old.clone();
            task.palette = self.palette.old;
        }
    }
}

/// The blocked fields of a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedState {
    pub is_blocked: bool,
    pub reason: Option<String>,
    pub since: Option<DateTime<Utc>>,
}

impl BlockedState {
    fn of(task: &Task) -> Self {
        Self {
            is_blocked: task.is_blocked,
            reason: task.blocked_reason.clone(),
            since: task.blocked_since,
        }
    }

    fn write(&self, task: &mut Task) {
        task.is_blocked = self.is_blocked;
        task.blocked_reason = self.reason.clone();
        task.blocked_since = self.since;
    }
}

/// Block or unblock a task
#[derive(Debug, Clone, PartialEq)]
pub struct SetBlocked {
    pub(crate) task_id: TaskId,
    pub(crate) old: BlockedState,
    pub(crate) new: BlockedState,
}

impl SetBlocked {
    /// Blocking keeps an existing `blocked_since` and reason unless a new
    /// reason is given. Unblocking clears both.
    pub fn new(task: &Task, blocked: bool, reason: Option<String>, now: DateTime<Utc>) -> Self {
        let old = BlockedState::of(task);
        let new = if blocked {
            BlockedState {
                is_blocked: true,
                reason: reason.or_else(|| old.reason.clone()),
                since: old.since.or(Some(now)),
            }
        } else {
            BlockedState {
                is_blocked: false,
                reason: None,
                since: None,
            }
        };
        Self {
            task_id: task.id.clone(),
            old,
            new,
        }
    }

    pub(crate) fn apply(&mut self, board: &mut Board) {
        if let Some(task) = board.task_mut(&self.task_id) {
            self.new.write(task);
        }
    }

    pub(crate) fn revert(&mut self, board: &mut Board) {
        if let Some(task) = board.task_mut(&self.task_id) {
            self.old.write(task);
        }
    }
}
