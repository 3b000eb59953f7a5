//! Reversible board mutations
//!
//! Every undoable change is one [`Command`] variant. A command captures all
//! the state it needs when it is constructed, so `apply` and `revert` never
//! fail. Entities are referenced by id and resolved lazily: if a column has
//! since disappeared the step is skipped rather than panicking.

mod card;
mod history;
mod transfer;

pub use card::{AddCard, BlockedState, DeleteCard, EditCard, SetBlocked};
pub use history::{CommandHistory, DEFAULT_MAX_HISTORY};
pub use transfer::{ArchiveCard, ArchiveState, MoveCard};

use crate::types::{Board, ColumnId, Task, TaskId};

/// An old/new value pair captured at construction time
#[derive(Debug, Clone, PartialEq)]
pub struct Change<T> {
    pub old: T,
    pub new: T,
}

impl<T> Change<T> {
    pub fn new(old: T, new: T) -> Self {
        Self { old, new }
    }
}

impl<T: PartialEq> Change<T> {
    /// `None` when old and new are equal
    pub fn if_changed(old: T, new: T) -> Option<Self> {
        (old != new).then_some(Self { old, new })
    }
}

/// The closed set of undoable operations
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddCard(AddCard),
    DeleteCard(DeleteCard),
    MoveCard(MoveCard),
    ArchiveCard(ArchiveCard),
    EditCard(EditCard),
    SetBlocked(SetBlocked),
}

impl Command {
    /// Perform the change
    pub fn apply(&mut self, board: &mut Board) {
        match self {
            Command::AddCard(cmd) => cmd.apply(board),
            Command::DeleteCard(cmd) => cmd.apply(board),
            Command::MoveCard(cmd) => cmd.apply(board),
            Command::ArchiveCard(cmd) => cmd.apply(board),
            Command::EditCard(cmd) => cmd.apply(board),
            Command::SetBlocked(cmd) => cmd.apply(board),
        }
    }

    /// Reverse the change
    pub fn revert(&mut self, board: &mut Board) {
        match self {
            Command::AddCard(cmd) => cmd.revert(board),
            Command::DeleteCard(cmd) => cmd.revert(board),
            Command::MoveCard(cmd) => cmd.revert(board),
            Command::ArchiveCard(cmd) => cmd.revert(board),
            Command::EditCard(cmd) => cmd.revert(board),
            Command::SetBlocked(cmd) => cmd.revert(board),
        }
    }

    /// The task this command operates on
    pub fn task_id(&self) -> &TaskId {
        match self {
            Command::AddCard(cmd) => &cmd.task_id,
            Command::DeleteCard(cmd) => &cmd.task_id,
            Command::MoveCard(cmd) => &cmd.task_id,
            Command::ArchiveCard(cmd) => &cmd.task_id,
            Command::EditCard(cmd) => &cmd.task_id,
            Command::SetBlocked(cmd) => &cmd.task_id,
        }
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Command::AddCard(_) => "add_card",
            Command::DeleteCard(_) => "delete_card",
            Command::MoveCard(_) => "move_card",
            Command::ArchiveCard(cmd) if cmd.archive => "archive_card",
            Command::ArchiveCard(_) => "unarchive_card",
            Command::EditCard(_) => "edit_card",
            Command::SetBlocked(cmd) if cmd.new.is_blocked => "block_card",
            Command::SetBlocked(_) => "unblock_card",
        }
    }
}

impl From<AddCard> for Command {
    fn from(cmd: AddCard) -> Self {
        Command::AddCard(cmd)
    }
}

impl From<DeleteCard> for Command {
    fn from(cmd: DeleteCard) -> Self {
        Command::DeleteCard(cmd)
    }
}

impl From<MoveCard> for Command {
    fn from(cmd: MoveCard) -> Self {
        Command::MoveCard(cmd)
    }
}

impl From<ArchiveCard> for Command {
    fn from(cmd: ArchiveCard) -> Self {
        Command::ArchiveCard(cmd)
    }
}

impl From<EditCard> for Command {
    fn from(cmd: EditCard) -> Self {
        Command::EditCard(cmd)
    }
}

impl From<SetBlocked> for Command {
    fn from(cmd: SetBlocked) -> Self {
        Command::SetBlocked(cmd)
    }
}

/// Remove a task from wherever it is
pub(crate) fn take_task(board: &mut Board, task_id: &TaskId) -> Option<Task> {
    let (ci, ti) = board.locate_task(task_id)?;
    Some(board.columns[ci].tasks.remove(ti))
}

/// Insert a task at `index` (clamped to the column length).
///
/// Hands the task back if the column no longer exists.
pub(crate) fn insert_task(
    board: &mut Board,
    column_id: &ColumnId,
    index: usize,
    task: Task,
) -> Result<(), Task> {
    match board.column_mut(column_id) {
        Some(column) => {
            let index = index.min(column.tasks.len());
            column.tasks.insert(index, task);
            Ok(())
        }
        None => Err(task),
    }
}

/// Move a task into `column_id` at `index` (clamped after removal), editing
/// it in transit. Returns false without touching the board if either the
/// task or the column cannot be resolved.
pub(crate) fn relocate(
    board: &mut Board,
    task_id: &TaskId,
    column_id: &ColumnId,
    index: usize,
    edit: impl FnOnce(&mut Task),
) -> bool {
    if board.column(column_id).is_none() {
        return false;
    }
    let Some(mut task) = take_task(board, task_id) else {
        return false;
    };
    edit(&mut task);
    // Column existence was checked above
    insert_task(board, column_id, index, task).is_ok()
}

/// Index to insert at when moving within a column or across columns.
///
/// Within one column, a target index past the source shifts down by one
/// once the task has been removed.
pub(crate) fn adjusted_insert_index(
    source_column_id: &ColumnId,
    source_index: usize,
    target_column_id: &ColumnId,
    target_index: usize,
) -> usize {
    if source_column_id == target_column_id && source_index < target_index {
        target_index - 1
    } else {
        target_index
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{board, ids};
    use super::*;

    #[test]
    fn test_adjusted_insert_index() {
        let todo = ColumnId::from_string("todo");
        let done = ColumnId::from_string("done");
        assert_eq!(adjusted_insert_index(&todo, 0, &todo, 3), 2);
        assert_eq!(adjusted_insert_index(&todo, 2, &todo, 0), 0);
        assert_eq!(adjusted_insert_index(&todo, 0, &done, 3), 3);
    }

    #[test]
    fn test_relocate_missing_column_leaves_board_untouched() {
        let mut b = board([2, 0, 0]);
        let before = b.clone();
        let moved = relocate(
            &mut b,
            &TaskId::from_string("todo-0"),
            &ColumnId::from_string("gone"),
            0,
            |_| {},
        );
        assert!(!moved);
        assert_eq!(b, before);
    }

    #[test]
    fn test_relocate_clamps_index() {
        let mut b = board([2, 1, 0]);
        assert!(relocate(
            &mut b,
            &TaskId::from_string("todo-0"),
            &ColumnId::from_string("doing"),
            99,
            |t| t.title = "moved".into(),
        ));
        assert_eq!(ids(&b, "doing"), vec!["doing-0", "todo-0"]);
        assert_eq!(ids(&b, "todo"), vec!["todo-1"]);
    }

    #[test]
    fn test_change_if_changed() {
        assert_eq!(Change::if_changed(1, 1), None);
        assert_eq!(Change::if_changed(1, 2), Some(Change::new(1, 2)));
    }
}
