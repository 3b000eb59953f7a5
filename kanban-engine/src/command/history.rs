//! Bounded undo/redo stacks

use super::Command;
use crate::types::Board;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Number of commands kept by default; older ones are dropped
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// Undo and redo stacks of executed commands
#[derive(Debug, Clone)]
pub struct CommandHistory {
    undo: VecDeque<Command>,
    redo: Vec<Command>,
    max_size: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl CommandHistory {
    /// A `max_size` of zero is treated as one
    pub fn new(max_size: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            max_size: max_size.max(1),
        }
    }

    /// Apply a command and record it. Clears the redo stack.
    pub fn execute(&mut self, mut command: Command, board: &mut Board) {
        command.apply(board);
        debug!(kind = command.kind(), task = %command.task_id(), "executed command");
        self.undo.push_back(command);
        while self.undo.len() > self.max_size {
            if let Some(dropped) = self.undo.pop_front() {
                trace!(kind = dropped.kind(), "dropped oldest history entry");
            }
        }
        self.redo.clear();
    }

    /// Revert the most recent command. Returns false if there is nothing to undo.
    pub fn undo(&mut self, board: &mut Board) -> bool {
        let Some(mut command) = self.undo.pop_back() else {
            return false;
        };
        command.revert(board);
        debug!(kind = command.kind(), task = %command.task_id(), "undid command");
        self.redo.push(command);
        true
    }

    /// Re-apply the most recently undone command
    pub fn redo(&mut self, board: &mut Board) -> bool {
        let Some(mut command) = self.redo.pop() else {
            return false;
        };
        command.apply(board);
        debug!(kind = command.kind(), task = %command.task_id(), "redid command");
        self.undo.push_back(command);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Change the cap, dropping the oldest entries if needed
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size.max(1);
        while self.undo.len() > self.max_size {
            self.undo.pop_front();
        }
    }

    /// Empty both stacks
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::test_support::{board, ids};
    use crate::command::{EditCard, MoveCard};
    use crate::types::TaskId;

    fn rename(b: &Board, id: &str, title: &str) -> Command {
        let task = b.task(&TaskId::from_string(id)).unwrap();
        EditCard::new(task, Some(title.to_string()), None, None).into()
    }

    #[test]
    fn test_undo_redo_cycle() {
        let mut b = board([2, 0, 0]);
        let before = b.clone();
        let mut history = CommandHistory::default();
        assert!(!history.undo(&mut b));
        assert!(!history.redo(&mut b));

        let task = b.columns[0].tasks[0].clone();
        history.execute(
            MoveCard::new(&task, "todo".into(), 0, "doing".into(), 0).into(),
            &mut b,
        );
        let after = b.clone();
        assert_eq!(ids(&b, "doing"), vec!["todo-0"]);

        assert!(history.undo(&mut b));
        assert_eq!(b, before);
        assert!(history.can_redo());

        assert!(history.redo(&mut b));
        assert_eq!(b, after);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_execute_clears_redo() {
        let mut b = board([1, 0, 0]);
        let mut history = CommandHistory::default();
        let cmd = rename(&b, "todo-0", "one");
        history.execute(cmd, &mut b);
        history.undo(&mut b);
        assert_eq!(history.redo_len(), 1);

        let cmd = rename(&b, "todo-0", "two");
        history.execute(cmd, &mut b);
        assert_eq!(history.redo_len(), 0);
        assert_eq!(b.columns[0].tasks[0].title, "two");
    }

    #[test]
    fn test_oldest_entry_dropped_when_full() {
        let mut b = board([1, 0, 0]);
        let mut history = CommandHistory::new(3);
        for i in 0..5 {
            let cmd = rename(&b, "todo-0", &format!("title {}", i));
            history.execute(cmd, &mut b);
        }
        assert_eq!(history.undo_len(), 3);
        while history.undo(&mut b) {}
        // The first two renames fell off the stack
        assert_eq!(b.columns[0].tasks[0].title, "title 1");
    }

    #[test]
    fn test_clear_and_resize() {
        let mut b = board([1, 0, 0]);
        let mut history = CommandHistory::new(0);
        assert_eq!(history.max_size(), 1);
        history.set_max_size(10);
        for i in 0..4 {
            let cmd = rename(&b, "todo-0", &format!("t{}", i));
            history.execute(cmd, &mut b);
        }
        history.set_max_size(2);
        assert_eq!(history.undo_len(), 2);
        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
