//! Task lifecycle: add, remove, edit, block, subtasks

use super::KanbanEngine;
use crate::command::{AddCard, DeleteCard, EditCard, SetBlocked};
use crate::config::AddCardPlacement;
use crate::types::{
    BoardEvent, BoardStatistics, Column, ColumnId, Palette, Subtask, SubtaskId, Task, TaskId,
    TaskPatch,
};
use tracing::debug;

impl KanbanEngine {
    /// Add a task to a column, at the top or bottom per the user's
    /// placement setting. Returns `None` if the column does not exist.
    ///
    /// The task gets a work-item number if it has none. Adding straight into
    /// the done column stamps `completed_at`.
    pub fn add_task(&mut self, column_id: &ColumnId, task: Task) -> Option<TaskId> {
        let index = match self.settings.add_card_placement {
            AddCardPlacement::Top => 0,
            AddCardPlacement::Bottom => self.board.column(column_id)?.task_count(),
        };
        self.insert_task(column_id, index, task)
    }

    /// Insert a task at `index` (clamped) in a column
    pub fn insert_task(&mut self, column_id: &ColumnId, index: usize, mut task: Task) -> Option<TaskId> {
        let len = self.board.column(column_id)?.task_count();
        self.board.ensure_task_number(&mut task);
        if self.board.is_done_column(column_id) {
            task.completed_at = Some(self.now());
        }
        let id = task.id.clone();
        debug!(task = %id, column = %column_id, number = task.work_item_number, "add task");
        self.execute(AddCard::new(task, column_id.clone(), index.min(len)));
        self.board_changed(Some("tasks"));
        self.refresh_search();
        Some(id)
    }

    /// Hard-remove a task (undoable)
    pub fn remove_task(&mut self, task_id: &TaskId) -> bool {
        let Some((column_index, index)) = self.board.locate_task(task_id) else {
            return false;
        };
        let column_id = self.board.columns[column_index].id.clone();
        self.execute(DeleteCard::new(task_id.clone(), column_id, index));
        self.board_changed(Some("tasks"));
        self.refresh_search();
        true
    }

    pub fn find_task(&self, task_id: &TaskId) -> Option<&Task> {
        self.board.task(task_id)
    }

    pub fn find_tasks(&self, predicate: impl Fn(&Task) -> bool) -> Vec<&Task> {
        self.board.all_tasks().filter(|t| predicate(t)).collect()
    }

    pub fn column_for_task(&self, task_id: &TaskId) -> Option<&Column> {
        self.board.column_for_task(task_id)
    }

    /// Move a task within its column to `new_index` (clamped). Not undoable.
    pub fn reorder_task(&mut self, task_id: &TaskId, new_index: usize) -> bool {
        let Some((column_index, current)) = self.board.locate_task(task_id) else {
            return false;
        };
        let tasks = &mut self.board_mut().columns[column_index].tasks;
        let new_index = new_index.min(tasks.len() - 1);
        if current != new_index {
            let task = tasks.remove(current);
            tasks.insert(new_index, task);
        }
        true
    }

    /// Undoable edit of title, description, and palette. `None` keeps the
    /// current value; an edit that changes nothing records nothing.
    pub fn update_task(
        &mut self,
        task_id: &TaskId,
        title: Option<String>,
        description: Option<String>,
        palette: Option<Palette>,
    ) -> bool {
        let Some(task) = self.board.task(task_id) else {
            return false;
        };
        let edit = EditCard::new(task, title, description, palette);
        if edit.is_noop() {
            return true;
        }
        self.execute(edit);
        self.card_edited(task_id, true);
        true
    }

    /// Apply a non-undoable field patch (priority, tags, dates, ...)
    pub fn patch_task(&mut self, task_id: &TaskId, patch: &TaskPatch) -> bool {
        let Some(task) = self.board.task_mut(task_id) else {
            return false;
        };
        if patch.apply(task) {
            self.card_edited(task_id, patch.touches_search_fields());
        }
        true
    }

    /// Block or unblock a task (undoable). Blocking keeps an existing
    /// reason when none is given and keeps the original blocked-since time.
    pub fn set_blocked(&mut self, task_id: &TaskId, blocked: bool, reason: Option<String>) -> bool {
        let Some(task) = self.board.task(task_id) else {
            return false;
        };
        let command = SetBlocked::new(task, blocked, reason, self.now());
        debug!(task = %task_id, blocked, "set blocked");
        self.execute(command);
        self.card_edited(task_id, false);
        true
    }

    pub fn clear_blocked(&mut self, task_id: &TaskId) -> bool {
        self.set_blocked(task_id, false, None)
    }

    pub fn blocked_tasks(&self) -> Vec<&Task> {
        self.find_tasks(|t| t.is_blocked)
    }

    /// Blocked tasks that have been blocked for more than `days` whole days
    pub fn blocked_tasks_older_than(&self, days: i64) -> Vec<&Task> {
        let now = self.now();
        self.find_tasks(|t| t.is_blocked && t.blocked_days(now).is_some_and(|d| d > days))
    }

    // Subtasks

    pub fn add_subtask(
        &mut self,
        task_id: &TaskId,
        title: impl Into<String>,
        completed: bool,
    ) -> Option<SubtaskId> {
        let mut subtask = Subtask::new(title);
        subtask.is_completed = completed;
        let id = subtask.id.clone();
        self.edit_task(task_id, |task| {
            task.subtasks.push(subtask);
            true
        })
        .then_some(id)
    }

    pub fn remove_subtask(&mut self, task_id: &TaskId, subtask_id: &SubtaskId) -> bool {
        self.edit_task(task_id, |task| {
            let before = task.subtasks.len();
            task.subtasks.retain(|s| &s.id != subtask_id);
            task.subtasks.len() != before
        })
    }

    pub fn toggle_subtask(&mut self, task_id: &TaskId, subtask_id: &SubtaskId) -> bool {
        self.edit_task(task_id, |task| match task.find_subtask_mut(subtask_id) {
            Some(subtask) => {
                subtask.is_completed = !subtask.is_completed;
                true
            }
            None => false,
        })
    }

    pub fn set_all_subtasks_completed(&mut self, task_id: &TaskId, completed: bool) -> bool {
        self.edit_task(task_id, |task| {
            task.subtasks
                .iter_mut()
                .for_each(|s| s.is_completed = completed);
            true
        })
    }

    pub fn clear_subtasks(&mut self, task_id: &TaskId) -> bool {
        self.edit_task(task_id, |task| {
            task.subtasks.clear();
            true
        })
    }

    /// (completed, total)
    pub fn subtask_progress(&self, task_id: &TaskId) -> Option<(usize, usize)> {
        let task = self.board.task(task_id)?;
        let completed = task.subtasks.iter().filter(|s| s.is_completed).count();
        Some((completed, task.subtasks.len()))
    }

    /// Remove every task, keeping the columns. Not undoable.
    pub fn clear_all_tasks(&mut self) {
        for column in &mut self.board_mut().columns {
            column.tasks.clear();
        }
        self.board_changed(Some("tasks"));
    }

    pub fn clear_column_tasks(&mut self, column_id: &ColumnId) -> bool {
        let Some(column) = self.board.column_mut(column_id) else {
            return false;
        };
        column.tasks.clear();
        self.board_changed(Some("tasks"));
        true
    }

    pub fn statistics(&self) -> BoardStatistics {
        self.board.statistics()
    }

    /// Run `edit` on a task. It returns whether it changed anything.
    fn edit_task(&mut self, task_id: &TaskId, edit: impl FnOnce(&mut Task) -> bool) -> bool {
        let Some(task) = self.board.task_mut(task_id) else {
            return false;
        };
        let changed = edit(task);
        if changed {
            self.card_edited(task_id, false);
        }
        changed
    }

    fn card_edited(&mut self, task_id: &TaskId, search_relevant: bool) {
        self.dirty = true;
        self.emit(BoardEvent::CardEdited {
            task_id: task_id.clone(),
        });
        if search_relevant {
            self.refresh_search();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::types::Priority;
    use crate::clock::Clock;
    use chrono::Duration;

    fn col(id: &str) -> ColumnId {
        ColumnId::from_string(id)
    }

    #[test]
    fn test_add_task_assigns_number_and_placement() {
        let (mut engine, _, _) = engine([2, 0, 0]);
        let bottom = engine.add_task(&col("backlog"), Task::new("Bottom")).unwrap();
        assert_eq!(ids(&engine, "backlog").last(), Some(&bottom.to_string()));
        assert_eq!(engine.find_task(&bottom).unwrap().work_item_number, 3);

        let mut settings = engine.settings().clone();
        settings.add_card_placement = AddCardPlacement::Top;
        engine.apply_settings(settings);
        let top = engine.add_task(&col("backlog"), Task::new("Top")).unwrap();
        assert_eq!(ids(&engine, "backlog")[0], top.to_string());
        assert_eq!(engine.find_task(&top).unwrap().work_item_number, 4);

        assert!(engine.add_task(&col("missing"), Task::new("x")).is_none());
    }

    #[test]
    fn test_add_into_done_stamps_completion_and_undoes() {
        let (mut engine, clock, _) = engine([0, 0, 0]);
        let id = engine.add_task(&col("done"), Task::new("Shipped")).unwrap();
        assert_eq!(engine.find_task(&id).unwrap().completed_at, Some(clock.now()));

        assert!(engine.undo());
        assert!(engine.find_task(&id).is_none());
        assert!(engine.redo());
        assert_eq!(engine.find_task(&id).unwrap().completed_at, Some(clock.now()));
    }

    #[test]
    fn test_work_item_numbers_survive_undo() {
        let (mut engine, _, _) = engine([0, 0, 0]);
        let first = engine.add_task(&col("backlog"), Task::new("a")).unwrap();
        assert!(engine.undo());
        let second = engine.add_task(&col("backlog"), Task::new("b")).unwrap();
        assert!(engine.find_task(&first).is_none());
        assert_eq!(engine.find_task(&second).unwrap().work_item_number, 2);
    }

    #[test]
    fn test_insert_and_remove() {
        let (mut engine, _, _) = engine([2, 0, 0]);
        let id = engine.insert_task(&col("backlog"), 1, Task::new("Middle")).unwrap();
        assert_eq!(ids(&engine, "backlog")[1], id.to_string());

        assert!(engine.remove_task(&id));
        assert!(!engine.remove_task(&id));
        assert!(engine.undo());
        assert_eq!(ids(&engine, "backlog")[1], id.to_string());
    }

    #[test]
    fn test_reorder_task_clamps() {
        let (mut engine, _, _) = engine([3, 0, 0]);
        assert!(engine.reorder_task(&tid("backlog-0"), 10));
        assert_eq!(ids(&engine, "backlog"), vec!["backlog-1", "backlog-2", "backlog-0"]);
        assert!(!engine.reorder_task(&tid("missing"), 0));
    }

    #[test]
    fn test_update_task_is_undoable() {
        let (mut engine, _, recorder) = engine([1, 0, 0]);
        let id = tid("backlog-0");
        assert!(engine.update_task(&id, Some("Renamed".into()), None, Some(Palette::Warning)));
        assert_eq!(engine.find_task(&id).unwrap().title, "Renamed");
        assert_eq!(recorder.count(|e| matches!(e, BoardEvent::CardEdited { .. })), 1);

        assert!(engine.update_task(&id, None, None, None));
        assert_eq!(engine.history().undo_len(), 1);

        assert!(engine.undo());
        let task = engine.find_task(&id).unwrap();
        assert_eq!(task.title, "Backlog 0");
        assert_eq!(task.palette, Palette::Default);
    }

    #[test]
    fn test_patch_task() {
        let (mut engine, _, recorder) = engine([1, 0, 0]);
        let id = tid("backlog-0");
        let patch = TaskPatch::new()
            .with_priority(Priority::Urgent)
            .with_tags(Some("  ".into()))
            .with_progress(140);
        assert!(engine.patch_task(&id, &patch));
        let task = engine.find_task(&id).unwrap();
        assert_eq!(task.priority, Priority::Urgent);
        assert_eq!(task.tags, None);
        assert_eq!(task.progress_percent, 100);
        assert_eq!(recorder.count(|e| matches!(e, BoardEvent::CardEdited { .. })), 1);

        assert!(engine.patch_task(&id, &patch));
        assert_eq!(recorder.count(|e| matches!(e, BoardEvent::CardEdited { .. })), 1);
        assert!(!engine.patch_task(&tid("missing"), &patch));
    }

    #[test]
    fn test_blocked_tasks_older_than() {
        let (mut engine, clock, _) = engine([2, 0, 0]);
        engine.set_blocked(&tid("backlog-0"), true, Some("vendor".into()));
        clock.advance(Duration::days(3));
        engine.set_blocked(&tid("backlog-1"), true, None);

        assert_eq!(engine.blocked_tasks().len(), 2);
        let old: Vec<_> = engine.blocked_tasks_older_than(2).iter().map(|t| t.id.clone()).collect();
        assert_eq!(old, vec![tid("backlog-0")]);

        assert!(engine.clear_blocked(&tid("backlog-0")));
        let task = engine.find_task(&tid("backlog-0")).unwrap();
        assert!(!task.is_blocked);
        assert_eq!(task.blocked_reason, None);

        assert!(engine.undo());
        let task = engine.find_task(&tid("backlog-0")).unwrap();
        assert!(task.is_blocked);
        assert_eq!(task.blocked_reason.as_deref(), Some("vendor"));
    }

    #[test]
    fn test_subtasks() {
        let (mut engine, _, _) = engine([1, 0, 0]);
        let id = tid("backlog-0");
        let a = engine.add_subtask(&id, "a", false).unwrap();
        engine.add_subtask(&id, "b", true).unwrap();
        assert_eq!(engine.subtask_progress(&id), Some((1, 2)));

        assert!(engine.toggle_subtask(&id, &a));
        assert_eq!(engine.subtask_progress(&id), Some((2, 2)));
        assert_eq!(engine.find_task(&id).unwrap().effective_progress(), 100);

        assert!(engine.set_all_subtasks_completed(&id, false));
        assert_eq!(engine.subtask_progress(&id), Some((0, 2)));

        assert!(engine.remove_subtask(&id, &a));
        assert!(!engine.remove_subtask(&id, &a));
        assert!(engine.clear_subtasks(&id));
        assert_eq!(engine.subtask_progress(&id), Some((0, 0)));
        assert!(engine.add_subtask(&tid("missing"), "x", false).is_none());
    }

    #[test]
    fn test_clear_tasks_and_statistics() {
        let (mut engine, _, _) = engine([2, 1, 1]);
        let stats = engine.statistics();
        assert_eq!(stats.total_task_count, 4);
        assert_eq!(stats.tasks_per_column.get("Backlog"), Some(&2));

        assert!(engine.clear_column_tasks(&col("backlog")));
        assert_eq!(engine.statistics().empty_columns, 1);
        engine.clear_all_tasks();
        assert_eq!(engine.statistics().total_task_count, 0);
    }
}
