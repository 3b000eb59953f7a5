//! Task selection and bulk operations
//!
//! Selection lives on the tasks themselves (`is_selected`). Bulk operations
//! snapshot the selected ids first, then run the single-task operation for
//! each one, so removals along the way do not disturb the iteration.

use super::KanbanEngine;
use crate::types::{ColumnId, Priority, Task, TaskId, TaskPatch};
use chrono::{DateTime, Utc};
use tracing::info;

impl KanbanEngine {
    pub fn select_task(&mut self, task_id: &TaskId) -> bool {
        self.set_selected(task_id, |_| true)
    }

    pub fn deselect_task(&mut self, task_id: &TaskId) -> bool {
        self.set_selected(task_id, |_| false)
    }

    pub fn toggle_selection(&mut self, task_id: &TaskId) -> bool {
        self.set_selected(task_id, |selected| !selected)
    }

    /// Select every active (non-archived) task. Returns how many are selected.
    pub fn select_all(&mut self) -> usize {
        let mut count = 0;
        for task in self.board.all_tasks_mut() {
            task.is_selected = !task.is_archived;
            count += usize::from(task.is_selected);
        }
        count
    }

    /// Clear the selection. Returns how many tasks were deselected.
    pub fn deselect_all(&mut self) -> usize {
        let mut count = 0;
        for task in self.board.all_tasks_mut().filter(|t| t.is_selected) {
            task.is_selected = false;
            count += 1;
        }
        count
    }

    pub fn selected_tasks(&self) -> Vec<&Task> {
        self.find_tasks(|t| t.is_selected)
    }

    pub fn selected_count(&self) -> usize {
        self.board.all_tasks().filter(|t| t.is_selected).count()
    }

    pub fn has_selection(&self) -> bool {
        self.board.all_tasks().any(|t| t.is_selected)
    }

    /// Move the selection to the end of `target`. WIP limits only warn.
    /// The selection is cleared once anything moved. Returns how many moved.
    pub fn bulk_move(&mut self, target: &ColumnId) -> usize {
        let selected = self.selection_snapshot();
        let mut moved = 0;
        for id in &selected {
            if self
                .try_move_task_with_wip_enforcement(id, target, None, None, false)
                .is_moved()
            {
                moved += 1;
            }
        }
        if moved > 0 {
            self.deselect_all();
        }
        info!(selected = selected.len(), moved, target = %target, "bulk move");
        moved
    }

    pub fn bulk_set_priority(&mut self, priority: Priority) -> usize {
        self.bulk_patch(&TaskPatch::new().with_priority(priority))
    }

    /// Blank tags clear them
    pub fn bulk_set_tags(&mut self, tags: impl Into<String>) -> usize {
        self.bulk_patch(&TaskPatch::new().with_tags(Some(tags.into())))
    }

    /// Set the planned end date of every selected task
    pub fn bulk_set_due_date(&mut self, due: Option<DateTime<Utc>>) -> usize {
        self.bulk_patch(&TaskPatch::new().with_due_date(due))
    }

    pub fn bulk_set_blocked(&mut self, blocked: bool, reason: Option<String>) -> usize {
        let selected = self.selection_snapshot();
        for id in &selected {
            self.set_blocked(id, blocked, reason.clone());
        }
        selected.len()
    }

    /// Archive the selection. Blocked tasks are refused individually.
    pub fn bulk_archive(&mut self) -> usize {
        let selected = self.selection_snapshot();
        for id in &selected {
            self.archive_task(id);
        }
        selected.len()
    }

    pub fn bulk_delete(&mut self) -> usize {
        let selected = self.selection_snapshot();
        for id in &selected {
            self.remove_task(id);
        }
        selected.len()
    }

    fn bulk_patch(&mut self, patch: &TaskPatch) -> usize {
        let selected = self.selection_snapshot();
        for id in &selected {
            self.patch_task(id, patch);
        }
        selected.len()
    }

    fn selection_snapshot(&self) -> Vec<TaskId> {
        self.board
            .all_tasks()
            .filter(|t| t.is_selected)
            .map(|t| t.id.clone())
            .collect()
    }

    fn set_selected(&mut self, task_id: &TaskId, update: impl FnOnce(bool) -> bool) -> bool {
        match self.board.task_mut(task_id) {
            Some(task) => {
                task.is_selected = update(task.is_selected);
                true
            }
            None => false,
        }
    }
}
