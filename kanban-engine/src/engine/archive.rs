//! Archive column, unarchive, and done-column aging

use super::KanbanEngine;
use crate::command::ArchiveCard;
use crate::strings::KEY_ARCHIVE_COLUMN;
use crate::types::{BoardEvent, Column, ColumnId, Task, TaskId, MAX_AUTO_ARCHIVE_DAYS};
use chrono::Duration;
use tracing::{debug, info};

impl KanbanEngine {
    pub fn archive_column(&self) -> Option<&Column> {
        self.board.archive_column()
    }

    /// Return the archive column, creating it if needed.
    ///
    /// A configured id that no longer resolves is reused for the new column.
    pub fn ensure_archive_column(&mut self) -> ColumnId {
        if let Some(column) = self.board.archive_column() {
            return column.id.clone();
        }
        let mut column = Column::new(self.string(KEY_ARCHIVE_COLUMN, "Archive"));
        match self.board.archive_column_id.clone() {
            Some(id) => column.id = id,
            None => self.board.archive_column_id = Some(column.id.clone()),
        }
        let id = column.id.clone();
        debug!(column = %id, "created archive column");
        self.board_mut().columns.push(column);
        self.board.refresh_column_flags();
        self.board_changed(Some("archive_column_id"));
        id
    }

    /// Designate an existing column as the archive column
    pub fn set_archive_column(&mut self, id: &ColumnId) -> bool {
        if self.board.column(id).is_none() {
            return false;
        }
        self.board_mut().archive_column_id = Some(id.clone());
        self.board.refresh_column_flags();
        self.board_changed(Some("archive_column_id"));
        self.refresh_search();
        true
    }

    pub fn set_archive_column_hidden(&mut self, hidden: bool) {
        self.board_mut().is_archive_column_hidden = hidden;
        self.board.refresh_column_flags();
        self.board_changed(Some("is_archive_column_hidden"));
    }

    /// Designate (or clear) the done column. Completion timestamps are
    /// resynced and, if configured, an auto-archive check runs.
    pub fn set_done_column(&mut self, id: Option<&ColumnId>) -> bool {
        if id.is_some_and(|id| self.board.column(id).is_none()) {
            return false;
        }
        self.board_mut().done_column_id = id.cloned();
        self.board_changed(Some("done_column_id"));
        self.sync_done_column_timestamps();
        self.done_config_changed();
        true
    }

    /// Configure done-column aging. `days` is capped at
    /// [`MAX_AUTO_ARCHIVE_DAYS`].
    pub fn set_auto_archive(&mut self, enabled: bool, days: u32) {
        let board = self.board_mut();
        board.auto_archive_done_enabled = enabled;
        board.auto_archive_done_days = days.min(MAX_AUTO_ARCHIVE_DAYS);
        self.board_changed(Some("auto_archive_done"));
        self.done_config_changed();
    }

    /// Archive a task into the archive column (created if needed).
    ///
    /// Blocked tasks are refused with a status message. A task already
    /// archived in the archive column is left alone.
    pub fn archive_task(&mut self, task_id: &TaskId) -> bool {
        if self.board.locate_task(task_id).is_none() {
            return false;
        }
        let archive_id = self.ensure_archive_column();
        let Some((source_ci, source_index)) = self.board.locate_task(task_id) else {
            return false;
        };
        let source_id = self.board.columns[source_ci].id.clone();
        let task = self.board.columns[source_ci].tasks[source_index].clone();
        if source_id == archive_id && task.is_archived {
            return true;
        }
        if task.is_blocked {
            info!(task = %task_id, "archive refused: task is blocked");
            let message = self.blocked_message(&task);
            self.set_status_message(message);
            return false;
        }

        let now = self.now();
        let target_index = self.tasks_for_column(&archive_id).len();
        let done = self.done_timestamp_update(&source_id, &archive_id, now);
        let mut command = ArchiveCard::new(
            &task,
            source_id.clone(),
            source_index,
            archive_id.clone(),
            target_index,
            true,
            now,
        );
        if let Some(value) = done.value() {
            command = command.with_completed_at(&task, value);
        }
        self.execute(command);
        info!(task = %task_id, from = %source_id, "archived task");

        if source_id != archive_id {
            self.emit(BoardEvent::CardMoved {
                task_id: task_id.clone(),
                source_column_id: source_id,
                target_column_id: archive_id,
            });
        }
        self.refresh_search();
        true
    }

    /// Restore an archived task to the column it came from, at its old
    /// position (clamped). Falls back to the first non-archive column.
    pub fn unarchive_task(&mut self, task_id: &TaskId) -> bool {
        let Some((source_ci, source_index)) = self.board.locate_task(task_id) else {
            return false;
        };
        let source_id = self.board.columns[source_ci].id.clone();
        let task = self.board.columns[source_ci].tasks[source_index].clone();
        if !task.is_archived && !self.board.is_archive_column(&source_id) {
            return false;
        }

        let target_id = self
            .resolve_unarchive_target(&task)
            .unwrap_or_else(|| source_id.clone());
        let target_len = self.tasks_for_column(&target_id).len();
        let target_index = task
            .archived_from_index
            .map_or(target_len, |index| index.min(target_len));

        let now = self.now();
        let done = self.done_timestamp_update(&source_id, &target_id, now);
        let mut command = ArchiveCard::new(
            &task,
            source_id.clone(),
            source_index,
            target_id.clone(),
            target_index,
            false,
            now,
        );
        if let Some(value) = done.value() {
            command = command.with_completed_at(&task, value);
        }
        self.execute(command);
        info!(task = %task_id, to = %target_id, index = target_index, "unarchived task");

        if source_id != target_id {
            self.emit(BoardEvent::CardMoved {
                task_id: task_id.clone(),
                source_column_id: source_id,
                target_column_id: target_id,
            });
        }
        self.refresh_search();
        true
    }

    fn resolve_unarchive_target(&self, task: &Task) -> Option<ColumnId> {
        if let Some(origin) = task
            .archived_from_column_id
            .as_ref()
            .and_then(|id| self.board.column(id))
        {
            return Some(origin.id.clone());
        }
        self.board
            .columns
            .iter()
            .find(|c| !self.board.is_archive_column(&c.id))
            .or_else(|| self.board.columns.first())
            .map(|c| c.id.clone())
    }

    /// Repair completion timestamps: active tasks in the done column get one
    /// (their actual end, else now), active tasks elsewhere lose theirs.
    /// Returns how many tasks changed.
    pub fn sync_done_column_timestamps(&mut self) -> usize {
        let Some(done_id) = self.board.done_column().map(|c| c.id.clone()) else {
            return 0;
        };
        let now = self.now();
        let mut changed = 0;
        for column in &mut self.board.columns {
            let in_done = column.id == done_id;
            for task in column.tasks.iter_mut().filter(|t| !t.is_archived) {
                if in_done && task.completed_at.is_none() {
                    task.completed_at = Some(task.actual_end.unwrap_or(now));
                    changed += 1;
                } else if !in_done && task.completed_at.is_some() {
                    task.completed_at = None;
                    changed += 1;
                }
            }
        }
        if changed > 0 {
            debug!(changed, "synced done timestamps");
            self.dirty = true;
        }
        changed
    }

    /// Archive done-column tasks completed at least `auto_archive_done_days`
    /// ago. Blocked tasks stay. Returns the number archived.
    pub fn auto_archive_done_tasks(&mut self) -> usize {
        let days = self.board.auto_archive_done_days;
        if !self.board.auto_archive_done_enabled || days == 0 {
            return 0;
        }
        let Some(done) = self.board.done_column() else {
            return 0;
        };
        let candidates: Vec<TaskId> = done
            .tasks
            .iter()
            .filter(|t| !t.is_archived && !t.is_blocked)
            .map(|t| t.id.clone())
            .collect();

        let now = self.now();
        // A cutoff before the earliest representable time makes nothing old enough
        let Some(cutoff) = now.checked_sub_signed(Duration::days(i64::from(days))) else {
            return 0;
        };
        let mut archived = 0;
        for id in candidates {
            let Some(task) = self.board.task_mut(&id) else {
                continue;
            };
            let done_at = match task.completed_at {
                Some(at) => at,
                None => {
                    let at = task.actual_end.unwrap_or(now);
                    task.completed_at = Some(at);
                    self.dirty = true;
                    at
                }
            };
            if done_at <= cutoff && self.archive_task(&id) {
                archived += 1;
            }
        }
        info!(archived, days, "auto-archive done tasks");
        archived
    }

    /// Run auto-archive if the configured interval has passed since the last
    /// run. Returns the count archived when it ran.
    pub fn on_done_aging_tick(&mut self) -> Option<usize> {
        let now = self.now();
        let minutes = self.config.done_aging_interval_minutes.min(i32::MAX as u64) as i64;
        if let Some(last) = self.last_done_aging {
            if now - last < Duration::minutes(minutes) {
                return None;
            }
        }
        self.last_done_aging = Some(now);
        Some(self.auto_archive_done_tasks())
    }

    /// Archive every finished (progress 100%), unblocked task in a column
    pub fn archive_completed_tasks(&mut self, column_id: &ColumnId) -> usize {
        let completed: Vec<TaskId> = self
            .tasks_for_column(column_id)
            .iter()
            .filter(|t| t.effective_progress() >= 100 && !t.is_archived && !t.is_blocked)
            .map(|t| t.id.clone())
            .collect();
        completed
            .iter()
            .filter(|id| self.archive_task(id))
            .count()
    }

    pub fn archived_tasks(&self) -> Vec<&Task> {
        self.find_tasks(|t| t.is_archived)
    }

    pub fn active_tasks(&self) -> Vec<&Task> {
        self.find_tasks(|t| !t.is_archived)
    }

    /// Permanently delete every archived task. Not undoable.
    pub fn purge_archived_tasks(&mut self) -> usize {
        let mut purged = 0;
        for column in &mut self.board_mut().columns {
            let before = column.tasks.len();
            column.tasks.retain(|t| !t.is_archived);
            purged += before - column.tasks.len();
        }
        if purged > 0 {
            info!(purged, "purged archived tasks");
            self.board_changed(Some("tasks"));
        }
        purged
    }

    pub(super) fn done_config_changed(&mut self) -> usize {
        if self.config.auto_archive_check_on_config_change {
            self.auto_archive_done_tasks()
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::clock::Clock;
    use crate::types::MoveResult;

    fn col(id: &str) -> ColumnId {
        ColumnId::from_string(id)
    }

    #[test]
    fn test_ensure_archive_column_is_idempotent() {
        let (mut engine, _, _) = engine([0, 0, 0]);
        let first = engine.ensure_archive_column();
        let second = engine.ensure_archive_column();
        assert_eq!(first, second);
        assert_eq!(engine.board().columns.len(), 4);
        let archive = engine.archive_column().unwrap();
        assert_eq!(archive.title, "Archive");
        assert!(archive.is_archive_column);
    }

    #[test]
    fn test_ensure_archive_column_reuses_dangling_id() {
        let (mut engine, _, _) = engine([0, 0, 0]);
        engine.update_board("archive_column_id", |b| {
            b.archive_column_id = Some("old-archive".into())
        });
        assert_eq!(engine.ensure_archive_column(), col("old-archive"));
    }

    #[test]
    fn test_archive_then_unarchive_restores_position() {
        let (mut engine, _, recorder) = engine([0, 3, 0]);
        assert!(engine.archive_task(&tid("doing-1")));

        let task = engine.find_task(&tid("doing-1")).unwrap();
        assert!(task.is_archived);
        assert_eq!(task.archived_from_column_id, Some(col("doing")));
        assert_eq!(task.archived_from_index, Some(1));
        assert_eq!(recorder.count(|e| matches!(e, BoardEvent::CardMoved { .. })), 1);

        assert!(engine.archive_task(&tid("doing-1")));
        assert_eq!(engine.archived_tasks().len(), 1);

        assert!(engine.unarchive_task(&tid("doing-1")));
        assert_eq!(ids(&engine, "doing"), vec!["doing-0", "doing-1", "doing-2"]);
        let task = engine.find_task(&tid("doing-1")).unwrap();
        assert!(!task.is_archived);
        assert_eq!(task.archived_from_column_id, None);
        assert!(!engine.unarchive_task(&tid("doing-1")));
    }

    #[test]
    fn test_unarchive_falls_back_when_origin_is_gone() {
        let (mut engine, _, _) = engine([0, 2, 0]);
        engine.archive_task(&tid("doing-0"));
        engine.remove_column(&col("doing"));
        assert!(engine.unarchive_task(&tid("doing-0")));
        assert_eq!(ids(&engine, "backlog"), vec!["doing-0"]);
    }

    #[test]
    fn test_archive_refuses_blocked_task() {
        let (mut engine, _, _) = engine([1, 0, 0]);
        engine.set_blocked(&tid("backlog-0"), true, Some("legal".into()));
        assert!(!engine.archive_task(&tid("backlog-0")));
        assert!(!engine.find_task(&tid("backlog-0")).unwrap().is_archived);
        assert_eq!(
            engine.status_message().map(|s| s.text.as_str()),
            Some("Blocked: legal")
        );
    }

    #[test]
    fn test_archived_tasks_only_match_empty_search() {
        let (mut engine, _, _) = engine([2, 0, 0]);
        engine.archive_task(&tid("backlog-0"));
        assert!(engine.find_task(&tid("backlog-0")).unwrap().is_search_match);
        engine.set_search_text("Backlog");
        assert!(!engine.find_task(&tid("backlog-0")).unwrap().is_search_match);
        assert!(engine.find_task(&tid("backlog-1")).unwrap().is_search_match);
    }

    #[test]
    fn test_auto_archive_threshold() {
        let (mut engine, clock, _) = engine([0, 0, 3]);
        let threshold = 7;
        let now = clock.now();
        engine.patch_done_time(&tid("done-0"), now - Duration::days(threshold + 1));
        engine.patch_done_time(&tid("done-1"), now - Duration::days(threshold - 1));
        engine.patch_done_time(&tid("done-2"), now - Duration::days(threshold + 5));
        engine.set_blocked(&tid("done-2"), true, None);

        engine.set_auto_archive(true, threshold as u32);
        assert!(engine.find_task(&tid("done-0")).unwrap().is_archived);
        assert!(!engine.find_task(&tid("done-1")).unwrap().is_archived);
        assert!(!engine.find_task(&tid("done-2")).unwrap().is_archived);
        assert_eq!(engine.auto_archive_done_tasks(), 0);
    }

    #[test]
    fn test_auto_archive_disabled_or_zero_days() {
        let (mut engine, clock, _) = engine([0, 0, 1]);
        engine.patch_done_time(&tid("done-0"), clock.now() - Duration::days(100));
        assert_eq!(engine.auto_archive_done_tasks(), 0);
        engine.set_auto_archive(true, 0);
        assert_eq!(engine.auto_archive_done_tasks(), 0);
    }

    #[test]
    fn test_auto_archive_stamps_missing_completion() {
        let (mut engine, clock, _) = engine([0, 0, 1]);
        engine.set_auto_archive(true, 3);
        assert_eq!(
            engine.find_task(&tid("done-0")).unwrap().completed_at,
            Some(clock.now())
        );
        clock.advance(Duration::days(3));
        assert_eq!(engine.on_done_aging_tick(), Some(1));
    }

    #[test]
    fn test_auto_archive_days_are_capped() {
        let (mut engine, clock, _) = engine([0, 0, 2]);
        engine.patch_done_time(&tid("done-0"), clock.now() - Duration::days(4000));
        engine.patch_done_time(&tid("done-1"), clock.now() - Duration::days(100));

        engine.set_auto_archive(true, u32::MAX);
        assert_eq!(engine.board().auto_archive_done_days, MAX_AUTO_ARCHIVE_DAYS);
        assert!(engine.find_task(&tid("done-0")).unwrap().is_archived);
        assert!(!engine.find_task(&tid("done-1")).unwrap().is_archived);
    }

    #[test]
    fn test_auto_archive_with_unrepresentable_cutoff_archives_nothing() {
        let (mut engine, clock, _) = engine([0, 0, 1]);
        engine.patch_done_time(&tid("done-0"), clock.now() - Duration::days(4000));
        engine.update_board("auto_archive_done", |b| {
            b.auto_archive_done_enabled = true;
            b.auto_archive_done_days = u32::MAX;
        });
        assert_eq!(engine.auto_archive_done_tasks(), 0);
        assert_eq!(engine.on_done_aging_tick(), Some(0));
        assert!(!engine.find_task(&tid("done-0")).unwrap().is_archived);
    }

    #[test]
    fn test_done_aging_tick_interval() {
        let (mut engine, clock, _) = engine([0, 0, 0]);
        assert_eq!(engine.on_done_aging_tick(), Some(0));
        clock.advance(Duration::minutes(30));
        assert_eq!(engine.on_done_aging_tick(), None);
        clock.advance(Duration::minutes(30));
        assert_eq!(engine.on_done_aging_tick(), Some(0));
    }

    #[test]
    fn test_sync_done_column_timestamps() {
        let (mut engine, clock, _) = engine([1, 0, 1]);
        let end = clock.now() - Duration::days(2);
        engine.patch_task(
            &tid("done-0"),
            &crate::types::TaskPatch::new().with_actual_end(Some(end)),
        );
        engine.patch_done_time(&tid("backlog-0"), clock.now());

        assert_eq!(engine.sync_done_column_timestamps(), 2);
        assert_eq!(engine.find_task(&tid("done-0")).unwrap().completed_at, Some(end));
        assert_eq!(engine.find_task(&tid("backlog-0")).unwrap().completed_at, None);
    }

    #[test]
    fn test_set_done_column_resyncs() {
        let (mut engine, clock, _) = engine([0, 1, 0]);
        assert!(engine.set_done_column(Some(&col("doing"))));
        assert_eq!(engine.find_task(&tid("doing-0")).unwrap().completed_at, Some(clock.now()));
        assert!(!engine.set_done_column(Some(&col("missing"))));
        assert!(engine.set_done_column(None));
        assert!(engine.board().done_column().is_none());
    }

    #[test]
    fn test_archive_completed_and_purge() {
        let (mut engine, _, _) = engine([3, 0, 0]);
        let patch = crate::types::TaskPatch::new().with_progress(100);
        engine.patch_task(&tid("backlog-0"), &patch);
        engine.patch_task(&tid("backlog-2"), &patch);
        engine.set_blocked(&tid("backlog-2"), true, None);

        assert_eq!(engine.archive_completed_tasks(&col("backlog")), 1);
        assert_eq!(engine.active_tasks().len(), 2);
        assert_eq!(engine.purge_archived_tasks(), 1);
        assert!(engine.archived_tasks().is_empty());
        assert_eq!(engine.board().total_task_count(), 2);
    }

    #[test]
    fn test_archive_move_into_archive_blocked_even_backwards() {
        let (mut engine, _, _) = engine([1, 0, 0]);
        let archive = engine.ensure_archive_column();
        engine.move_column(&archive, 0);
        engine.set_blocked(&tid("backlog-0"), true, None);
        assert_eq!(
            engine.try_move_task_with_wip_enforcement(&tid("backlog-0"), &archive, None, None, false),
            MoveResult::CanceledByEvent
        );
    }

    impl KanbanEngine {
        fn patch_done_time(&mut self, id: &TaskId, at: chrono::DateTime<chrono::Utc>) {
            if let Some(task) = self.board.task_mut(id) {
                task.completed_at = Some(at);
            }
        }
    }
}
