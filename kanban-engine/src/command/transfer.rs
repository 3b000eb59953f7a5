//! Commands that move a card between positions, columns, and the archive

use super::{adjusted_insert_index, relocate, Change};
use crate::types::{Board, ColumnId, LaneId, Task, TaskId};
use chrono::{DateTime, Utc};

/// Move a task to a column/index, optionally changing lane and completion time
#[derive(Debug, Clone, PartialEq)]
pub struct MoveCard {
    pub(crate) task_id: TaskId,
    source_column_id: ColumnId,
    source_index: usize,
    target_column_id: ColumnId,
    target_index: usize,
    lane: Option<Change<Option<LaneId>>>,
    completed_at: Option<Change<Option<DateTime<Utc>>>>,
}

impl MoveCard {
    /// `target_index` is a position in the target column as it looks before
    /// the task is removed from its source.
    pub fn new(
        task: &Task,
        source_column_id: ColumnId,
        source_index: usize,
        target_column_id: ColumnId,
        target_index: usize,
    ) -> Self {
        Self {
            task_id: task.id.clone(),
            source_column_id,
            source_index,
            target_column_id,
            target_index,
            lane: None,
            completed_at: None,
        }
    }

    /// Record a lane change (ignored if it equals the task's current lane)
    pub fn with_lane(mut self, task: &Task, lane_id: Option<LaneId>) -> Self {
        self.lane = Change::if_changed(task.lane_id.clone(), lane_id);
        self
    }

    /// Record a completion-time update
    pub fn with_completed_at(mut self, task: &Task, completed_at: Option<DateTime<Utc>>) -> Self {
        self.completed_at = Some(Change::new(task.completed_at, completed_at));
        self
    }

    pub(crate) fn apply(&mut self, board: &mut Board) {
        let index = adjusted_insert_index(
            &self.source_column_id,
            self.source_index,
            &self.target_column_id,
            self.target_index,
        );
        let lane = &self.lane;
        let completed_at = &self.completed_at;
        relocate(board, &self.task_id, &self.target_column_id, index, |task| {
            if let Some(lane) = lane {
                task.lane_id = lane.new.clone();
            }
            if let Some(completed_at) = completed_at {
                task.completed_at = completed_at.new;
            }
        });
    }

    pub(crate) fn revert(&mut self, board: &mut Board) {
        let lane = &self.lane;
        let completed_at = &self.completed_at;
        relocate(
            board,
            &self.task_id,
            &self.source_column_id,
            self.source_index,
            |task| {
                if let Some(lane) = lane {
                    task.lane_id = lane.old.clone();
                }
                if let Some(completed_at) = completed_at {
                    task.completed_at = completed_at.old;
                }
            },
        );
    }
}

/// The archive fields of a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveState {
    pub is_archived: bool,
    pub archived_at: Option<DateTime<Utc>>,
    pub archived_from_column_id: Option<ColumnId>,
    pub archived_from_index: Option<usize>,
}

impl ArchiveState {
    fn of(task: &Task) -> Self {
        Self {
            is_archived: task.is_archived,
            archived_at: task.archived_at,
            archived_from_column_id: task.archived_from_column_id.clone(),
            archived_from_index: task.archived_from_index,
        }
    }

    fn write(&self, task: &mut Task) {
        task.is_archived = self.is_archived;
        task.archived_at = self.archived_at;
        task.archived_from_column_id = self.archived_from_column_id.clone();
        task.archived_from_index = self.archived_from_index;
    }
}

/// Move a task into (archive) or out of (unarchive) the archive column
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveCard {
    pub(crate) task_id: TaskId,
    pub(crate) archive: bool,
    source_column_id: ColumnId,
    source_index: usize,
    target_column_id: ColumnId,
    target_index: usize,
    old: ArchiveState,
    new: ArchiveState,
    lane: Option<Change<Option<LaneId>>>,
    completed_at: Option<Change<Option<DateTime<Utc>>>>,
}

impl ArchiveCard {
    /// Archiving records where the task came from, unless it was already
    /// archived or is not actually changing column. Unarchiving clears the
    /// archive fields.
    pub fn new(
        task: &Task,
        source_column_id: ColumnId,
        source_index: usize,
        target_column_id: ColumnId,
        target_index: usize,
        archive: bool,
        now: DateTime<Utc>,
    ) -> Self {
        let old = ArchiveState::of(task);
        let new = if archive {
            let records_origin = !old.is_archived && source_column_id != target_column_id;
            ArchiveState {
                is_archived: true,
                archived_at: if old.is_archived {
                    old.archived_at.or(Some(now))
                } else {
                    Some(now)
                },
                archived_from_column_id: if records_origin {
                    Some(source_column_id.clone())
                } else {
                    old.archived_from_column_id.clone()
                },
                archived_from_index: if records_origin {
                    Some(source_index)
                } else {
                    old.archived_from_index
                },
            }
        } else {
            ArchiveState {
                is_archived: false,
                archived_at: None,
                archived_from_column_id: None,
                archived_from_index: None,
            }
        };
        Self {
            task_id: task.id.clone(),
            archive,
            source_column_id,
            source_index,
            target_column_id,
            target_index,
            old,
            new,
            lane: None,
            completed_at: None,
        }
    }

    /// Record a lane change (ignored if it equals the task's current lane)
    pub fn with_lane(mut self, task: &Task, lane_id: Option<LaneId>) -> Self {
        self.lane = Change::if_changed(task.lane_id.clone(), lane_id);
        self
    }

    /// Record a completion-time update
    pub fn with_completed_at(mut self, task: &Task, completed_at: Option<DateTime<Utc>>) -> Self {
        self.completed_at = Some(Change::new(task.completed_at, completed_at));
        self
    }

    pub(crate) fn apply(&mut self, board: &mut Board) {
        let index = adjusted_insert_index(
            &self.source_column_id,
            self.source_index,
            &self.target_column_id,
            self.target_index,
        );
        let new = &self.new;
        let lane = &self.lane;
        let completed_at = &self.completed_at;
        relocate(board, &self.task_id, &self.target_column_id, index, |task| {
            new.write(task);
            if let Some(lane) = lane {
                task.lane_id = lane.new.clone();
            }
            if let Some(completed_at) = completed_at {
                task.completed_at = completed_at.new;
            }
        });
    }

    pub(crate) fn revert(&mut self, board: &mut Board) {
        let old = &self.old;
        let lane = &self.lane;
        let completed_at = &self.completed_at;
        relocate(
            board,
            &self.task_id,
            &self.source_column_id,
            self.source_index,
            |task| {
                old.write(task);
                if let Some(lane) = lane {
                    task.lane_id = lane.old.clone();
                }
                if let Some(completed_at) = completed_at {
                    task.completed_at = completed_at.old;
                }
            },
        );
    }
}
