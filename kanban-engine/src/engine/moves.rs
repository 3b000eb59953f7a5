//! Guarded moves: WIP context, blocked-task gate, done timestamps

use super::KanbanEngine;
use crate::command::{adjusted_insert_index, ArchiveCard, Command, MoveCard};
use crate::strings::{format_placeholders, KEY_BLOCKED, KEY_WIP_WARNING};
use crate::types::{
    is_unassigned_lane_id, lane_key, lane_keys_match, normalize_lane_id, BoardEvent,
    CardMovingArgs, Column, ColumnId, LaneId, MoveResult, Task, TaskId,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info, trace};

/// WIP situation of the target column for one pending move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WipContext {
    /// Lane the task resolves to for this move
    pub target_lane_id: Option<LaneId>,
    /// Count before the move (lane count when a lane override applies)
    pub current_count: usize,
    /// Count after the move
    pub target_count: usize,
    pub limit: Option<u32>,
    pub uses_lane_override: bool,
    pub would_exceed: bool,
}

impl WipContext {
    /// `"count/limit"`, or just the count when unlimited
    pub fn display(&self) -> String {
        match self.limit {
            Some(limit) => format!("{}/{}", self.target_count, limit),
            None => self.target_count.to_string(),
        }
    }
}

/// What a move does to `completed_at`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneTimestampUpdate {
    Keep,
    Set(DateTime<Utc>),
    Clear,
}

impl DoneTimestampUpdate {
    /// The new value, or `None` when the timestamp is left alone
    pub fn value(self) -> Option<Option<DateTime<Utc>>> {
        match self {
            DoneTimestampUpdate::Keep => None,
            DoneTimestampUpdate::Set(at) => Some(Some(at)),
            DoneTimestampUpdate::Clear => Some(None),
        }
    }
}

/// Lane a task ends up in. A blank request keeps the current lane, an
/// unassigned spelling clears it, anything else is trimmed.
fn resolve_target_lane(task: &Task, requested: Option<&str>) -> Option<LaneId> {
    match requested {
        Some(lane) if !lane.trim().is_empty() => {
            if is_unassigned_lane_id(Some(lane)) {
                None
            } else {
                Some(LaneId::from_string(lane.trim()))
            }
        }
        _ => normalize_lane_id(task.lane_str()).map(LaneId::from_string),
    }
}

fn wip_context_for(
    task: &Task,
    same_column: bool,
    target: &Column,
    requested_lane: Option<&str>,
) -> WipContext {
    let target_lane_id = resolve_target_lane(task, requested_lane);
    let key = lane_key(target_lane_id.as_ref().map(LaneId::as_str));
    let (current_count, limit, uses_lane_override) = match target.lane_wip_limits.get(&key) {
        Some(limit) => (target.lane_wip_count(Some(&key)), *limit, true),
        None => (target.task_count(), target.wip_limit, false),
    };
    let increments =
        !same_column || (uses_lane_override && !lane_keys_match(task.lane_str(), Some(&key)));
    let target_count = if increments {
        current_count + 1
    } else {
        current_count
    };
    WipContext {
        target_lane_id,
        current_count,
        target_count,
        limit,
        uses_lane_override,
        would_exceed: limit.is_some_and(|limit| target_count > limit as usize),
    }
}

fn with_done_update<C>(
    command: C,
    task: &Task,
    update: DoneTimestampUpdate,
    set: impl FnOnce(C, &Task, Option<DateTime<Utc>>) -> C,
) -> C {
    match update.value() {
        Some(value) => set(command, task, value),
        None => command,
    }
}

impl KanbanEngine {
    /// WIP context for moving `task_id` into `target_column_id`
    pub fn wip_context(
        &self,
        task_id: &TaskId,
        target_column_id: &ColumnId,
        target_lane_id: Option<&str>,
    ) -> Option<WipContext> {
        let (source_ci, task_index) = self.board.locate_task(task_id)?;
        let target_ci = self.board.column_index(target_column_id)?;
        let task = &self.board.columns[source_ci].tasks[task_index];
        Some(wip_context_for(
            task,
            source_ci == target_ci,
            &self.board.columns[target_ci],
            target_lane_id,
        ))
    }

    /// True if the move would put the target over its WIP limit. Unknown
    /// tasks or columns report false.
    pub fn validate_move_would_exceed_wip(
        &self,
        task_id: &TaskId,
        target_column_id: &ColumnId,
        target_lane_id: Option<&str>,
    ) -> bool {
        self.wip_context(task_id, target_column_id, target_lane_id)
            .is_some_and(|wip| wip.would_exceed)
    }

    /// How a move from `source` to `target` changes `completed_at`
    pub fn done_timestamp_update(
        &self,
        source: &ColumnId,
        target: &ColumnId,
        now: DateTime<Utc>,
    ) -> DoneTimestampUpdate {
        let Some(done) = self.board.done_column().map(|c| &c.id) else {
            return DoneTimestampUpdate::Keep;
        };
        if self.board.is_archive_column(target) {
            return DoneTimestampUpdate::Keep;
        }
        if target == done {
            if source == done {
                DoneTimestampUpdate::Keep
            } else {
                DoneTimestampUpdate::Set(now)
            }
        } else if source == done || self.board.is_archive_column(source) {
            DoneTimestampUpdate::Clear
        } else {
            DoneTimestampUpdate::Keep
        }
    }

    /// Move a task with WIP and blocked-task gates.
    ///
    /// `target_index` defaults to the end of the target column and is clamped
    /// to its length. `target_lane_id` of `None` or blank keeps the task's
    /// lane; an unassigned spelling (`"0"`, `"__unassigned__"`) clears it.
    /// Moving into the archive column never changes the lane.
    pub fn try_move_task_with_wip_enforcement(
        &mut self,
        task_id: &TaskId,
        target_column_id: &ColumnId,
        target_index: Option<usize>,
        target_lane_id: Option<&str>,
        enforce_hard: bool,
    ) -> MoveResult {
        let Some((source_ci, source_index)) = self.board.locate_task(task_id) else {
            debug!(task = %task_id, "move rejected: task not found");
            return MoveResult::NotFound;
        };
        let Some(target_ci) = self.board.column_index(target_column_id) else {
            debug!(task = %task_id, column = %target_column_id, "move rejected: column not found");
            return MoveResult::NotFound;
        };

        let source = &self.board.columns[source_ci];
        let target = &self.board.columns[target_ci];
        let task = source.tasks[source_index].clone();
        let source_column_id = source.id.clone();
        let target_column_id = target.id.clone();
        let same_column = source_ci == target_ci;
        let target_len = target.task_count();
        let insert_index = target_index.unwrap_or(target_len).min(target_len);
        let wip = wip_context_for(&task, same_column, target, target_lane_id);

        let source_is_archive = self.board.is_archive_column(&source_column_id);
        let target_is_archive = self.board.is_archive_column(&target_column_id);
        let new_lane = if target_is_archive {
            task.lane_id.clone()
        } else {
            wip.target_lane_id.clone()
        };

        let same_lane = lane_keys_match(new_lane.as_ref().map(LaneId::as_str), task.lane_str());
        if same_column && same_lane {
            let final_index = adjusted_insert_index(
                &source_column_id,
                source_index,
                &target_column_id,
                insert_index,
            )
            .min(target_len.saturating_sub(1));
            if final_index == source_index {
                trace!(task = %task_id, "move to current position ignored");
                return MoveResult::Success;
            }
        }

        let blocked_forward =
            task.is_blocked && (target_is_archive || (!same_column && target_ci > source_ci));
        let mut args = CardMovingArgs {
            task_id: task_id.clone(),
            source_column_id: source_column_id.clone(),
            target_column_id: target_column_id.clone(),
            target_index: insert_index,
            target_lane_id: wip.target_lane_id.clone(),
            target_wip_count: wip.target_count,
            target_wip_limit: wip.limit,
            would_exceed_wip: wip.would_exceed,
            cancel: blocked_forward,
            cancel_reason: blocked_forward.then(|| self.blocked_message(&task)),
        };
        if self.notify_moving(&mut args) || blocked_forward {
            info!(
                task = %task_id,
                target = %target_column_id,
                blocked = blocked_forward,
                reason = args.cancel_reason.as_deref().unwrap_or(""),
                "move canceled"
            );
            if let Some(reason) = args.cancel_reason.filter(|r| !r.trim().is_empty()) {
                self.set_status_message(reason);
            }
            return MoveResult::CanceledByEvent;
        }

        if wip.would_exceed && enforce_hard {
            info!(
                task = %task_id,
                target = %target_column_id,
                wip = %wip.display(),
                "move blocked by WIP limit"
            );
            self.set_wip_warning(&wip);
            return MoveResult::BlockedByWip;
        }

        let now = self.now();
        let done = self.done_timestamp_update(&source_column_id, &target_column_id, now);
        let command: Command = if target_is_archive && !source_is_archive {
            let archive = ArchiveCard::new(
                &task,
                source_column_id.clone(),
                source_index,
                target_column_id.clone(),
                insert_index,
                true,
                now,
            );
            with_done_update(archive, &task, done, ArchiveCard::with_completed_at).into()
        } else if source_is_archive && !target_is_archive {
            let unarchive = ArchiveCard::new(
                &task,
                source_column_id.clone(),
                source_index,
                target_column_id.clone(),
                insert_index,
                false,
                now,
            )
            .with_lane(&task, new_lane);
            with_done_update(unarchive, &task, done, ArchiveCard::with_completed_at).into()
        } else {
            let plain = MoveCard::new(
                &task,
                source_column_id.clone(),
                source_index,
                target_column_id.clone(),
                insert_index,
            )
            .with_lane(&task, new_lane);
            with_done_update(plain, &task, done, MoveCard::with_completed_at).into()
        };
        self.execute(command);

        self.emit(BoardEvent::CardMoved {
            task_id: task_id.clone(),
            source_column_id,
            target_column_id,
        });
        self.refresh_search();

        if wip.would_exceed {
            self.set_wip_warning(&wip);
            MoveResult::AllowedWithWipWarning
        } else {
            MoveResult::Success
        }
    }

    /// Guarded move using the configured enforcement mode
    pub fn move_task_default(
        &mut self,
        task_id: &TaskId,
        target_column_id: &ColumnId,
        target_index: Option<usize>,
        target_lane_id: Option<&str>,
    ) -> MoveResult {
        let enforce_hard = self.config.enforce_wip_hard;
        self.try_move_task_with_wip_enforcement(
            task_id,
            target_column_id,
            target_index,
            target_lane_id,
            enforce_hard,
        )
    }

    /// Guarded move with soft WIP enforcement. True when the task moved.
    pub fn try_move_task(
        &mut self,
        task_id: &TaskId,
        target_column_id: &ColumnId,
        target_index: Option<usize>,
        target_lane_id: Option<&str>,
    ) -> bool {
        self.try_move_task_with_wip_enforcement(
            task_id,
            target_column_id,
            target_index,
            target_lane_id,
            false,
        )
        .is_moved()
    }

    /// Move without gates or moving/moved events. Done timestamps still
    /// follow the usual rule and the move is undoable.
    pub fn move_task(
        &mut self,
        task_id: &TaskId,
        target_column_id: &ColumnId,
        target_index: Option<usize>,
    ) -> bool {
        let Some((source_ci, source_index)) = self.board.locate_task(task_id) else {
            return false;
        };
        let Some(target) = self.board.column(target_column_id) else {
            return false;
        };
        let insert_index = target_index
            .unwrap_or(target.task_count())
            .min(target.task_count());
        let source = &self.board.columns[source_ci];
        let task = source.tasks[source_index].clone();
        let source_column_id = source.id.clone();
        let done = self.done_timestamp_update(&source_column_id, target_column_id, self.now());
        let command = MoveCard::new(
            &task,
            source_column_id,
            source_index,
            target_column_id.clone(),
            insert_index,
        );
        self.execute(with_done_update(command, &task, done, MoveCard::with_completed_at));
        self.refresh_search();
        true
    }

    pub(crate) fn blocked_message(&self, task: &Task) -> String {
        let label = self.string(KEY_BLOCKED, "Blocked");
        match task
            .blocked_reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
        {
            Some(reason) => format!("{}: {}", label, reason),
            None => label,
        }
    }

    fn set_wip_warning(&mut self, wip: &WipContext) {
        let template = self.string(KEY_WIP_WARNING, "WIP limit exceeded ({0}).");
        let message = format_placeholders(&template, &[&wip.display()]);
        self.set_status_message(message);
    }
}
