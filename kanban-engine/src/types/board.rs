//! Board-level types: Board, Column, GroupBy, BoardMetadata, BoardStatistics

use super::ids::{BoardId, ColumnId, LaneId, TaskId};
use super::lane::{lane_key, Lane};
use super::task::Task;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Current on-disk schema version written by this crate
pub const BOARD_SCHEMA_VERSION: u32 = 1;

/// Default age, in days, after which Done tasks are auto-archived
pub const DEFAULT_AUTO_ARCHIVE_DAYS: u32 = 14;

/// Upper bound for the auto-archive age, about ten years
pub const MAX_AUTO_ARCHIVE_DAYS: u32 = 3650;

/// How the board groups tasks for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    #[default]
    None,
    Lane,
}

/// A column defines a workflow stage and owns its tasks in display order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wip_limit: Option<u32>,
    /// Lane key -> override. A present key with no limit still counts as an
    /// override (the lane is unlimited in this column).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub lane_wip_limits: BTreeMap<String, Option<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_text: Option<String>,
    #[serde(default)]
    pub is_collapsed: bool,

    /// Derived from `Board::archive_column_id`
    #[serde(skip)]
    pub is_archive_column: bool,
    /// Derived: false only for a hidden archive column
    #[serde(skip, default = "visible_by_default")]
    pub is_archive_column_visible: bool,
}

fn visible_by_default() -> bool {
    true
}

impl Column {
    /// Create an empty column with a fresh id
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: ColumnId::new(),
            title: title.into(),
            tasks: Vec::new(),
            wip_limit: None,
            lane_wip_limits: BTreeMap::new(),
            policy_text: None,
            is_collapsed: false,
            is_archive_column: false,
            is_archive_column_visible: true,
        }
    }

    /// Set an explicit id
    pub fn with_id(mut self, id: impl Into<ColumnId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the column WIP limit
    pub fn with_wip_limit(mut self, limit: u32) -> Self {
        self.wip_limit = Some(limit);
        self
    }

    /// Number of tasks in the column
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Position of a task in this column
    pub fn index_of(&self, task_id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == task_id)
    }

    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.index_of(task_id).is_some()
    }

    /// True when a column limit is set and the task count is above it
    pub fn is_wip_exceeded(&self) -> bool {
        matches!(self.wip_limit, Some(limit) if self.tasks.len() > limit as usize)
    }

    /// `"count/limit"`, or just the count when unlimited
    pub fn wip_display(&self) -> String {
        match self.wip_limit {
            Some(limit) => format!("{}/{}", self.tasks.len(), limit),
            None => self.tasks.len().to_string(),
        }
    }

    /// The lane override for `lane_id`, if one is configured.
    ///
    /// The outer `Option` says whether an override exists; the inner one is
    /// the override's limit.
    pub fn lane_wip_override(&self, lane_id: Option<&str>) -> Option<Option<u32>> {
        self.lane_wip_limits.get(&lane_key(lane_id)).copied()
    }

    /// Effective limit for a lane: the lane override if present, else the column limit
    pub fn lane_wip_limit(&self, lane_id: Option<&str>) -> Option<u32> {
        self.lane_wip_override(lane_id).unwrap_or(self.wip_limit)
    }

    /// Number of tasks in this column whose lane key matches `lane_id`
    pub fn lane_wip_count(&self, lane_id: Option<&str>) -> usize {
        let key = lane_key(lane_id);
        self.tasks
            .iter()
            .filter(|t| lane_key(t.lane_str()) == key)
            .count()
    }

    /// True when the lane's count is above its effective limit
    pub fn is_lane_wip_exceeded(&self, lane_id: Option<&str>) -> bool {
        match self.lane_wip_override(lane_id) {
            Some(Some(limit)) => self.lane_wip_count(lane_id) > limit as usize,
            Some(None) => false,
            None => self.is_wip_exceeded(),
        }
    }

    /// Set (clamped to >= 0) or remove a lane override
    pub fn set_lane_wip_limit(&mut self, lane_id: Option<&str>, limit: Option<i64>) {
        let key = lane_key(lane_id);
        match limit {
            Some(limit) => {
                let clamped = limit.clamp(0, u32::MAX as i64) as u32;
                self.lane_wip_limits.insert(key, Some(clamped));
            }
            None => {
                self.lane_wip_limits.remove(&key);
            }
        }
    }
}

/// The root aggregate: ordered columns and lanes plus board-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub lanes: Vec<Lane>,
    #[serde(default)]
    pub group_by: GroupBy,
    #[serde(default = "current_schema_version")]
    pub schema_version: u32,
    #[serde(default = "first_work_item_number")]
    pub next_work_item_number: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_column_id: Option<ColumnId>,
    #[serde(default)]
    pub is_archive_column_hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_column_id: Option<ColumnId>,
    #[serde(default)]
    pub auto_archive_done_enabled: bool,
    #[serde(default = "default_auto_archive_days")]
    pub auto_archive_done_days: u32,

    #[serde(default)]
    pub columns: Vec<Column>,
}

fn current_schema_version() -> u32 {
    BOARD_SCHEMA_VERSION
}

fn first_work_item_number() -> u32 {
    1
}

fn default_auto_archive_days() -> u32 {
    DEFAULT_AUTO_ARCHIVE_DAYS
}

impl Board {
    /// Create an empty board with a fresh id
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: BoardId::new(),
            title: title.into(),
            description: None,
            created_at: Utc::now(),
            created_by: None,
            tags: Vec::new(),
            lanes: Vec::new(),
            group_by: GroupBy::None,
            schema_version: BOARD_SCHEMA_VERSION,
            next_work_item_number: 1,
            archive_column_id: None,
            is_archive_column_hidden: false,
            done_column_id: None,
            auto_archive_done_enabled: false,
            auto_archive_done_days: DEFAULT_AUTO_ARCHIVE_DAYS,
            columns: Vec::new(),
        }
    }

    /// Set an explicit id
    pub fn with_id(mut self, id: impl Into<BoardId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a column
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Append a lane
    pub fn with_lane(mut self, lane: Lane) -> Self {
        self.lanes.push(lane);
        self
    }

    // Column lookup. Dangling ids resolve to None.

    pub fn column_index(&self, id: &ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| &c.id == id)
    }

    pub fn column(&self, id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| &c.id == id)
    }

    pub fn column_mut(&mut self, id: &ColumnId) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| &c.id == id)
    }

    /// The configured archive column, if it still exists
    pub fn archive_column(&self) -> Option<&Column> {
        self.archive_column_id.as_ref().and_then(|id| self.column(id))
    }

    /// The configured Done column, if it still exists
    pub fn done_column(&self) -> Option<&Column> {
        self.done_column_id.as_ref().and_then(|id| self.column(id))
    }

    pub fn is_archive_column(&self, id: &ColumnId) -> bool {
        self.archive_column_id.as_ref() == Some(id)
    }

    pub fn is_done_column(&self, id: &ColumnId) -> bool {
        self.done_column_id.as_ref() == Some(id)
    }

    /// Locate a task: (column index, task index)
    pub fn locate_task(&self, task_id: &TaskId) -> Option<(usize, usize)> {
        self.columns
            .iter()
            .enumerate()
            .find_map(|(ci, c)| c.index_of(task_id).map(|ti| (ci, ti)))
    }

    /// The column currently holding a task
    pub fn column_for_task(&self, task_id: &TaskId) -> Option<&Column> {
        self.locate_task(task_id).map(|(ci, _)| &self.columns[ci])
    }

    pub fn task(&self, task_id: &TaskId) -> Option<&Task> {
        self.locate_task(task_id)
            .map(|(ci, ti)| &self.columns[ci].tasks[ti])
    }

    pub fn task_mut(&mut self, task_id: &TaskId) -> Option<&mut Task> {
        let (ci, ti) = self.locate_task(task_id)?;
        Some(&mut self.columns[ci].tasks[ti])
    }

    /// All tasks in column order
    pub fn all_tasks(&self) -> impl Iterator<Item = &Task> {
        self.columns.iter().flat_map(|c| c.tasks.iter())
    }

    pub fn all_tasks_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.columns.iter_mut().flat_map(|c| c.tasks.iter_mut())
    }

    pub fn total_task_count(&self) -> usize {
        self.columns.iter().map(|c| c.tasks.len()).sum()
    }

    pub fn lane(&self, id: &LaneId) -> Option<&Lane> {
        self.lanes.iter().find(|l| &l.id == id)
    }

    pub fn lane_index(&self, id: &LaneId) -> Option<usize> {
        self.lanes.iter().position(|l| &l.id == id)
    }

    /// Recompute the derived archive flags on every column.
    ///
    /// Must run whenever `archive_column_id` or `is_archive_column_hidden`
    /// changes, and after load.
    pub fn refresh_column_flags(&mut self) {
        let archive_id = self.archive_column_id.clone();
        let hidden = self.is_archive_column_hidden;
        for column in &mut self.columns {
            column.is_archive_column = archive_id.as_ref() == Some(&column.id);
            column.is_archive_column_visible = !(column.is_archive_column && hidden);
        }
    }

    /// Assign a work-item number to a task that has none.
    ///
    /// Numbers already set are kept. New numbers are at least one past the
    /// highest number on the board.
    pub fn ensure_task_number(&mut self, task: &mut Task) {
        if task.work_item_number > 0 {
            return;
        }
        let max_existing = self
            .all_tasks()
            .map(|t| t.work_item_number)
            .max()
            .unwrap_or(0);
        let next = self
            .next_work_item_number
            .max(max_existing.saturating_add(1))
            .max(1);
        task.work_item_number = next;
        self.next_work_item_number = next.saturating_add(1);
    }

    /// Renumber tasks whose number is zero or duplicated, leaving valid
    /// numbers alone. Returns how many tasks were renumbered.
    pub fn ensure_work_item_numbers(&mut self) -> usize {
        let max_existing = self
            .all_tasks()
            .map(|t| t.work_item_number)
            .max()
            .unwrap_or(0);
        let mut next = self
            .next_work_item_number
            .max(max_existing.saturating_add(1))
            .max(1);
        let mut seen = HashSet::new();
        let mut renumbered = 0;
        for task in self.all_tasks_mut() {
            if task.work_item_number > 0 && seen.insert(task.work_item_number) {
                continue;
            }
            task.work_item_number = next;
            seen.insert(next);
            next = next.saturating_add(1);
            renumbered += 1;
        }
        self.next_work_item_number = next;
        renumbered
    }

    /// Summary for board listings
    pub fn metadata(&self) -> BoardMetadata {
        BoardMetadata {
            id: self.id.clone(),
            title: self.title.clone(),
            column_count: self.columns.len(),
            task_count: self.total_task_count(),
        }
    }

    /// Aggregate counts across the board
    pub fn statistics(&self) -> BoardStatistics {
        let mut tasks_per_column = BTreeMap::new();
        for column in &self.columns {
            *tasks_per_column.entry(column.title.clone()).or_insert(0) += column.tasks.len();
        }
        BoardStatistics {
            column_count: self.columns.len(),
            total_task_count: self.total_task_count(),
            tasks_per_column,
            empty_columns: self.columns.iter().filter(|c| c.tasks.is_empty()).count(),
            blocked_count: self.all_tasks().filter(|t| t.is_blocked).count(),
            archived_count: self.all_tasks().filter(|t| t.is_archived).count(),
            over_wip_columns: self.columns.iter().filter(|c| c.is_wip_exceeded()).count(),
        }
    }
}

/// Listing entry for a stored board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardMetadata {
    pub id: BoardId,
    pub title: String,
    pub column_count: usize,
    pub task_count: usize,
}

/// Counts describing a board
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardStatistics {
    pub column_count: usize,
    pub total_task_count: usize,
    /// Task counts keyed by column title (columns sharing a title are summed)
    pub tasks_per_column: BTreeMap<String, usize>,
    pub empty_columns: usize,
    pub blocked_count: usize,
    pub archived_count: usize,
    pub over_wip_columns: usize,
}
