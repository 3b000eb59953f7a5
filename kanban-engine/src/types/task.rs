//! Task types: Task, Subtask, Priority, Palette, TaskPatch

use super::ids::{ColumnId, LaneId, SubtaskId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

/// Card accent color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    #[default]
    Default,
    Primary,
    Secondary,
    Accent,
    Neutral,
    Info,
    Success,
    Warning,
    Error,
}

/// A task/card on the kanban board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Assigned once at creation, unique within the board
    #[serde(default)]
    pub work_item_number: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub palette: Palette,

    /// Free-text tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    /// Manual progress, 0..=100
    #[serde(default)]
    pub progress_percent: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lane_id: Option<LaneId>,

    // Scheduling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_start: Option<DateTime<Utc>>,
    /// Due date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_hours: Option<f64>,

    /// Set while the task sits in the Done column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    // Blocked state
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_since: Option<DateTime<Utc>>,

    // Archive state
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_from_column_id: Option<ColumnId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_from_index: Option<usize>,

    #[serde(default)]
    pub subtasks: Vec<Subtask>,

    /// View flag: selected for bulk operations. Not persisted.
    #[serde(skip)]
    pub is_selected: bool,
    /// View flag: matches the active search. Not persisted, not authoritative.
    #[serde(skip, default = "default_search_match")]
    pub is_search_match: bool,
}

fn default_search_match() -> bool {
    true
}

impl Task {
    /// Create a new task with a fresh id. The work-item number is assigned
    /// when the task is added to a board.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(),
            work_item_number: 0,
            title: title.into(),
            description: String::new(),
            palette: Palette::Default,
            tags: None,
            assignee: None,
            assignee_id: None,
            priority: Priority::Normal,
            progress_percent: 0,
            lane_id: None,
            planned_start: None,
            planned_end: None,
            actual_start: None,
            actual_end: None,
            estimated_hours: None,
            actual_hours: None,
            completed_at: None,
            is_blocked: false,
            blocked_reason: None,
            blocked_since: None,
            is_archived: false,
            archived_at: None,
            archived_from_column_id: None,
            archived_from_index: None,
            subtasks: Vec::new(),
            is_selected: false,
            is_search_match: true,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the lane
    pub fn with_lane(mut self, lane_id: impl Into<LaneId>) -> Self {
        self.lane_id = Some(lane_id.into());
        self
    }

    /// Set the palette
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the free-text tags
    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    /// Set the assignee display name
    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    /// Lane id as a plain string slice
    pub fn lane_str(&self) -> Option<&str> {
        self.lane_id.as_ref().map(LaneId::as_str)
    }

    /// Set manual progress, clamped to 0..=100
    pub fn set_progress(&mut self, percent: i32) {
        self.progress_percent = percent.clamp(0, 100) as u8;
    }

    /// Percentage of completed subtasks (0 when there are none)
    pub fn subtask_progress(&self) -> u8 {
        if self.subtasks.is_empty() {
            return 0;
        }
        let done = self.subtasks.iter().filter(|s| s.is_completed).count();
        (done * 100 / self.subtasks.len()) as u8
    }

    /// Subtask-derived progress when there are subtasks, manual progress otherwise
    pub fn effective_progress(&self) -> u8 {
        if self.subtasks.is_empty() {
            self.progress_percent
        } else {
            self.subtask_progress()
        }
    }

    /// Past the due date and not finished
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        matches!(self.planned_end, Some(due) if due < now) && self.actual_end.is_none()
    }

    /// Whole days the task has been blocked
    pub fn blocked_days(&self, now: DateTime<Utc>) -> Option<i64> {
        self.blocked_since.map(|since| (now - since).num_days())
    }

    /// Find a subtask by id
    pub fn find_subtask(&self, id: &SubtaskId) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| &s.id == id)
    }

    /// Find a subtask by id (mutable)
    pub fn find_subtask_mut(&mut self, id: &SubtaskId) -> Option<&mut Subtask> {
        self.subtasks.iter_mut().find(|s| &s.id == id)
    }
}

/// A checklist item owned by its parent task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: SubtaskId,
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
}

impl Subtask {
    /// Create a new subtask
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: SubtaskId::new(),
            title: title.into(),
            is_completed: false,
        }
    }
}

/// Edits to fields that are not covered by the undoable commands.
///
/// `None` leaves a field untouched; `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub priority: Option<Priority>,
    pub tags: Option<Option<String>>,
    pub assignee: Option<Option<String>>,
    pub assignee_id: Option<Option<String>>,
    pub lane_id: Option<Option<LaneId>>,
    pub planned_start: Option<Option<DateTime<Utc>>>,
    pub planned_end: Option<Option<DateTime<Utc>>>,
    pub actual_start: Option<Option<DateTime<Utc>>>,
    pub actual_end: Option<Option<DateTime<Utc>>>,
    pub progress_percent: Option<i32>,
    pub estimated_hours: Option<Option<f64>>,
    pub actual_hours: Option<Option<f64>>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_tags(mut self, tags: Option<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn with_assignee(mut self, assignee: Option<String>) -> Self {
        self.assignee = Some(assignee);
        self
    }

    pub fn with_assignee_id(mut self, assignee_id: Option<String>) -> Self {
        self.assignee_id = Some(assignee_id);
        self
    }

    pub fn with_lane(mut self, lane_id: Option<LaneId>) -> Self {
        self.lane_id = Some(lane_id);
        self
    }

    pub fn with_planned_start(mut self, date: Option<DateTime<Utc>>) -> Self {
        self.planned_start = Some(date);
        self
    }

    /// Set or clear the due date
    pub fn with_due_date(mut self, date: Option<DateTime<Utc>>) -> Self {
        self.planned_end = Some(date);
        self
    }

    pub fn with_actual_start(mut self, date: Option<DateTime<Utc>>) -> Self {
        self.actual_start = Some(date);
        self
    }

    pub fn with_actual_end(mut self, date: Option<DateTime<Utc>>) -> Self {
        self.actual_end = Some(date);
        self
    }

    pub fn with_progress(mut self, percent: i32) -> Self {
        self.progress_percent = Some(percent);
        self
    }

    pub fn with_estimated_hours(mut self, hours: Option<f64>) -> Self {
        self.estimated_hours = Some(hours);
        self
    }

    pub fn with_actual_hours(mut self, hours: Option<f64>) -> Self {
        self.actual_hours = Some(hours);
        self
    }

    /// True if applying the patch can change the task's search match
    pub fn touches_search_fields(&self) -> bool {
        self.tags.is_some() || self.assignee.is_some() || self.assignee_id.is_some()
    }

    /// Apply the patch, returning true if any field changed
    pub fn apply(&self, task: &mut Task) -> bool {
        let before = task.clone();
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(tags) = &self.tags {
            task.tags = tags.clone().filter(|t| !t.trim().is_empty());
        }
        if let Some(assignee) = &self.assignee {
            task.assignee = assignee.clone();
        }
        if let Some(assignee_id) = &self.assignee_id {
            task.assignee_id = assignee_id.clone();
        }
        if let Some(lane_id) = &self.lane_id {
            task.lane_id = lane_id.clone();
        }
        if let Some(date) = self.planned_start {
            task.planned_start = date;
        }
        if let Some(date) = self.planned_end {
            task.planned_end = date;
        }
        if let Some(date) = self.actual_start {
            task.actual_start = date;
        }
        if let Some(date) = self.actual_end {
            task.actual_end = date;
        }
        if let Some(percent) = self.progress_percent {
            task.set_progress(percent);
        }
        if let Some(hours) = self.estimated_hours {
            task.estimated_hours = hours;
        }
        if let Some(hours) = self.actual_hours {
            task.actual_hours = hours;
        }
        *task != before
    }
}
