//! Column structure, WIP limits, and policies

use super::KanbanEngine;
use crate::strings::{
    KEY_COLUMN_BACKLOG, KEY_COLUMN_DONE, KEY_COLUMN_IN_PROGRESS, KEY_COLUMN_TODO,
};
use crate::types::{BoardEvent, Column, ColumnId, Task};
use tracing::debug;

impl KanbanEngine {
    /// Append a column, returning its id
    pub fn add_column(&mut self, title: impl Into<String>) -> ColumnId {
        let index = self.board.columns.len();
        self.insert_column(title, index)
    }

    /// Insert a column at `index` (clamped)
    pub fn insert_column(&mut self, title: impl Into<String>, index: usize) -> ColumnId {
        let column = Column::new(title);
        let id = column.id.clone();
        let index = index.min(self.board.columns.len());
        debug!(column = %id, index, "insert column");
        self.board_mut().columns.insert(index, column);
        self.structure_changed();
        id
    }

    /// Remove a column and every task in it
    pub fn remove_column(&mut self, id: &ColumnId) -> bool {
        match self.board.column_index(id) {
            Some(index) => self.remove_column_at(index),
            None => false,
        }
    }

    /// Remove the column with this exact title. Ambiguous titles remove nothing.
    pub fn remove_column_by_title(&mut self, title: &str) -> bool {
        let mut matches = self
            .board
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.title == title)
            .map(|(i, _)| i);
        match (matches.next(), matches.next()) {
            (Some(index), None) => self.remove_column_at(index),
            _ => false,
        }
    }

    pub fn remove_column_at(&mut self, index: usize) -> bool {
        if index >= self.board.columns.len() {
            return false;
        }
        let column = self.board_mut().columns.remove(index);
        debug!(column = %column.id, tasks = column.tasks.len(), "removed column");
        self.structure_changed();
        true
    }

    pub fn find_column_by_title(&self, title: &str) -> Option<&Column> {
        self.board.columns.iter().find(|c| c.title == title)
    }

    pub fn column_at(&self, index: usize) -> Option<&Column> {
        self.board.columns.get(index)
    }

    /// Tasks of a column, empty when the column does not exist
    pub fn tasks_for_column(&self, id: &ColumnId) -> &[Task] {
        self.board
            .column(id)
            .map(|c| c.tasks.as_slice())
            .unwrap_or(&[])
    }

    /// Move a column to `new_index` (clamped). Column order decides what
    /// counts as a forward move for blocked tasks.
    pub fn move_column(&mut self, id: &ColumnId, new_index: usize) -> bool {
        let Some(current) = self.board.column_index(id) else {
            return false;
        };
        let new_index = new_index.min(self.board.columns.len() - 1);
        if current == new_index {
            return true;
        }
        let columns = &mut self.board_mut().columns;
        let column = columns.remove(current);
        columns.insert(new_index, column);
        self.structure_changed();
        true
    }

    pub fn rename_column(&mut self, id: &ColumnId, title: impl Into<String>) -> bool {
        let title = title.into();
        self.edit_column(id, |column| column.title = title)
    }

    /// Remove every column (and so every task)
    pub fn clear_columns(&mut self) {
        self.board_mut().columns.clear();
        self.structure_changed();
    }

    pub fn set_column_wip_limit(&mut self, id: &ColumnId, limit: Option<u32>) -> bool {
        self.edit_column(id, |column| column.wip_limit = limit)
    }

    /// Set a lane override on a column. Negative limits clamp to zero;
    /// `None` removes the override.
    pub fn set_lane_wip_limit(
        &mut self,
        id: &ColumnId,
        lane_id: Option<&str>,
        limit: Option<i64>,
    ) -> bool {
        self.edit_column(id, |column| column.set_lane_wip_limit(lane_id, limit))
    }

    pub fn clear_lane_wip_limit(&mut self, id: &ColumnId, lane_id: Option<&str>) -> bool {
        self.set_lane_wip_limit(id, lane_id, None)
    }

    /// Effective limit for a lane in a column
    pub fn lane_wip_limit(&self, id: &ColumnId, lane_id: Option<&str>) -> Option<u32> {
        self.board.column(id).and_then(|c| c.lane_wip_limit(lane_id))
    }

    pub fn is_wip_exceeded(&self, id: &ColumnId) -> bool {
        self.board.column(id).is_some_and(Column::is_wip_exceeded)
    }

    pub fn over_wip_columns(&self) -> Vec<&Column> {
        self.board
            .columns
            .iter()
            .filter(|c| c.is_wip_exceeded())
            .collect()
    }

    pub fn set_column_collapsed(&mut self, id: &ColumnId, collapsed: bool) -> bool {
        self.edit_column(id, |column| column.is_collapsed = collapsed)
    }

    /// Set the column's policy text (definition of done, entry criteria, ...)
    pub fn set_column_policy(&mut self, id: &ColumnId, policy: Option<String>) -> bool {
        self.edit_column(id, |column| column.policy_text = policy)
    }

    pub fn columns_with_policies(&self) -> Vec<&Column> {
        self.board
            .columns
            .iter()
            .filter(|c| c.policy_text.as_deref().is_some_and(|p| !p.trim().is_empty()))
            .collect()
    }

    /// Remove every column
    pub fn clear_board(&mut self) {
        self.clear_columns();
    }

    /// Replace all columns with fresh empty ones
    pub fn reset_board(&mut self, titles: &[&str]) {
        let board = self.board_mut();
        board.columns = titles.iter().map(|title| Column::new(*title)).collect();
        self.structure_changed();
    }

    /// Backlog / To Do / In Progress / Done, with Done as the done column
    pub fn create_default_board(&mut self) {
        let titles = [
            self.string(KEY_COLUMN_BACKLOG, "Backlog"),
            self.string(KEY_COLUMN_TODO, "To Do"),
            self.string(KEY_COLUMN_IN_PROGRESS, "In Progress"),
            self.string(KEY_COLUMN_DONE, "Done"),
        ];
        let titles: Vec<&str> = titles.iter().map(String::as_str).collect();
        self.reset_board(&titles);
        self.board.done_column_id = self.resolve_default_done_column();
        self.board_changed(Some("done_column_id"));
    }

    /// The configured done column if it exists, else the first non-archive
    /// column titled "Done" (ignoring case and whitespace), else the last
    /// non-archive column.
    pub fn resolve_default_done_column(&self) -> Option<ColumnId> {
        if let Some(done) = self.board.done_column() {
            return Some(done.id.clone());
        }
        let done_title = self.string(KEY_COLUMN_DONE, "Done");
        let candidates = || {
            self.board
                .columns
                .iter()
                .filter(|c| !self.board.is_archive_column(&c.id))
        };
        candidates()
            .find(|c| c.title.trim().eq_ignore_ascii_case(done_title.trim()))
            .or_else(|| candidates().last())
            .map(|c| c.id.clone())
    }

    fn edit_column(&mut self, id: &ColumnId, edit: impl FnOnce(&mut Column)) -> bool {
        let Some(column) = self.board.column_mut(id) else {
            return false;
        };
        edit(column);
        self.dirty = true;
        self.emit(BoardEvent::ColumnEdited {
            column_id: id.clone(),
        });
        true
    }

    fn structure_changed(&mut self) {
        self.board.refresh_column_flags();
        self.board_changed(Some("columns"));
        self.sync_done_column_timestamps();
        self.done_config_changed();
        self.refresh_search();
    }
}
