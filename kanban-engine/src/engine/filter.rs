//! Search text, filter criteria, and the per-task match flag

use super::KanbanEngine;
use crate::search::FilterCriteria;
use crate::types::{BoardEvent, Column, Task};
use tracing::trace;

impl KanbanEngine {
    pub fn search_text(&self) -> &str {
        &self.search.text
    }

    /// Change the free-text filter and recompute matches
    pub fn set_search_text(&mut self, text: impl Into<String>) -> usize {
        self.search.text = text.into();
        self.reapply_filter()
    }

    pub fn filter_criteria(&self) -> Option<&FilterCriteria> {
        self.search.criteria.as_ref()
    }

    /// Install (or remove) structured criteria. While any criterion is set
    /// they replace the free-text rule outside the archive column.
    pub fn set_filter_criteria(&mut self, criteria: Option<FilterCriteria>) -> usize {
        self.search.criteria = criteria;
        self.reapply_filter()
    }

    /// Drop both the search text and the criteria
    pub fn clear_filter(&mut self) -> usize {
        self.search.text.clear();
        self.search.criteria = None;
        self.reapply_filter()
    }

    pub fn matching_tasks(&self) -> Vec<&Task> {
        self.find_tasks(|t| t.is_search_match)
    }

    /// Columns shown under the current criteria. Without criteria every
    /// column is shown, except a hidden archive column.
    pub fn visible_columns(&self) -> Vec<&Column> {
        self.board
            .columns
            .iter()
            .filter(|c| match &self.search.criteria {
                Some(criteria) => criteria.is_column_included(c),
                None => !(c.is_archive_column && self.board.is_archive_column_hidden),
            })
            .collect()
    }

    /// Recompute match flags after a board edit. `SearchFilterChanged`
    /// fires only when some flag flipped.
    pub(crate) fn refresh_search(&mut self) -> usize {
        let changed = self.recompute_matches();
        if changed > 0 {
            trace!(changed, "search matches changed");
            self.emit(BoardEvent::SearchFilterChanged { changed });
        }
        changed
    }

    /// Recompute match flags after the filter itself changed. The event
    /// always fires.
    fn reapply_filter(&mut self) -> usize {
        let changed = self.recompute_matches();
        trace!(changed, "filter reapplied");
        self.emit(BoardEvent::SearchFilterChanged { changed });
        changed
    }

    /// Recompute `is_search_match` for every task, returning how many
    /// flags flipped
    fn recompute_matches(&mut self) -> usize {
        let now = self.now();
        let archive_id = self.board.archive_column_id.clone();
        let mut changed = 0;
        for column in &mut self.board.columns {
            let in_archive = archive_id.as_ref() == Some(&column.id);
            for task in &mut column.tasks {
                let matched = self.search.is_match(task, in_archive, now);
                if task.is_search_match != matched {
                    task.is_search_match = matched;
                    changed += 1;
                }
            }
        }
        changed
    }
}
