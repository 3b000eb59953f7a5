//! Search and filter predicates
//!
//! A task's `is_search_match` flag is computed from either a structured
//! [`FilterCriteria`] (when any of its filters is active) or the legacy
//! free-text search. Tasks in the archive column only match while the search
//! text is blank, and archived tasks sitting anywhere else never match.

use crate::types::{Column, ColumnId, Priority, Task};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Inclusive calendar-date range; either end may be open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// True if either end is set
    pub fn has_value(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// A missing date is never in range
    pub fn contains(&self, date: Option<DateTime<Utc>>) -> bool {
        let Some(date) = date.map(|d| d.date_naive()) else {
            return false;
        };
        if matches!(self.from, Some(from) if date < from) {
            return false;
        }
        if matches!(self.to, Some(to) if date > to) {
            return false;
        }
        true
    }
}

/// Structured filter. Every active filter must pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    /// Case-insensitive substring; a positive integer also matches the work-item number
    pub text_query: Option<String>,
    pub match_title: bool,
    pub match_description: bool,
    pub match_tags: bool,
    pub match_assignee: bool,
    pub priorities: Vec<Priority>,
    pub show_only_overdue: bool,
    pub show_only_blocked: bool,
    pub planned_start_range: Option<DateRange>,
    pub planned_end_range: Option<DateRange>,
    /// Matches the task's assignee id, or its assignee name ignoring case
    pub assignee_ids: Vec<String>,
    pub included_column_ids: Vec<ColumnId>,
    pub exclude_archive: bool,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            text_query: None,
            match_title: true,
            match_description: true,
            match_tags: true,
            match_assignee: true,
            priorities: Vec::new(),
            show_only_overdue: false,
            show_only_blocked: false,
            planned_start_range: None,
            planned_end_range: None,
            assignee_ids: Vec::new(),
            included_column_ids: Vec::new(),
            exclude_archive: true,
        }
    }
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_query = Some(text.into());
        self
    }

    pub fn with_priorities(mut self, priorities: impl IntoIterator<Item = Priority>) -> Self {
        self.priorities = priorities.into_iter().collect();
        self
    }

    pub fn only_overdue(mut self) -> Self {
        self.show_only_overdue = true;
        self
    }

    pub fn only_blocked(mut self) -> Self {
        self.show_only_blocked = true;
        self
    }

    pub fn with_planned_start_range(mut self, range: DateRange) -> Self {
        self.planned_start_range = Some(range);
        self
    }

    pub fn with_planned_end_range(mut self, range: DateRange) -> Self {
        self.planned_end_range = Some(range);
        self
    }

    pub fn with_assignee_ids(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.assignee_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_included_columns(mut self, ids: impl IntoIterator<Item = ColumnId>) -> Self {
        self.included_column_ids = ids.into_iter().collect();
        self
    }

    /// True if any filter is active. The per-field text toggles and
    /// `exclude_archive` alone do not count.
    pub fn has_any_filter(&self) -> bool {
        self.text_query.as_deref().is_some_and(|t| !t.trim().is_empty())
            || !self.priorities.is_empty()
            || self.show_only_overdue
            || self.show_only_blocked
            || self.planned_start_range.is_some_and(|r| r.has_value())
            || self.planned_end_range.is_some_and(|r| r.has_value())
            || !self.included_column_ids.is_empty()
            || !self.assignee_ids.is_empty()
    }

    /// Reset every filter to its default
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether a column is shown under this filter
    pub fn is_column_included(&self, column: &Column) -> bool {
        if self.exclude_archive && column.is_archive_column {
            return false;
        }
        if !self.included_column_ids.is_empty() {
            return self.included_column_ids.contains(&column.id);
        }
        true
    }

    /// Whether a task passes every active filter
    pub fn matches(&self, task: &Task, now: DateTime<Utc>) -> bool {
        if !self.has_any_filter() {
            return true;
        }

        if let Some(query) = self
            .text_query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
        {
            if !self.matches_text_query(task, query) {
                return false;
            }
        }

        if !self.priorities.is_empty() && !self.priorities.contains(&task.priority) {
            return false;
        }
        if self.show_only_overdue && !task.is_overdue(now) {
            return false;
        }
        if self.show_only_blocked && !task.is_blocked {
            return false;
        }
        if let Some(range) = self.planned_start_range.filter(DateRange::has_value) {
            if !range.contains(task.planned_start) {
                return false;
            }
        }
        if let Some(range) = self.planned_end_range.filter(DateRange::has_value) {
            if !range.contains(task.planned_end) {
                return false;
            }
        }
        if !self.assignee_ids.is_empty() && !self.matches_assignee(task) {
            return false;
        }
        true
    }

    fn matches_text_query(&self, task: &Task, query: &str) -> bool {
        if let Ok(number) = query.parse::<u32>() {
            if number > 0 && task.work_item_number == number {
                return true;
            }
        }
        let needle = query.to_lowercase();
        (self.match_title && contains_ignore_case(&task.title, &needle))
            || (self.match_description && contains_ignore_case(&task.description, &needle))
            || (self.match_tags && contains_ignore_case_opt(task.tags.as_deref(), &needle))
            || (self.match_assignee && contains_ignore_case_opt(task.assignee.as_deref(), &needle))
    }

    fn matches_assignee(&self, task: &Task) -> bool {
        if let Some(id) = task.assignee_id.as_deref().filter(|s| !s.trim().is_empty()) {
            if self.assignee_ids.iter().any(|a| a == id) {
                return true;
            }
        }
        match task.assignee.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => self
                .assignee_ids
                .iter()
                .any(|a| a.trim().eq_ignore_ascii_case(name)),
            None => false,
        }
    }
}

fn contains_ignore_case(haystack: &str, lowered_needle: &str) -> bool {
    !haystack.trim().is_empty() && haystack.to_lowercase().contains(lowered_needle)
}

fn contains_ignore_case_opt(haystack: Option<&str>, lowered_needle: &str) -> bool {
    haystack.is_some_and(|h| contains_ignore_case(h, lowered_needle))
}

/// Legacy free-text match: blank text matches everything; otherwise a
/// case-insensitive substring of title, description, tags, or assignee.
pub fn matches_text(task: &Task, text: &str) -> bool {
    let filter = text.trim();
    if filter.is_empty() {
        return true;
    }
    let needle = filter.to_lowercase();
    contains_ignore_case(&task.title, &needle)
        || contains_ignore_case(&task.description, &needle)
        || contains_ignore_case_opt(task.tags.as_deref(), &needle)
        || contains_ignore_case_opt(task.assignee.as_deref(), &needle)
}

/// Active search: free text plus optional structured criteria
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub text: String,
    pub criteria: Option<FilterCriteria>,
}

impl SearchState {
    /// Compute a task's match flag given where it sits
    pub fn is_match(&self, task: &Task, in_archive_column: bool, now: DateTime<Utc>) -> bool {
        if in_archive_column {
            return self.text.trim().is_empty();
        }
        if task.is_archived {
            return false;
        }
        match &self.criteria {
            Some(criteria) if criteria.has_any_filter() => criteria.matches(task, now),
            _ => matches_text(task, &self.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn task() -> Task {
        let mut task = Task::new("Fix login bug")
            .with_description("Users cannot sign in")
            .with_tags("auth, backend")
            .with_assignee("Alice");
        task.work_item_number = 42;
        task
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_legacy_text_matching() {
        let t = task();
        assert!(matches_text(&t, ""));
        assert!(matches_text(&t, "   "));
        assert!(matches_text(&t, "LOGIN"));
        assert!(matches_text(&t, " sign in "));
        assert!(matches_text(&t, "backend"));
        assert!(matches_text(&t, "alice"));
        assert!(!matches_text(&t, "frontend"));
    }

    #[test]
    fn test_archive_rules() {
        let now = Utc::now();
        let mut t = task();
        let mut search = SearchState::default();
        assert!(search.is_match(&t, true, now));

        search.text = "login".into();
        assert!(!search.is_match(&t, true, now));
        assert!(search.is_match(&t, false, now));

        t.is_archived = true;
        search.text.clear();
        assert!(!search.is_match(&t, false, now));
        assert!(search.is_match(&t, true, now));
    }

    #[test]
    fn test_criteria_text_toggles_and_work_item_number() {
        let now = Utc::now();
        let t = task();
        let mut criteria = FilterCriteria::new().with_text("alice");
        assert!(criteria.matches(&t, now));
        criteria.match_assignee = false;
        assert!(!criteria.matches(&t, now));

        assert!(FilterCriteria::new().with_text("42").matches(&t, now));
        assert!(!FilterCriteria::new().with_text("43").matches(&t, now));
    }

    #[test]
    fn test_criteria_filters_combine() {
        let now = Utc::now();
        let mut t = task().with_priority(Priority::High);
        let criteria = FilterCriteria::new().with_priorities([Priority::High, Priority::Urgent]);
        assert!(criteria.matches(&t, now));

        let blocked = criteria.clone().only_blocked();
        assert!(!blocked.matches(&t, now));
        t.is_blocked = true;
        assert!(blocked.matches(&t, now));

        let overdue = FilterCriteria::new().only_overdue();
        assert!(!overdue.matches(&t, now));
        t.planned_end = Some(now - Duration::days(1));
        assert!(overdue.matches(&t, now));
    }

    #[test]
    fn test_date_range_is_inclusive_by_calendar_date() {
        let range = DateRange::new(Some(date(2024, 3, 1)), Some(date(2024, 3, 31)));
        let late_on_last_day = Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 0).unwrap();
        let first_of_april = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        assert!(range.contains(Some(late_on_last_day)));
        assert!(!range.contains(Some(first_of_april)));
        assert!(!range.contains(None));

        let mut t = task();
        let criteria = FilterCriteria::new().with_planned_end_range(range);
        assert!(!criteria.matches(&t, late_on_last_day));
        t.planned_end = Some(late_on_last_day);
        assert!(criteria.matches(&t, late_on_last_day));
    }

    #[test]
    fn test_assignee_filter() {
        let now = Utc::now();
        let mut t = task();
        assert!(FilterCriteria::new().with_assignee_ids(["alice"]).matches(&t, now));
        assert!(!FilterCriteria::new().with_assignee_ids(["bob"]).matches(&t, now));
        t.assignee_id = Some("u-7".into());
        assert!(FilterCriteria::new().with_assignee_ids(["u-7"]).matches(&t, now));
    }

    #[test]
    fn test_has_any_filter_and_clear() {
        let mut criteria = FilterCriteria::new();
        assert!(!criteria.has_any_filter());
        criteria.match_title = false;
        criteria.text_query = Some("  ".into());
        assert!(!criteria.has_any_filter());
        criteria.planned_start_range = Some(DateRange::default());
        assert!(!criteria.has_any_filter());
        criteria.show_only_blocked = true;
        assert!(criteria.has_any_filter());
        criteria.clear();
        assert_eq!(criteria, FilterCriteria::default());
    }

    #[test]
    fn test_column_inclusion() {
        let mut archive = Column::new("Archive").with_id("archive");
        archive.is_archive_column = true;
        let todo = Column::new("Todo").with_id("todo");

        let mut criteria = FilterCriteria::new();
        assert!(!criteria.is_column_included(&archive));
        assert!(criteria.is_column_included(&todo));

        criteria.exclude_archive = false;
        assert!(criteria.is_column_included(&archive));

        criteria = criteria.with_included_columns([ColumnId::from_string("archive")]);
        assert!(!criteria.is_column_included(&todo));
        assert!(criteria.is_column_included(&archive));
    }

    #[test]
    fn test_criteria_take_precedence_over_text() {
        let now = Utc::now();
        let t = task();
        let search = SearchState {
            text: "nothing like this".into(),
            criteria: Some(FilterCriteria::new().with_text("login")),
        };
        assert!(search.is_match(&t, false, now));

        let inactive = SearchState {
            text: "nothing like this".into(),
            criteria: Some(FilterCriteria::new()),
        };
        assert!(!inactive.is_match(&t, false, now));
    }
}
