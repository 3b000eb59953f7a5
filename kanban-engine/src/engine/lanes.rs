//! Swimlanes and lane grouping

use super::KanbanEngine;
use crate::types::{lane_keys_match, BoardEvent, GroupBy, Lane, LaneId, Task, TaskId};
use tracing::debug;

impl KanbanEngine {
    pub fn add_lane(&mut self, title: impl Into<String>) -> LaneId {
        let index = self.board.lanes.len();
        self.insert_lane(title, index)
    }

    /// Insert a lane at `index` (clamped)
    pub fn insert_lane(&mut self, title: impl Into<String>, index: usize) -> LaneId {
        let lane = Lane::new(title);
        let id = lane.id.clone();
        let index = index.min(self.board.lanes.len());
        self.board_mut().lanes.insert(index, lane);
        self.board_changed(Some("lanes"));
        id
    }

    /// Remove a lane. Its tasks move to `fallback`, or become unassigned.
    pub fn remove_lane(&mut self, id: &LaneId, fallback: Option<&LaneId>) -> bool {
        let Some(index) = self.board.lane_index(id) else {
            return false;
        };
        let board = self.board_mut();
        board.lanes.remove(index);
        let mut reassigned = 0;
        for task in board.all_tasks_mut() {
            if lane_keys_match(task.lane_str(), Some(id.as_str())) {
                task.lane_id = fallback.cloned();
                reassigned += 1;
            }
        }
        debug!(lane = %id, reassigned, "removed lane");
        self.board_changed(Some("lanes"));
        true
    }

    pub fn remove_lane_at(&mut self, index: usize) -> bool {
        match self.board.lanes.get(index).map(|l| l.id.clone()) {
            Some(id) => self.remove_lane(&id, None),
            None => false,
        }
    }

    pub fn find_lane_by_title(&self, title: &str) -> Option<&Lane> {
        self.board.lanes.iter().find(|l| l.title == title)
    }

    pub fn lane_at(&self, index: usize) -> Option<&Lane> {
        self.board.lanes.get(index)
    }

    pub fn move_lane(&mut self, id: &LaneId, new_index: usize) -> bool {
        let Some(current) = self.board.lane_index(id) else {
            return false;
        };
        let new_index = new_index.min(self.board.lanes.len() - 1);
        if current != new_index {
            let lanes = &mut self.board_mut().lanes;
            let lane = lanes.remove(current);
            lanes.insert(new_index, lane);
            self.board_changed(Some("lanes"));
        }
        true
    }

    pub fn rename_lane(&mut self, id: &LaneId, title: impl Into<String>) -> bool {
        let title = title.into();
        let Some(lane) = self.board.lanes.iter_mut().find(|l| &l.id == id) else {
            return false;
        };
        lane.title = title;
        self.board_changed(Some("lanes"));
        true
    }

    /// Remove every lane. Task lane ids are left as they are.
    pub fn clear_lanes(&mut self) {
        self.board_mut().lanes.clear();
        self.board_changed(Some("lanes"));
    }

    pub fn tasks_for_lane(&self, id: &LaneId) -> Vec<&Task> {
        self.board
            .all_tasks()
            .filter(|t| lane_keys_match(t.lane_str(), Some(id.as_str())))
            .collect()
    }

    /// Assign a task to a lane, or clear its lane with `None`
    pub fn set_task_lane(&mut self, task_id: &TaskId, lane_id: Option<LaneId>) -> bool {
        let Some(task) = self.board.task_mut(task_id) else {
            return false;
        };
        if task.lane_id != lane_id {
            task.lane_id = lane_id;
            self.dirty = true;
            self.emit(BoardEvent::CardEdited {
                task_id: task_id.clone(),
            });
        }
        true
    }

    pub fn group_by(&self) -> GroupBy {
        self.board.group_by
    }

    /// Change the grouping mode. Raises `LaneGroupingChanged` when it differs.
    pub fn set_group_by(&mut self, group_by: GroupBy) -> bool {
        if self.board.group_by == group_by {
            return false;
        }
        self.board_mut().group_by = group_by;
        self.emit(BoardEvent::LaneGroupingChanged { group_by });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn lane_titles(engine: &KanbanEngine) -> Vec<&str> {
        engine.board().lanes.iter().map(|l| l.title.as_str()).collect()
    }

    #[test]
    fn test_lane_structure() {
        let (mut engine, _, _) = engine([0, 0, 0]);
        let eng = engine.add_lane("Engineering");
        engine.add_lane("Ops");
        engine.insert_lane("Design", 0);
        assert_eq!(lane_titles(&engine), vec!["Design", "Engineering", "Ops"]);

        assert!(engine.move_lane(&eng, 5));
        assert_eq!(lane_titles(&engine), vec!["Design", "Ops", "Engineering"]);
        assert!(engine.rename_lane(&eng, "Eng"));
        assert_eq!(engine.find_lane_by_title("Eng").map(|l| l.id.clone()), Some(eng));
        assert_eq!(engine.lane_at(0).map(|l| l.title.as_str()), Some("Design"));

        assert!(engine.remove_lane_at(0));
        assert!(!engine.remove_lane_at(5));
        engine.clear_lanes();
        assert!(engine.board().lanes.is_empty());
    }

    #[test]
    fn test_remove_lane_reassigns_tasks() {
        let (mut engine, _, _) = engine([2, 1, 0]);
        let eng = engine.add_lane("Engineering");
        let ops = engine.add_lane("Ops");
        engine.set_task_lane(&tid("backlog-0"), Some(eng.clone()));
        engine.set_task_lane(&tid("doing-0"), Some(eng.clone()));
        assert_eq!(engine.tasks_for_lane(&eng).len(), 2);

        assert!(engine.remove_lane(&eng, Some(&ops)));
        assert_eq!(engine.tasks_for_lane(&ops).len(), 2);

        assert!(engine.remove_lane(&ops, None));
        assert!(engine.board().all_tasks().all(|t| t.lane_id.is_none()));
        assert!(!engine.remove_lane(&ops, None));
    }

    #[test]
    fn test_remove_lane_matches_padded_lane_ids() {
        let (mut engine, _, _) = engine([2, 0, 0]);
        let eng = engine.add_lane("Engineering");
        let padded = LaneId::from_string(format!(" {} ", eng));
        engine.set_task_lane(&tid("backlog-0"), Some(padded));
        engine.set_task_lane(&tid("backlog-1"), Some(eng.clone()));
        assert_eq!(engine.tasks_for_lane(&eng).len(), 2);

        assert!(engine.remove_lane(&eng, None));
        assert!(engine.board().all_tasks().all(|t| t.lane_id.is_none()));
    }

    #[test]
    fn test_group_by_change_raises_event_once() {
        let (mut engine, _, recorder) = engine([0, 0, 0]);
        assert!(engine.set_group_by(GroupBy::Lane));
        assert!(!engine.set_group_by(GroupBy::Lane));
        assert_eq!(
            recorder.count(|e| matches!(e, BoardEvent::LaneGroupingChanged { group_by: GroupBy::Lane })),
            1
        );
        assert_eq!(engine.group_by(), GroupBy::Lane);
    }
}
