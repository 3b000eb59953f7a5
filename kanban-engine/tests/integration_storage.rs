//! Integration tests for file-backed persistence through the engine

use std::sync::Arc;

use kanban_engine::{
    AddCardPlacement, Board, BoardEvent, BoardStore, Column, EngineSettings, EventRecorder,
    FileBoardStore, KanbanEngine, MemorySettingsStore, PersistenceOperation, SettingsStore, Task,
};
use tempfile::TempDir;

fn engine_with_store(dir: &TempDir) -> (KanbanEngine, Arc<FileBoardStore>, EventRecorder) {
    let store = Arc::new(FileBoardStore::new(dir.path().join("boards")));
    let recorder = EventRecorder::new();
    let mut engine = KanbanEngine::new(Board::new("Roadmap").with_id("roadmap"))
        .with_board_store(store.clone())
        .with_observer(recorder.clone());
    engine.create_default_board();
    (engine, store, recorder)
}

#[test_log::test]
fn test_file_store_round_trip_through_engine() {
    let temp = TempDir::new().unwrap();
    let (mut engine, store, recorder) = engine_with_store(&temp);

    let todo = engine.column_at(1).unwrap().id.clone();
    let id = engine.add_task(&todo, Task::new("Draft plan")).unwrap();
    let eng = engine.add_lane("Engineering");
    engine.set_task_lane(&id, Some(eng.clone()));
    assert!(engine.save_board());
    assert!(temp.path().join("boards").join("roadmap.json").exists());

    let mut reopened = KanbanEngine::new(Board::new("Empty")).with_board_store(store.clone());
    assert!(reopened.load_board(&"roadmap".into()));
    let task = reopened.find_task(&id).unwrap();
    assert_eq!(task.title, "Draft plan");
    assert_eq!(task.lane_id, Some(eng));
    assert_eq!(task.work_item_number, 1);
    assert_eq!(reopened.board().columns.len(), 4);
    assert!(reopened.board().done_column().is_some());

    assert_eq!(
        recorder.count(|e| matches!(e, BoardEvent::BoardSaved { .. })),
        1
    );
}

#[test_log::test]
fn test_missing_board_reports_failure_and_keeps_current() {
    let temp = TempDir::new().unwrap();
    let (mut engine, _, recorder) = engine_with_store(&temp);

    assert!(!engine.load_board(&"nope".into()));
    assert!(!engine.load_board(&"../escape".into()));
    assert_eq!(engine.board().title, "Roadmap");

    let failed: Vec<PersistenceOperation> = recorder
        .events()
        .into_iter()
        .filter_map(|e| match e {
            BoardEvent::PersistenceFailed { operation, .. } => Some(operation),
            _ => None,
        })
        .collect();
    assert_eq!(failed, vec![PersistenceOperation::LoadBoard; 2]);
}

#[test_log::test]
fn test_listing_duplicating_and_deleting() {
    let temp = TempDir::new().unwrap();
    let (mut engine, store, _) = engine_with_store(&temp);
    assert!(engine.save_board());

    let copy = engine.duplicate_board(&"roadmap".into()).unwrap();
    let copy_again = engine.duplicate_board(&"roadmap".into()).unwrap();
    let titles: Vec<String> = engine
        .list_boards()
        .unwrap()
        .into_iter()
        .map(|m| m.title)
        .collect();
    assert_eq!(titles, vec!["Roadmap", "Roadmap (1)", "Roadmap (2)"]);

    assert!(engine.delete_board(&copy));
    assert!(!engine.delete_board(&copy));
    assert_eq!(store.list_boards().unwrap().len(), 2);
    assert!(store.load_board(&copy_again).is_ok());
}

#[test_log::test]
fn test_settings_drive_placement_and_last_board() {
    let temp = TempDir::new().unwrap();
    let (engine, store, _) = engine_with_store(&temp);
    let settings_store = Arc::new(MemorySettingsStore::new());
    settings_store
        .set("kanban.settings.add_card_placement", "top")
        .unwrap();
    let mut engine = engine.with_settings_store(settings_store.clone());
    assert!(engine.load_settings());
    assert_eq!(engine.settings().add_card_placement, AddCardPlacement::Top);

    let backlog = engine.column_at(0).unwrap().id.clone();
    engine.add_task(&backlog, Task::new("first"));
    engine.add_task(&backlog, Task::new("second"));
    let titles: Vec<&str> = engine
        .tasks_for_column(&backlog)
        .iter()
        .map(|t| t.title.as_str())
        .collect();
    assert_eq!(titles, vec!["second", "first"]);

    assert!(engine.save_board());
    let saved = EngineSettings::load_from(settings_store.as_ref()).unwrap();
    assert_eq!(saved.last_board_id.as_ref().map(|id| id.as_str()), Some("roadmap"));

    let mut fresh = KanbanEngine::new(Board::new("Blank").with_column(Column::new("Only")))
        .with_board_store(store)
        .with_settings_store(settings_store);
    assert!(fresh.load_settings());
    assert!(fresh.load_last_board());
    assert_eq!(fresh.board().total_task_count(), 2);
}
