//! The board engine
//!
//! [`KanbanEngine`] owns one [`Board`] and is the only way to change it. Every
//! mutation is a named operation that applies the change (through the command
//! history when it is undoable), recomputes derived state such as search
//! flags, and notifies observers.
//!
//! The engine is single-writer and never blocks. Timers belong to the caller,
//! which drives them through the `tick` handlers. Wrap it in
//! [`SharedEngine`](crate::SharedEngine) to share it across tasks.
//!
//! Operations are split by concern:
//!
//! - `moves`: guarded moves with WIP and blocked-task gates
//! - `archive`: archive column, unarchive, done aging
//! - `columns` / `lanes` / `tasks`: structural edits
//! - `selection`: selection flags and bulk operations
//! - `filter`: search text and filter criteria
//! - `persistence`: board and settings stores

mod archive;
mod columns;
mod filter;
mod lanes;
mod moves;
mod persistence;
mod selection;
mod tasks;

pub use moves::{DoneTimestampUpdate, WipContext};

use crate::clock::{Clock, SystemClock};
use crate::command::{Command, CommandHistory};
use crate::config::{EngineConfig, EngineSettings};
use crate::search::SearchState;
use crate::store::{BoardStore, SettingsStore};
use crate::strings::{BuiltinStrings, StringLookup};
use crate::types::{Board, BoardEvent, BoardObserver, CardMovingArgs};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, trace};

/// A transient message for the user, shown until it expires
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub expires_at: DateTime<Utc>,
}

/// Rules engine for a single board
pub struct KanbanEngine {
    board: Board,
    history: CommandHistory,
    config: EngineConfig,
    settings: EngineSettings,
    clock: Arc<dyn Clock>,
    strings: Arc<dyn StringLookup>,
    board_store: Option<Arc<dyn BoardStore>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    observers: Vec<Box<dyn BoardObserver>>,
    search: SearchState,
    status: Option<StatusMessage>,
    dirty: bool,
    last_done_aging: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for KanbanEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KanbanEngine")
            .field("board", &self.board.id)
            .field("config", &self.config)
            .field("undo_len", &self.history.undo_len())
            .field("observers", &self.observers.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl KanbanEngine {
    /// Take ownership of a board, repairing derived flags and work-item numbers
    pub fn new(mut board: Board) -> Self {
        board.refresh_column_flags();
        board.ensure_work_item_numbers();
        let config = EngineConfig::default();
        let mut engine = Self {
            board,
            history: CommandHistory::new(config.max_history),
            config,
            settings: EngineSettings::default(),
            clock: Arc::new(SystemClock),
            strings: Arc::new(BuiltinStrings),
            board_store: None,
            settings_store: None,
            observers: Vec::new(),
            search: SearchState::default(),
            status: None,
            dirty: false,
            last_done_aging: None,
        };
        engine.refresh_search();
        engine
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_strings(mut self, strings: impl StringLookup + 'static) -> Self {
        self.strings = Arc::new(strings);
        self
    }

    /// Apply operator configuration. Resizes the history; disabling undo
    /// clears it.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.set_config(config);
        self
    }

    pub fn with_board_store(mut self, store: Arc<dyn BoardStore>) -> Self {
        self.board_store = Some(store);
        self
    }

    pub fn with_settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    pub fn with_observer(mut self, observer: impl BoardObserver + 'static) -> Self {
        self.subscribe(observer);
        self
    }

    /// Register an observer for moving/moved and board events
    pub fn subscribe(&mut self, observer: impl BoardObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    /// True when the board changed since it was last loaded or saved
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn set_config(&mut self, config: EngineConfig) {
        self.history.set_max_size(config.max_history);
        if !config.enable_undo_redo {
            self.history.clear();
        }
        debug!(?config, "engine config applied");
        self.config = config;
    }

    /// Edit board-level properties (title, description, tags, ...).
    ///
    /// Derived column flags and search state are recomputed afterwards.
    pub fn update_board(&mut self, property: &str, edit: impl FnOnce(&mut Board)) {
        edit(&mut self.board);
        self.board.refresh_column_flags();
        self.board_changed(Some(property));
        self.refresh_search();
    }

    // ---- history ----

    pub fn can_undo(&self) -> bool {
        self.config.enable_undo_redo && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.config.enable_undo_redo && self.history.can_redo()
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn undo(&mut self) -> bool {
        if !self.config.enable_undo_redo || !self.history.undo(&mut self.board) {
            return false;
        }
        self.board_changed(Some("history"));
        self.refresh_search();
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.config.enable_undo_redo || !self.history.redo(&mut self.board) {
            return false;
        }
        self.board_changed(Some("history"));
        self.refresh_search();
        true
    }

    /// Turning undo/redo off clears the history; commands then apply directly
    pub fn set_undo_redo_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.history.clear();
        }
        self.config.enable_undo_redo = enabled;
        debug!(enabled, "undo/redo toggled");
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // ---- status message ----

    /// Show `text` for the configured number of seconds
    pub fn set_status_message(&mut self, text: impl Into<String>) {
        let text = text.into();
        let seconds = self.config.status_message_seconds.min(i32::MAX as u64) as i64;
        let expires_at = self.now() + Duration::seconds(seconds);
        debug!(message = %text, %expires_at, "status message");
        self.status = Some(StatusMessage {
            text: text.clone(),
            expires_at,
        });
        self.emit(BoardEvent::StatusMessage {
            message: Some(text),
        });
    }

    pub fn status_message(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn clear_status_message(&mut self) {
        if self.status.take().is_some() {
            self.emit(BoardEvent::StatusMessage { message: None });
        }
    }

    /// Expire the status message once its time is up. Returns true when it
    /// was cleared.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        match &self.status {
            Some(status) if status.expires_at <= now => {
                self.clear_status_message();
                true
            }
            _ => false,
        }
    }

    // ---- internals shared by the operation modules ----

    pub(crate) fn emit(&mut self, event: BoardEvent) {
        trace!(?event, "board event");
        for observer in &mut self.observers {
            observer.on_event(&event);
        }
    }

    /// Ask every observer about a pending move. Returns true if any canceled.
    pub(crate) fn notify_moving(&mut self, args: &mut CardMovingArgs) -> bool {
        for observer in &mut self.observers {
            observer.card_moving(args);
        }
        args.cancel
    }

    /// Apply a command, through the history when undo is enabled
    pub(crate) fn execute(&mut self, command: impl Into<Command>) {
        let mut command = command.into();
        if self.config.enable_undo_redo {
            self.history.execute(command, &mut self.board);
        } else {
            trace!(kind = command.kind(), task = %command.task_id(), "applying command directly");
            command.apply(&mut self.board);
        }
        self.dirty = true;
    }

    pub(crate) fn board_mut(&mut self) -> &mut Board {
        self.dirty = true;
        &mut self.board
    }

    pub(crate) fn board_changed(&mut self, property: Option<&str>) {
        self.dirty = true;
        self.emit(BoardEvent::BoardEdited {
            property: property.map(str::to_string),
        });
    }

    pub(crate) fn string(&self, key: &str, fallback: &str) -> String {
        self.strings.get_string(key, fallback)
    }
}
