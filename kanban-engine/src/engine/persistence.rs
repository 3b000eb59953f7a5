//! Board and settings persistence through the configured stores
//!
//! Failures never propagate out of these operations. They are logged,
//! reported as [`BoardEvent::PersistenceFailed`], and the call returns
//! `false` / `None`. A failed load leaves the current board in place.

use super::KanbanEngine;
use crate::config::EngineSettings;
use crate::error::{KanbanError, Result};
use crate::store::{BoardStore, SettingsStore};
use crate::strings::KEY_BOARD_UNTITLED;
use crate::types::{
    Board, BoardEvent, BoardId, BoardMetadata, PersistenceOperation, MAX_AUTO_ARCHIVE_DAYS,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

impl KanbanEngine {
    /// Save the current board. Clears the dirty flag.
    pub fn save_board(&mut self) -> bool {
        let result = self
            .require_board_store()
            .and_then(|store| store.save_board(&self.board));
        if self.report(PersistenceOperation::SaveBoard, result).is_none() {
            return false;
        }
        let board_id = self.board.id.clone();
        info!(board = %board_id, "saved board");
        self.dirty = false;
        self.remember_board(&board_id);
        self.emit(BoardEvent::BoardSaved { board_id });
        true
    }

    /// Replace the current board with a stored one
    pub fn load_board(&mut self, id: &BoardId) -> bool {
        let result = self
            .require_board_store()
            .and_then(|store| store.load_board(id));
        let Some(board) = self.report(PersistenceOperation::LoadBoard, result) else {
            return false;
        };
        info!(board = %id, title = %board.title, "loaded board");
        self.set_board(board);
        self.remember_board(id);
        self.emit(BoardEvent::BoardLoaded {
            board_id: id.clone(),
        });
        true
    }

    /// Load the board recorded as last opened, if any
    pub fn load_last_board(&mut self) -> bool {
        match self.settings.last_board_id.clone() {
            Some(id) => self.load_board(&id),
            None => false,
        }
    }

    /// Swap in a board. Work-item numbers and done timestamps are repaired,
    /// aging runs if configured, then history is cleared.
    pub fn set_board(&mut self, mut board: Board) {
        board.refresh_column_flags();
        board.auto_archive_done_days = board.auto_archive_done_days.min(MAX_AUTO_ARCHIVE_DAYS);
        let renumbered = board.ensure_work_item_numbers();
        if renumbered > 0 {
            debug!(renumbered, "repaired work-item numbers");
        }
        self.board = board;
        let stamped = self.sync_done_column_timestamps();
        let archived = self.done_config_changed();
        self.history.clear();
        self.board_changed(None);
        self.refresh_search();
        self.dirty = renumbered + stamped + archived > 0;
    }

    pub fn list_boards(&mut self) -> Option<Vec<BoardMetadata>> {
        let result = self
            .require_board_store()
            .and_then(|store| store.list_boards());
        self.report(PersistenceOperation::ListBoards, result)
    }

    /// Rename a stored board. The open board is renamed too when it matches.
    pub fn rename_board(&mut self, id: &BoardId, title: &str) -> bool {
        let result = self
            .require_board_store()
            .and_then(|store| store.rename_board(id, title));
        if self.report(PersistenceOperation::RenameBoard, result).is_none() {
            return false;
        }
        if &self.board.id == id {
            self.board.title = title.to_string();
            self.emit(BoardEvent::BoardEdited {
                property: Some("title".into()),
            });
        }
        true
    }

    /// Delete a stored board, forgetting it as the last opened board
    pub fn delete_board(&mut self, id: &BoardId) -> bool {
        let result = self
            .require_board_store()
            .and_then(|store| store.delete_board(id));
        if self.report(PersistenceOperation::DeleteBoard, result).is_none() {
            return false;
        }
        info!(board = %id, "deleted board");
        if self.settings.last_board_id.as_ref() == Some(id) {
            self.settings.last_board_id = None;
            if self.settings_store.is_some() {
                self.save_settings();
            }
        }
        true
    }

    /// Copy a stored board under a fresh id and a non-conflicting title
    pub fn duplicate_board(&mut self, id: &BoardId) -> Option<BoardId> {
        let untitled = self.string(KEY_BOARD_UNTITLED, "Untitled Board");
        let result = self
            .require_board_store()
            .and_then(|store| store.duplicate_board(id, &untitled));
        self.report(PersistenceOperation::DuplicateBoard, result)
    }

    /// A stored board as pretty JSON
    pub fn export_board(&mut self, id: &BoardId) -> Option<String> {
        let result = self
            .require_board_store()
            .and_then(|store| store.export_board(id));
        self.report(PersistenceOperation::ExportBoard, result)
    }

    /// The open board as pretty JSON
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.board)?)
    }

    /// Replace the open board with one parsed from JSON
    pub fn import_json(&mut self, json: &str) -> bool {
        let result = serde_json::from_str::<Board>(json).map_err(KanbanError::from);
        let Some(board) = self.report(PersistenceOperation::LoadBoard, result) else {
            return false;
        };
        let board_id = board.id.clone();
        self.set_board(board);
        self.emit(BoardEvent::BoardLoaded { board_id });
        true
    }

    /// Write the current settings to the settings store
    pub fn save_settings(&mut self) -> bool {
        let result = self
            .require_settings_store()
            .and_then(|store| self.settings.save_to(store.as_ref()));
        self.report(PersistenceOperation::SaveSettings, result).is_some()
    }

    /// Read settings from the settings store, replacing the current ones
    pub fn load_settings(&mut self) -> bool {
        let result = self
            .require_settings_store()
            .and_then(|store| EngineSettings::load_from(store.as_ref()));
        match self.report(PersistenceOperation::LoadSettings, result) {
            Some(settings) => {
                self.apply_settings(settings);
                true
            }
            None => false,
        }
    }

    pub fn apply_settings(&mut self, settings: EngineSettings) {
        debug!(?settings, "settings applied");
        self.settings = settings;
    }

    /// Save when the board is dirty and auto-save is on. Returns true if a
    /// save happened.
    pub fn on_auto_save_tick(&mut self) -> bool {
        if !self.dirty || !self.settings.auto_save_after_edits || self.board_store.is_none() {
            return false;
        }
        self.save_board()
    }

    fn remember_board(&mut self, id: &BoardId) {
        if self.settings.last_board_id.as_ref() == Some(id) {
            return;
        }
        self.settings.last_board_id = Some(id.clone());
        if self.settings_store.is_some() {
            self.save_settings();
        }
    }

    fn require_board_store(&self) -> Result<Arc<dyn BoardStore>> {
        self.board_store
            .clone()
            .ok_or_else(|| KanbanError::store_unavailable("board store"))
    }

    fn require_settings_store(&self) -> Result<Arc<dyn SettingsStore>> {
        self.settings_store
            .clone()
            .ok_or_else(|| KanbanError::store_unavailable("settings store"))
    }

    fn report<T>(&mut self, operation: PersistenceOperation, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%operation, error = %err, "persistence failed");
                self.emit(BoardEvent::PersistenceFailed {
                    operation,
                    error: err.to_string(),
                });
                None
            }
        }
    }
}
