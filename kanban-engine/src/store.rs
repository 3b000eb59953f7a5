//! Storage collaborators: board persistence and key/value settings
//!
//! The engine only talks to the [`BoardStore`] and [`SettingsStore`] traits.
//! Two board stores ship with the crate:
//!
//! - [`MemoryBoardStore`] keeps boards in a map, for tests and embedding
//! - [`FileBoardStore`] writes one `{id}.json` per board into a directory,
//!   using an exclusive lock file and temp-file + rename writes

use crate::error::{KanbanError, Result};
use crate::types::{Board, BoardId, BoardMetadata};
use chrono::Utc;
use fs2::FileExt;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace, warn};

/// Longest accepted board id
pub const MAX_BOARD_ID_LEN: usize = 128;

/// Persistence for whole boards, keyed by board id
pub trait BoardStore: Send + Sync {
    /// Metadata for every readable board
    fn list_boards(&self) -> Result<Vec<BoardMetadata>>;

    /// Load a board; `BoardNotFound` if it does not exist
    fn load_board(&self, id: &BoardId) -> Result<Board>;

    /// Create or replace a board
    fn save_board(&self, board: &Board) -> Result<()>;

    /// Remove a board; `BoardNotFound` if it does not exist
    fn delete_board(&self, id: &BoardId) -> Result<()>;

    /// The board as pretty-printed JSON
    fn export_board(&self, id: &BoardId) -> Result<String> {
        let board = self.load_board(id)?;
        Ok(serde_json::to_string_pretty(&board)?)
    }

    /// Change a stored board's title
    fn rename_board(&self, id: &BoardId, title: &str) -> Result<()> {
        let mut board = self.load_board(id)?;
        board.title = title.to_string();
        self.save_board(&board)
    }

    /// Copy a board under a fresh id and a non-conflicting title.
    ///
    /// `untitled` is used when the source board has a blank title.
    fn duplicate_board(&self, id: &BoardId, untitled: &str) -> Result<BoardId> {
        let mut board = self.load_board(id)?;
        let existing: HashSet<String> = self
            .list_boards()?
            .into_iter()
            .map(|m| m.title.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        board.title = duplicate_title(&board.title, &existing, untitled);
        board.id = BoardId::new();
        board.created_at = Utc::now();
        self.save_board(&board)?;
        Ok(board.id)
    }
}

/// Key/value text persistence for user preferences
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Check that an id is usable as a storage key: 1-128 of `[A-Za-z0-9_-]`
pub fn validate_board_id(id: &BoardId) -> Result<()> {
    let s = id.as_str();
    if s.is_empty() {
        return Err(KanbanError::invalid_id(s, "id is empty"));
    }
    if s.len() > MAX_BOARD_ID_LEN {
        return Err(KanbanError::invalid_id(
            s,
            format!("id is longer than {} characters", MAX_BOARD_ID_LEN),
        ));
    }
    if let Some(bad) = s
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(KanbanError::invalid_id(
            s,
            format!("character '{}' is not allowed", bad),
        ));
    }
    Ok(())
}

/// Title for a copy: the base title if free, else `"{base} (n)"` with the
/// smallest free n. A trailing `" (n)"` on the original is stripped first.
/// `existing` holds trimmed, lowercased titles.
pub fn duplicate_title(original: &str, existing: &HashSet<String>, untitled: &str) -> String {
    let mut base = strip_copy_suffix(original).to_string();
    if base.is_empty() {
        base = untitled.to_string();
    }
    if !existing.contains(&base.to_lowercase()) {
        return base;
    }
    let mut counter = 1;
    loop {
        let candidate = format!("{} ({})", base, counter);
        if !existing.contains(&candidate.to_lowercase()) {
            return candidate;
        }
        counter += 1;
    }
}

fn strip_copy_suffix(title: &str) -> &str {
    let trimmed = title.trim();
    let Some(body) = trimmed.strip_suffix(')') else {
        return trimmed;
    };
    let Some(start) = body.rfind(" (") else {
        return trimmed;
    };
    let digits = &body[start + 2..];
    if start == 0 || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return trimmed;
    }
    &trimmed[..start]
}

/// In-memory board store
#[derive(Debug, Default)]
pub struct MemoryBoardStore {
    boards: RwLock<HashMap<BoardId, Board>>,
}

impl MemoryBoardStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<BoardId, Board>> {
        self.boards.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<BoardId, Board>> {
        self.boards.write().unwrap_or_else(|p| p.into_inner())
    }

    /// Number of stored boards
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl BoardStore for MemoryBoardStore {
    fn list_boards(&self) -> Result<Vec<BoardMetadata>> {
        let mut boards: Vec<BoardMetadata> = self.read().values().map(Board::metadata).collect();
        boards.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        Ok(boards)
    }

    fn load_board(&self, id: &BoardId) -> Result<Board> {
        self.read()
            .get(id)
            .cloned()
            .ok_or_else(|| KanbanError::BoardNotFound { id: id.to_string() })
    }

    fn save_board(&self, board: &Board) -> Result<()> {
        validate_board_id(&board.id)?;
        self.write().insert(board.id.clone(), board.clone());
        Ok(())
    }

    fn delete_board(&self, id: &BoardId) -> Result<()> {
        self.write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| KanbanError::BoardNotFound { id: id.to_string() })
    }
}

/// Directory of `{id}.json` board files
#[derive(Debug, Clone)]
pub struct FileBoardStore {
    root: PathBuf,
}

/// RAII lock guard - releases on drop
struct StoreLock {
    file: fs::File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl FileBoardStore {
    /// Store boards under `root`; the directory is created on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a board file
    pub fn board_path(&self, id: &BoardId) -> Result<PathBuf> {
        validate_board_id(id)?;
        Ok(self.root.join(format!("{}.json", id)))
    }

    fn lock_path(&self) -> PathBuf {
        self.root.join(".boards.lock")
    }

    /// Try to acquire the exclusive writer lock (non-blocking)
    fn lock(&self) -> Result<StoreLock> {
        fs::create_dir_all(&self.root)?;
        let file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(self.lock_path())?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(StoreLock { file }),
            Err(_) => Err(KanbanError::LockBusy),
        }
    }

    fn read_board(path: &Path) -> Result<Board> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Atomic write via temp file and rename
fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

impl BoardStore for FileBoardStore {
    fn list_boards(&self) -> Result<Vec<BoardMetadata>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut boards = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_board(&path) {
                Ok(board) => boards.push(board.metadata()),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable board file"),
            }
        }
        boards.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        trace!(count = boards.len(), "listed boards");
        Ok(boards)
    }

    fn load_board(&self, id: &BoardId) -> Result<Board> {
        let path = self.board_path(id)?;
        if !path.exists() {
            return Err(KanbanError::BoardNotFound { id: id.to_string() });
        }
        let board = Self::read_board(&path)?;
        debug!(board = %id, "loaded board file");
        Ok(board)
    }

    fn save_board(&self, board: &Board) -> Result<()> {
        let path = self.board_path(&board.id)?;
        let json = serde_json::to_vec_pretty(board)?;
        let _lock = self.lock()?;
        atomic_write(&path, &json)?;
        debug!(board = %board.id, path = %path.display(), "saved board file");
        Ok(())
    }

    fn delete_board(&self, id: &BoardId) -> Result<()> {
        let path = self.board_path(id)?;
        if !path.exists() {
            return Err(KanbanError::BoardNotFound { id: id.to_string() });
        }
        let _lock = self.lock()?;
        fs::remove_file(&path)?;
        debug!(board = %id, "deleted board file");
        Ok(())
    }

    fn export_board(&self, id: &BoardId) -> Result<String> {
        let path = self.board_path(id)?;
        if !path.exists() {
            return Err(KanbanError::BoardNotFound { id: id.to_string() });
        }
        Ok(fs::read_to_string(path)?)
    }
}

/// In-memory settings store
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().unwrap_or_else(|p| p.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(|p| p.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(|p| p.into_inner());
        values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, Task};
    use tempfile::TempDir;

    fn sample_board(id: &str, title: &str) -> Board {
        let mut column = Column::new("Todo");
        column.tasks.push(Task::new("First"));
        Board::new(title).with_id(id).with_column(column)
    }

    #[test]
    fn test_validate_board_id() {
        assert!(validate_board_id(&BoardId::from_string("board_1-A")).is_ok());
        assert!(validate_board_id(&BoardId::new()).is_ok());
        for bad in ["", "../etc", "a b", "x.json"] {
            assert!(
                matches!(
                    validate_board_id(&BoardId::from_string(bad)),
                    Err(KanbanError::InvalidId { .. })
                ),
                "{:?} should be rejected",
                bad
            );
        }
        let long = "a".repeat(MAX_BOARD_ID_LEN + 1);
        assert!(validate_board_id(&BoardId::from_string(long)).is_err());
    }

    #[test]
    fn test_duplicate_title() {
        let existing: HashSet<String> = ["sprint", "sprint (1)"].iter().map(|s| s.to_string()).collect();
        assert_eq!(duplicate_title("Sprint", &existing, "Untitled Board"), "Sprint (2)");
        assert_eq!(duplicate_title("Sprint (1)", &existing, "Untitled Board"), "Sprint (2)");
        assert_eq!(duplicate_title("Roadmap", &existing, "Untitled Board"), "Roadmap");
        assert_eq!(duplicate_title("  ", &existing, "Untitled Board"), "Untitled Board");
        assert_eq!(duplicate_title("Q (a)", &existing, "Untitled Board"), "Q (a)");
    }

    #[test]
    fn test_memory_store_crud() {
        let store = MemoryBoardStore::new();
        let board = sample_board("b1", "Sprint");
        store.save_board(&board).unwrap();
        assert_eq!(store.load_board(&board.id).unwrap(), board);

        store.rename_board(&board.id, "Renamed").unwrap();
        assert_eq!(store.list_boards().unwrap()[0].title, "Renamed");

        let copy = store.duplicate_board(&board.id, "Untitled Board").unwrap();
        assert_ne!(copy, board.id);
        assert_eq!(store.load_board(&copy).unwrap().title, "Renamed (1)");
        assert_eq!(store.len(), 2);

        store.delete_board(&board.id).unwrap();
        assert!(matches!(
            store.load_board(&board.id),
            Err(KanbanError::BoardNotFound { .. })
        ));
        assert!(store.delete_board(&board.id).is_err());
    }

    #[test]
    fn test_file_store_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = FileBoardStore::new(temp.path().join("boards"));
        assert!(store.list_boards().unwrap().is_empty());

        let board = sample_board("b1", "Sprint");
        store.save_board(&board).unwrap();
        assert!(temp.path().join("boards/b1.json").exists());
        assert!(!temp.path().join("boards/b1.tmp").exists());

        let loaded = store.load_board(&board.id).unwrap();
        assert_eq!(loaded, board);

        let listed = store.list_boards().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].task_count, 1);

        let exported = store.export_board(&board.id).unwrap();
        assert!(exported.contains("\"Sprint\""));

        store.delete_board(&board.id).unwrap();
        assert!(store.list_boards().unwrap().is_empty());
    }

    #[test]
    fn test_file_store_skips_unreadable_files() {
        let temp = TempDir::new().unwrap();
        let store = FileBoardStore::new(temp.path());
        store.save_board(&sample_board("good", "Good")).unwrap();
        fs::write(temp.path().join("broken.json"), "{not json").unwrap();
        fs::write(temp.path().join("notes.txt"), "hello").unwrap();

        let listed = store.list_boards().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Good");
    }

    #[test]
    fn test_file_store_rejects_bad_ids() {
        let temp = TempDir::new().unwrap();
        let store = FileBoardStore::new(temp.path());
        let board = sample_board("../escape", "Bad");
        assert!(matches!(
            store.save_board(&board),
            Err(KanbanError::InvalidId { .. })
        ));
    }

    #[test]
    fn test_settings_store() {
        let store = MemorySettingsStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}
