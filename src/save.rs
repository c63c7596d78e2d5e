use crate::error::Result;
use crate::game_state::GameState;

use std::fs::{read_dir, remove_file};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Quiet period before a scheduled snapshot actually hits disk.
pub const DEBOUNCE_DELAY: Duration = Duration::from_secs(2);

pub fn default_save_dir() -> PathBuf {
    dir::home_dir()
        .expect("Failed to get home directory")
        .join("storyloom")
        .join("save")
}

/// Manages the on-disk story snapshots, one JSON file per user + book pair.
#[derive(Clone, Debug)]
pub struct SaveManager {
    save_dir: PathBuf,
    pub available_saves: Vec<String>,
}

impl Default for SaveManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SaveManager {
    pub fn new() -> Self {
        Self::with_dir(default_save_dir())
    }

    pub fn with_dir(save_dir: PathBuf) -> Self {
        let available_saves = Self::scan_save_files(&save_dir);
        Self {
            save_dir,
            available_saves,
        }
    }

    /// Key of the snapshot for one user reading one book.
    pub fn save_name_for(user_id: &str, book_id: &str) -> String {
        format!("{user_id}__{book_id}")
    }

    pub fn scan_save_files(save_dir: &Path) -> Vec<String> {
        let Ok(entries) = read_dir(save_dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if path.is_file() && path.extension()? == "json" {
                    path.file_stem()?.to_str().map(String::from)
                } else {
                    None
                }
            })
            .collect()
    }

    fn path_for(&self, save_name: &str) -> PathBuf {
        self.save_dir.join(format!("{save_name}.json"))
    }

    /// Load a snapshot; `None` when this user + book has no saved session.
    pub fn load(&self, save_name: &str) -> Result<Option<GameState>> {
        let path = self.path_for(save_name);
        if !path.exists() {
            return Ok(None);
        }
        GameState::load_from_file(&path).map(Some)
    }

    pub fn write(&self, state: &GameState) -> Result<()> {
        state.save_to_file(&self.path_for(&state.save_name))
    }

    pub fn delete_save(&mut self, save_name: &str) -> Result<()> {
        remove_file(self.path_for(save_name))?;
        self.available_saves = Self::scan_save_files(&self.save_dir);
        Ok(())
    }

    /// A debounced writer rooted at this manager's save directory.
    pub fn debouncer(&self) -> Debouncer {
        Debouncer::new(self.save_dir.clone(), DEBOUNCE_DELAY)
    }
}

/// Explicit debounced persistence: bursts of state changes collapse into a
/// single write after a quiet period. Scheduling a new write supersedes any
/// pending one; `flush` writes immediately on teardown.
///
/// Writes are fire-and-forget: a failure is logged and never rolls back the
/// in-memory state.
#[derive(Debug)]
pub struct Debouncer {
    save_dir: PathBuf,
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(save_dir: PathBuf, delay: Duration) -> Self {
        Self {
            save_dir,
            delay,
            pending: None,
        }
    }

    pub fn schedule(&mut self, state: GameState) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        let save_dir = self.save_dir.clone();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            write_snapshot(&save_dir, &state);
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn flush(&mut self, state: &GameState) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        write_snapshot(&self.save_dir, state);
    }

    pub fn has_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

fn write_snapshot(save_dir: &Path, state: &GameState) {
    let path = save_dir.join(format!("{}.json", state.save_name));
    if let Err(e) = state.save_to_file(&path) {
        log::error!("Failed to persist story session '{}': {e:#}", state.save_name);
    }
}
