use crate::discovery::DiscoveryLedger;
use crate::error::Result;
use crate::message::Message;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The persisted snapshot of an in-progress story, keyed by user + book.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GameState {
    pub save_name: String,
    #[serde(default)]
    pub message_history: Vec<Message>,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub inventory: Vec<String>,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub discoveries: DiscoveryLedger,
}

impl GameState {
    pub fn new(save_name: impl Into<String>) -> Self {
        GameState {
            save_name: save_name.into(),
            message_history: Vec::new(),
            progress: 0,
            inventory: Vec::new(),
            achievements: Vec::new(),
            discoveries: DiscoveryLedger::default(),
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let game_state: GameState = serde_json::from_reader(file)?;
        Ok(game_state)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Apply a progress delta. Progress is monotone: it never drops below
    /// its prior value and never exceeds 100.
    pub fn apply_progress(&mut self, delta: i64) -> u8 {
        let gain = delta.clamp(0, 100) as u8;
        self.progress = self.progress.saturating_add(gain).min(100);
        self.progress
    }

    /// Idempotent insertion-ordered add; returns whether the set changed.
    pub fn add_item(&mut self, item: &str) -> bool {
        if self.inventory.iter().any(|i| i == item) {
            return false;
        }
        self.inventory.push(item.to_string());
        true
    }

    /// Idempotent remove; removing an absent item is a no-op.
    pub fn remove_item(&mut self, item: &str) -> bool {
        let before = self.inventory.len();
        self.inventory.retain(|i| i != item);
        self.inventory.len() != before
    }

    /// Idempotent achievement unlock; returns true only the first time.
    pub fn unlock_achievement(&mut self, title: &str) -> bool {
        if self.achievements.iter().any(|a| a == title) {
            return false;
        }
        self.achievements.push(title.to_string());
        true
    }
}
