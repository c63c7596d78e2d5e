// Import necessary libraries and modules for file I/O and serialization.
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

// Define a structure to hold application settings with serialization and deserialization capabilities.
#[derive(Serialize, Deserialize, Clone)]
pub struct Settings {
    pub proxy_base_url: String, // OpenAI-compatible LLM proxy endpoint.
    pub api_key: Option<String>, // Optional API key forwarded to the proxy.
    pub model: String,          // Narrator model requested from the proxy.
    pub debug_mode: bool,       // Flag to enable or disable debug mode.
}

// Implement the Default trait for Settings to provide a method to create default settings.
impl Default for Settings {
    fn default() -> Self {
        Settings {
            proxy_base_url: "https://api.openai.com/v1".to_string(),
            api_key: None, // No API key by default.
            model: "gpt-4o-mini".to_string(),
            debug_mode: false, // Debug mode disabled by default.
        }
    }
}

// Additional implementation block for Settings.
impl Settings {
    // Constructor function to create new settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    fn default_path() -> PathBuf {
        dir::home_dir()
            .expect("Failed to get home directory")
            .join("storyloom")
            .join("settings.json")
    }

    // Load settings from the default file path.
    pub fn load() -> io::Result<Self> {
        Self::load_settings_from_file(&Self::default_path())
    }

    // Save current settings to the default file path.
    pub fn save(&self) -> io::Result<()> {
        self.save_to_file(&Self::default_path())
    }

    // Load settings from a specified file path.
    pub fn load_settings_from_file(path: &Path) -> io::Result<Self> {
        let data = fs::read_to_string(path)?; // Read settings from file.
        let settings = serde_json::from_str(&data)?; // Deserialize JSON data into settings.
        Ok(settings)
    }

    // Save current settings to a specified file path.
    pub fn save_to_file(&self, path: &Path) -> io::Result<()> {
        let data = serde_json::to_string_pretty(self)?; // Serialize settings into pretty JSON format.
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?; // Create the directory if it doesn't exist.
        }
        let mut file = fs::File::create(path)?; // Create or overwrite the file.
        file.write_all(data.as_bytes())?; // Write the serialized data to the file.
        Ok(())
    }
}
