//! Local application settings.
//!
//! One JSON blob per user: the last opened project, AI credentials and
//! model choice, proxy, context window bound, and preferred window
//! geometry for the GUI shell. Like the project manifest, the blob is
//! rewritten whole on every change and a missing or corrupt file reads as
//! the defaults.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Preferred main-window geometry, persisted on behalf of the GUI shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 700,
        }
    }
}

/// Persisted application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root directory of the project reopened on launch.
    pub last_opened_project: Option<PathBuf>,
    /// Credential for the text-generation service.
    pub api_key: Option<String>,
    /// Proxy URL for outbound AI calls, e.g. `http://127.0.0.1:7897`.
    /// Empty means a direct connection.
    pub proxy_url: String,
    /// Generative model name passed through to the gateway.
    pub model: String,
    /// Upper bound on chapter summaries injected into the story context.
    pub max_history_chapters: usize,
    pub window: WindowSize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            last_opened_project: None,
            api_key: None,
            proxy_url: String::new(),
            model: "gemini-2.5-flash".to_string(),
            max_history_chapters: 20,
            window: WindowSize::default(),
        }
    }
}

/// Handle on the settings file, cheaply cloneable across handlers.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    current: Arc<Mutex<AppConfig>>,
}

impl ConfigStore {
    /// Open the store at an explicit path, reading the current settings
    /// once. Missing or corrupt settings fall back to defaults.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = load_from(&path);
        Self {
            path,
            current: Arc::new(Mutex::new(current)),
        }
    }

    /// Open the store at the platform config location.
    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "inkstone")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(Self::open(dirs.config_dir().join("config.json")))
    }

    pub fn get(&self) -> AppConfig {
        self.current.lock().expect("config lock poisoned").clone()
    }

    /// Replace and persist the whole settings blob.
    pub fn set(&self, config: AppConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&config)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        *self.current.lock().expect("config lock poisoned") = config;
        Ok(())
    }

    /// Apply an in-place edit and persist, returning the new settings.
    pub fn update(&self, apply: impl FnOnce(&mut AppConfig)) -> Result<AppConfig> {
        let mut config = self.get();
        apply(&mut config);
        self.set(config.clone())?;
        Ok(config)
    }
}

fn load_from(path: &Path) -> AppConfig {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}
