use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::paths::Paths;
use crate::types::FeatureConfig;

/// Durable user configuration. Field names (camelCase on the wire) are the
/// settings-store keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub gemini_api_key: String,
    #[serde(default = "default_target_language")]
    pub target_language: String,
    #[serde(default)]
    pub show_meanings: bool,
    #[serde(default)]
    pub show_synonyms: bool,
    #[serde(default)]
    pub show_examples: bool,
    #[serde(default = "default_hotkeys_enabled")]
    pub hotkeys_enabled: bool,
    /// When set, selections only translate via the hotkey, never on mouse-up.
    #[serde(default)]
    pub hotkey_only: bool,
    #[serde(default = "default_hotkey_modifier")]
    pub hotkey_modifier: String,
    #[serde(default = "default_hotkey_key")]
    pub hotkey_key: String,
}

fn default_target_language() -> String {
    "English".to_string()
}

fn default_hotkeys_enabled() -> bool {
    true
}

fn default_hotkey_modifier() -> String {
    "alt".to_string()
}

fn default_hotkey_key() -> String {
    "t".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            target_language: default_target_language(),
            show_meanings: false,
            show_synonyms: false,
            show_examples: false,
            hotkeys_enabled: default_hotkeys_enabled(),
            hotkey_only: false,
            hotkey_modifier: default_hotkey_modifier(),
            hotkey_key: default_hotkey_key(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Field-wise overwrite: only fields present in the patch change, absent
    /// fields keep their current value. Last write wins; there is no
    /// rollback.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = &patch.gemini_api_key {
            self.gemini_api_key = v.clone();
        }
        if let Some(v) = &patch.target_language {
            self.target_language = v.clone();
        }
        if let Some(v) = patch.show_meanings {
            self.show_meanings = v;
        }
        if let Some(v) = patch.show_synonyms {
            self.show_synonyms = v;
        }
        if let Some(v) = patch.show_examples {
            self.show_examples = v;
        }
        if let Some(v) = patch.hotkeys_enabled {
            self.hotkeys_enabled = v;
        }
        if let Some(v) = patch.hotkey_only {
            self.hotkey_only = v;
        }
        if let Some(v) = &patch.hotkey_modifier {
            self.hotkey_modifier = v.clone();
        }
        if let Some(v) = &patch.hotkey_key {
            self.hotkey_key = v.clone();
        }
    }

    pub fn features(&self) -> FeatureConfig {
        FeatureConfig {
            meanings: self.show_meanings,
            synonyms: self.show_synonyms,
            examples: self.show_examples,
        }
    }

    pub fn has_credential(&self) -> bool {
        !self.gemini_api_key.trim().is_empty()
    }
}

/// Partial settings update as sent by the preferences surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_meanings: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_synonyms: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_examples: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkeys_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey_modifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey_key: Option<String>,
}

/// The durable key-value store both agents read from. The preferences
/// surface writes to it and broadcasts updates separately.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> Result<Settings>;
    async fn save(&self, settings: &Settings) -> Result<()>;
}

/// Settings persisted as a JSON file under the lingopane home directory.
pub struct JsonFileStore {
    paths: Paths,
}

impl JsonFileStore {
    pub fn new(paths: Paths) -> Self {
        Self { paths }
    }
}

#[async_trait]
impl SettingsStore for JsonFileStore {
    async fn load(&self) -> Result<Settings> {
        let path = self.paths.settings_file();
        if path.exists() {
            Settings::load(&path)
        } else {
            Ok(Settings::default())
        }
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        settings.save(&self.paths.settings_file())
    }
}

/// In-memory store for tests and in-process runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Settings>,
}

impl MemoryStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn load(&self) -> Result<Settings> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        *self.inner.write().await = settings.clone();
        Ok(())
    }
}
