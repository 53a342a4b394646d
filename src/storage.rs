// Filesystem-backed plugin settings
// Stored as Markdown with a YAML frontmatter header, like the host's notes

use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{ExplorerError, Result};
use crate::models::{BlockSettings, PluginSettings};
use crate::schema::{coerce_block_settings, normalize_plugin_settings};

const SETTINGS_BODY: &str = "# Folder Explorer\n\nDefault settings for explorer blocks.\n";

// ============================================
// PATH HELPERS
// ============================================

/// Global config directory (<config dir>/folder-explorer/)
pub fn global_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("folder-explorer"))
        .ok_or_else(|| ExplorerError::NotFound("config directory".to_string()))
}

/// Settings file inside a config directory
pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join("config.md")
}

// ============================================
// FRONTMATTER PARSING
// ============================================

/// Parse YAML frontmatter from markdown content
pub fn parse_frontmatter<T: serde::de::DeserializeOwned>(content: &str) -> Option<(T, String)> {
    let content = content.trim_start_matches('\u{feff}').trim();
    let rest = content.strip_prefix("---")?;
    let end = rest.find("\n---")?;
    let yaml = rest[..end].trim();
    let body = rest[end + 4..].trim().to_string();

    let frontmatter: T = serde_yaml::from_str(yaml).ok()?;
    Some((frontmatter, body))
}

/// Serialize frontmatter + body to markdown
pub fn to_markdown<T: serde::Serialize>(frontmatter: &T, body: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(frontmatter)?;
    Ok(format!("---\n{}---\n\n{}", yaml, body))
}

// ============================================
// SETTINGS STORE
// ============================================

pub struct SettingsStore {
    path: PathBuf,
    settings: RwLock<PluginSettings>,
}

pub type SettingsState = Arc<SettingsStore>;

impl SettingsStore {
    /// Load settings from `path`; a missing or unreadable file yields defaults
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = load_settings(&path);
        Self { path, settings: RwLock::new(settings) }
    }

    /// Store in the user's config directory
    pub fn open_default() -> Result<Self> {
        Ok(Self::open(settings_path(&global_config_dir()?)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> PluginSettings {
        self.settings.read().clone()
    }

    pub fn defaults(&self) -> BlockSettings {
        self.settings.read().default_block_settings.clone()
    }

    /// Coerce a partial update onto the current defaults and persist
    pub fn update_defaults(&self, raw: &serde_json::Value) -> Result<PluginSettings> {
        let updated = {
            let mut settings = self.settings.write();
            let next = coerce_block_settings(Some(raw), &settings.default_block_settings);
            settings.default_block_settings = next;
            settings.clone()
        };
        tracing::info!("[SettingsStore::update_defaults] Updated default block settings");
        self.save()?;
        Ok(updated)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = to_markdown(&*self.settings.read(), SETTINGS_BODY)?;
        fs::write(&self.path, content)?;
        tracing::debug!("[SettingsStore::save] Wrote {:?}", self.path);
        Ok(())
    }
}

fn load_settings(path: &Path) -> PluginSettings {
    if !path.exists() {
        tracing::debug!("[load_settings] {:?} does not exist, using defaults", path);
        return PluginSettings::default();
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("[load_settings] Failed to read {:?}: {}", path, e);
            return PluginSettings::default();
        }
    };

    let Some((yaml, _)) = parse_frontmatter::<serde_yaml::Value>(&content) else {
        tracing::warn!("[load_settings] No frontmatter in {:?}, using defaults", path);
        return PluginSettings::default();
    };

    match serde_json::to_value(&yaml) {
        Ok(raw) => normalize_plugin_settings(Some(&raw)),
        Err(e) => {
            tracing::warn!("[load_settings] Unusable settings in {:?}: {}", path, e);
            PluginSettings::default()
        }
    }
}
