use crate::error::{BlazeCssError, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "blazecss.toml";

/// Entry stylesheet, relative to the workspace root.
pub const ENTRY_STYLESHEET: &str = "entry_stylesheet";
/// Directory package-style imports resolve under, relative to the workspace root.
pub const DEPENDENCY_ROOT: &str = "dependency_root";
pub const CACHE_TTL_SECS: &str = "cache_ttl_secs";
/// Glob selecting files whose changes invalidate the class index.
pub const WATCH_PATTERN: &str = "watch_pattern";

pub const DEFAULT_DEPENDENCY_ROOT: &str = "node_modules";
pub const DEFAULT_WATCH_PATTERN: &str = "**/*.css";

/// Key/value settings lookup, e.g. backed by an editor's configuration.
pub trait ConfigProvider: Send + Sync {
    fn get_string(&self, key: &str) -> Option<String>;
}

impl ConfigProvider for HashMap<String, String> {
    fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Contents of `blazecss.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub entry_stylesheet: Option<String>,
    pub dependency_root: Option<String>,
    pub cache_ttl_secs: Option<u64>,
    pub watch_pattern: Option<String>,
}

impl Settings {
    /// Load `blazecss.toml` from `workspace_root`; a missing file means defaults.
    pub fn load(workspace_root: &Path) -> Result<Self> {
        let path = workspace_root.join(SETTINGS_FILE);
        if !path.exists() {
            warn!("{} not found, using defaults", path.display());
            return Ok(Settings::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| BlazeCssError::Io {
            path: path.clone(),
            source,
        })?;
        let settings: Settings = toml::from_str(&content)
            .map_err(|source| BlazeCssError::Settings { path: path.clone(), source })?;

        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}

impl ConfigProvider for Settings {
    fn get_string(&self, key: &str) -> Option<String> {
        match key {
            ENTRY_STYLESHEET => self.entry_stylesheet.clone(),
            DEPENDENCY_ROOT => self.dependency_root.clone(),
            CACHE_TTL_SECS => self.cache_ttl_secs.map(|secs| secs.to_string()),
            WATCH_PATTERN => self.watch_pattern.clone(),
            _ => None,
        }
    }
}

/// Pick the deepest root that contains `document`.
pub fn locate_workspace_root(document: &Path, roots: &[PathBuf]) -> Result<PathBuf> {
    roots
        .iter()
        .filter(|root| document.starts_with(root))
        .max_by_key(|root| root.components().count())
        .cloned()
        .ok_or_else(|| BlazeCssError::Workspace(document.to_path_buf()))
}
