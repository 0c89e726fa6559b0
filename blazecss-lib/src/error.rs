use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlazeCssError {
    /// No entry stylesheet is configured for the workspace.
    #[error("no entry stylesheet configured (set `{key}` in blazecss.toml)")]
    Config { key: &'static str },

    /// The requesting document is not inside any known workspace root.
    #[error("no workspace root contains {}", .0.display())]
    Workspace(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid settings file {}: {source}", path.display())]
    Settings {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),
}

pub type Result<T> = std::result::Result<T, BlazeCssError>;
