//! 配置：存储根目录、备份策略与请求超时
//!
//! 配置文件位于 `<storage_root>/settings.json`，所有字段都有默认值：
//! - macOS: ~/Library/Application Support/zdraw
//! - Linux: $XDG_DATA_HOME/zdraw 或 ~/.local/share/zdraw
//! - Windows: %APPDATA%\zdraw

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "zdraw";
pub const SETTINGS_FILE: &str = "settings.json";
pub const DEFAULT_BACKUP_DIR: &str = "backups";
pub const LOG_DIR: &str = "logs";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupStrategy {
    /// Self-derived location: `<storage_root>/<backup_dir>/<sha256(uri)>`.
    #[default]
    Hashed,
    /// Destination supplied by the host with every backup request.
    Host,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_root: Option<PathBuf>,
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,
    #[serde(default)]
    pub backup_strategy: BackupStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
}

fn default_backup_dir() -> String {
    DEFAULT_BACKUP_DIR.to_string()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            storage_root: None,
            backup_dir: default_backup_dir(),
            backup_strategy: BackupStrategy::default(),
            request_timeout_ms: None,
        }
    }
}

impl EditorConfig {
    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = Some(root.into());
        self
    }

    /// Configured root, falling back to the platform data directory.
    pub fn storage_root(&self) -> Option<PathBuf> {
        self.storage_root.clone().or_else(get_app_data_dir)
    }

    pub fn backup_root(&self) -> Option<PathBuf> {
        self.storage_root().map(|root| root.join(&self.backup_dir))
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.storage_root().map(|root| root.join(LOG_DIR))
    }

    /// `None` disables the timeout (`request_timeout_ms: 0`).
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS) {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

/// 获取应用数据目录
pub fn get_app_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME").ok().map(|home| {
            PathBuf::from(home)
                .join("Library/Application Support")
                .join(APP_NAME)
        })
    }

    #[cfg(target_os = "linux")]
    {
        // 优先使用 XDG_DATA_HOME，否则使用 ~/.local/share
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            Some(PathBuf::from(xdg).join(APP_NAME))
        } else {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".local/share").join(APP_NAME))
        }
    }

    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join(APP_NAME))
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

/// Reads `settings.json` under `root`. A missing file yields the defaults; a
/// malformed one is logged and also yields the defaults.
pub fn load_config(root: &Path) -> EditorConfig {
    let path = root.join(SETTINGS_FILE);
    let data = match std::fs::read_to_string(&path) {
        Ok(data) => data,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "no settings file, using defaults");
            return EditorConfig::default().with_storage_root(root);
        }
    };

    match serde_json::from_str::<EditorConfig>(&data) {
        Ok(mut config) => {
            if config.storage_root.is_none() {
                config.storage_root = Some(root.to_path_buf());
            }
            config
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "invalid settings file, using defaults");
            EditorConfig::default().with_storage_root(root)
        }
    }
}

/// 确保目录存在
pub fn ensure_dir(dir: Option<PathBuf>, what: &str) -> std::io::Result<PathBuf> {
    let dir = dir.ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Cannot determine {} directory", what),
        )
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }

    Ok(dir)
}

#[cfg(test)]
#[path = "../../tests/unit/services/config.rs"]
mod tests;
