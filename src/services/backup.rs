//! 备份路径管理与备份记录
//!
//! 两种策略实现同一个 `BackupTargetResolver`：
//! - `BackupManager`: 自行推导路径 `<root>/<sha256(uri)>`，重启后仍能找回
//! - `HostBackupDestination`: 直接使用宿主提供的目标路径
//!
//! 备份删除是尽力而为：失败只记日志，绝不向调用方传播。

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{EditorError, Result};
use crate::models::ResourceUri;
use crate::services::file::FileProvider;

/// Picks where a document's recovery snapshot goes.
pub trait BackupTargetResolver: Send + Sync {
    fn resolve_backup_target(
        &self,
        uri: &ResourceUri,
        host_destination: Option<&Path>,
    ) -> Result<PathBuf>;

    /// Existing backup for `uri` left by an earlier process, if this strategy
    /// can find one on its own.
    fn discover_backup(&self, _uri: &ResourceUri) -> Option<PathBuf> {
        None
    }
}

/// 计算资源标识的哈希值（用于生成备份文件名）
pub fn hash_uri(uri: &ResourceUri) -> String {
    let digest = Sha256::digest(uri.as_str().as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

pub struct BackupManager {
    root: PathBuf,
    files: Arc<dyn FileProvider>,
}

impl BackupManager {
    pub fn new(root: impl Into<PathBuf>, files: Arc<dyn FileProvider>) -> Self {
        Self {
            root: root.into(),
            files,
        }
    }

    /// Same uri, same location, across processes.
    pub fn location_for(&self, uri: &ResourceUri) -> PathBuf {
        self.root.join(hash_uri(uri))
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.files.exists(path)
    }
}

impl BackupTargetResolver for BackupManager {
    fn resolve_backup_target(
        &self,
        uri: &ResourceUri,
        _host_destination: Option<&Path>,
    ) -> Result<PathBuf> {
        self.files
            .create_dir_all(&self.root)
            .map_err(|e| EditorError::from_file("create_dir", &self.root, e))?;
        Ok(self.location_for(uri))
    }

    fn discover_backup(&self, uri: &ResourceUri) -> Option<PathBuf> {
        let location = self.location_for(uri);
        self.exists(&location).then_some(location)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HostBackupDestination;

impl BackupTargetResolver for HostBackupDestination {
    fn resolve_backup_target(
        &self,
        uri: &ResourceUri,
        host_destination: Option<&Path>,
    ) -> Result<PathBuf> {
        host_destination.map(Path::to_path_buf).ok_or_else(|| {
            EditorError::BackupUnavailable(format!("host supplied no destination for {}", uri))
        })
    }
}

pub(crate) fn delete_best_effort(files: &dyn FileProvider, path: &Path) -> bool {
    match files.delete_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "backup deleted");
            true
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "backup delete failed");
            false
        }
    }
}

struct BackupInner {
    location: PathBuf,
    sequence: u64,
    files: Arc<dyn FileProvider>,
    disposed: AtomicBool,
}

/// A written recovery snapshot. Clones share one disposal state.
#[derive(Clone)]
pub struct Backup {
    inner: Arc<BackupInner>,
}

impl Backup {
    pub(crate) fn new(location: PathBuf, sequence: u64, files: Arc<dyn FileProvider>) -> Self {
        Self {
            inner: Arc::new(BackupInner {
                location,
                sequence,
                files,
                disposed: AtomicBool::new(false),
            }),
        }
    }

    pub fn location(&self) -> &Path {
        &self.inner.location
    }

    pub fn sequence(&self) -> u64 {
        self.inner.sequence
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// Deletes the snapshot once. Later calls do nothing; failures are logged.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let _ = delete_best_effort(self.inner.files.as_ref(), &self.inner.location);
    }
}

impl std::fmt::Debug for Backup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backup")
            .field("location", &self.inner.location)
            .field("sequence", &self.inner.sequence)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/services/backup.rs"]
mod tests;
