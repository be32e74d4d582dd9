//! 文件系统 Provider trait
//!
//! 抽象文档读写、备份写入与删除所需的最小文件操作

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub type Result<T> = std::result::Result<T, FileError>;

#[derive(Debug)]
pub enum FileError {
    Io(io::Error),
    NotFound(PathBuf),
    PermissionDenied(PathBuf),
    NotAFile(PathBuf),
}

impl FileError {
    pub fn io_kind(&self) -> io::ErrorKind {
        match self {
            FileError::Io(e) => e.kind(),
            FileError::NotFound(_) => io::ErrorKind::NotFound,
            FileError::PermissionDenied(_) => io::ErrorKind::PermissionDenied,
            FileError::NotAFile(_) => io::ErrorKind::InvalidInput,
        }
    }
}

impl std::fmt::Display for FileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileError::Io(e) => write!(f, "IO error: {}", e),
            FileError::NotFound(p) => write!(f, "Not found: {}", p.display()),
            FileError::PermissionDenied(p) => write!(f, "Permission denied: {}", p.display()),
            FileError::NotAFile(p) => write!(f, "Not a file: {}", p.display()),
        }
    }
}

impl std::error::Error for FileError {}

impl From<io::Error> for FileError {
    fn from(e: io::Error) -> Self {
        FileError::Io(e)
    }
}

#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub size: u64,
    pub is_dir: bool,
    pub is_file: bool,
    pub modified: Option<SystemTime>,
}

impl FileMetadata {
    pub fn from_std(meta: std::fs::Metadata) -> Self {
        Self {
            size: meta.len(),
            is_dir: meta.is_dir(),
            is_file: meta.is_file(),
            modified: meta.modified().ok(),
        }
    }
}

/// Blocking file operations. Async callers go through
/// [`run_blocking`](super::run_blocking).
pub trait FileProvider: Send + Sync {
    fn read_file_bytes(&self, path: &Path) -> Result<Vec<u8>>;

    /// Creates missing parent directories.
    fn write_file_bytes(&self, path: &Path, content: &[u8]) -> Result<()>;

    fn delete_file(&self, path: &Path) -> Result<()>;

    fn create_dir_all(&self, path: &Path) -> Result<()>;

    fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Stat probe. Any error means "does not exist".
    fn exists(&self, path: &Path) -> bool {
        self.metadata(path).is_ok()
    }
}
