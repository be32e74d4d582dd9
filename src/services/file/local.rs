//! 本地文件系统 Provider
//!
//! 实现 FileProvider trait，操作本地文件系统

use super::provider::{FileError, FileMetadata, FileProvider, Result};
use std::fs;
use std::io;
use std::path::Path;

pub struct LocalFileProvider;

impl LocalFileProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFileProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn map_io(path: &Path, e: io::Error) -> FileError {
    match e.kind() {
        io::ErrorKind::NotFound => FileError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => FileError::PermissionDenied(path.to_path_buf()),
        _ => FileError::Io(e),
    }
}

impl FileProvider for LocalFileProvider {
    fn read_file_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        let meta = fs::metadata(path).map_err(|e| map_io(path, e))?;
        if !meta.is_file() {
            return Err(FileError::NotAFile(path.to_path_buf()));
        }
        fs::read(path).map_err(|e| map_io(path, e))
    }

    fn write_file_bytes(&self, path: &Path, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| map_io(parent, e))?;
            }
        }
        fs::write(path, content).map_err(|e| map_io(path, e))
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        let meta = fs::symlink_metadata(path).map_err(|e| map_io(path, e))?;
        if meta.is_dir() {
            return Err(FileError::NotAFile(path.to_path_buf()));
        }
        fs::remove_file(path).map_err(|e| map_io(path, e))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| map_io(path, e))
    }

    fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let meta = fs::metadata(path).map_err(|e| map_io(path, e))?;
        Ok(FileMetadata::from_std(meta))
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/services/file/local.rs"]
mod tests;
