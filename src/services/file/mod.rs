//! 文件服务模块
//!
//! 提供文件系统抽象；阻塞调用统一放到 tokio 的 blocking 线程池执行

pub mod local;
pub mod provider;

pub use local::LocalFileProvider;
pub use provider::{FileError, FileMetadata, FileProvider, Result};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{EditorError, Result as EditorResult};

/// Runs one blocking provider call off the async executor, mapping failures
/// into [`EditorError::Io`].
pub async fn run_blocking<T, F>(
    files: &Arc<dyn FileProvider>,
    op: &'static str,
    path: &Path,
    f: F,
) -> EditorResult<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn FileProvider, &Path) -> Result<T> + Send + 'static,
{
    let files = Arc::clone(files);
    let owned: PathBuf = path.to_path_buf();
    let result = tokio::task::spawn_blocking(move || f(files.as_ref(), &owned)).await;

    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(EditorError::from_file(op, path, e)),
        Err(join) => Err(EditorError::io(
            op,
            path,
            std::io::Error::new(std::io::ErrorKind::Other, join.to_string()),
        )),
    }
}

pub async fn read_bytes(files: &Arc<dyn FileProvider>, path: &Path) -> EditorResult<Vec<u8>> {
    run_blocking(files, "read", path, |fs, p| fs.read_file_bytes(p)).await
}

pub async fn write_bytes(
    files: &Arc<dyn FileProvider>,
    path: &Path,
    content: Vec<u8>,
) -> EditorResult<()> {
    run_blocking(files, "write", path, move |fs, p| fs.write_file_bytes(p, &content)).await
}
