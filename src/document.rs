//! 可编辑文档
//!
//! 持有一个二进制资源的初始内容与笔画历史，并发布四类通知：
//! - change: 新编辑（附带 undo/redo 回调，交给宿主的撤销栈）
//! - content change: undo/redo 之后的完整历史
//! - revert: 从磁盘重新读取后的内容
//! - dispose: 终止事件，之后所有通道关闭
//!
//! 序列化字节由 `DocumentDelegate`（即绑定的渲染端）提供，文档本身不解释内容。

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio_util::sync::CancellationToken;

use crate::core::{Emitter, Subscription};
use crate::error::{EditorError, Result};
use crate::models::{Edit, EditHistory, ResourceUri};
use crate::services::backup::Backup;
use crate::services::file::{self, FileProvider};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Supplies the current serialized bytes of a document.
pub trait DocumentDelegate: Send + Sync {
    fn get_file_data(&self) -> BoxFuture<'_, Result<Vec<u8>>>;
}

pub type EditCallback = Arc<dyn Fn() + Send + Sync>;

/// One applied edit, as handed to the host's undo stack.
#[derive(Clone)]
pub struct DocumentEditEvent {
    label: &'static str,
    undo: EditCallback,
    redo: EditCallback,
}

impl DocumentEditEvent {
    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn undo(&self) {
        (self.undo)()
    }

    pub fn redo(&self) {
        (self.redo)()
    }
}

impl std::fmt::Debug for DocumentEditEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentEditEvent")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct DocumentContentChange {
    pub edits: Vec<Edit>,
}

#[derive(Debug, Clone)]
pub struct DocumentRevert {
    pub content: Arc<[u8]>,
}

struct DocumentState {
    initial_content: Arc<[u8]>,
    history: EditHistory,
    disposed: bool,
}

pub struct Document {
    uri: ResourceUri,
    state: Mutex<DocumentState>,
    backup_seq: AtomicU64,
    files: Arc<dyn FileProvider>,
    delegate: Box<dyn DocumentDelegate>,
    weak_self: Weak<Document>,
    on_did_change: Emitter<DocumentEditEvent>,
    on_did_change_content: Emitter<DocumentContentChange>,
    on_did_revert: Emitter<DocumentRevert>,
    on_did_dispose: Emitter<()>,
}

impl Document {
    /// Loads from `backup` when it exists and reads cleanly, otherwise from
    /// `uri` itself. Untitled resources without a backup start empty.
    pub async fn create(
        uri: ResourceUri,
        backup: Option<PathBuf>,
        delegate: Box<dyn DocumentDelegate>,
        files: Arc<dyn FileProvider>,
    ) -> Result<Arc<Document>> {
        let content = load_content(&files, &uri, backup.as_deref()).await?;
        tracing::info!(uri = %uri, bytes = content.len(), from_backup = backup.is_some(), "document opened");

        Ok(Arc::new_cyclic(|weak_self| Document {
            uri,
            state: Mutex::new(DocumentState {
                initial_content: Arc::from(content),
                history: EditHistory::new(),
                disposed: false,
            }),
            backup_seq: AtomicU64::new(0),
            files,
            delegate,
            weak_self: weak_self.clone(),
            on_did_change: Emitter::new(),
            on_did_change_content: Emitter::new(),
            on_did_revert: Emitter::new(),
            on_did_dispose: Emitter::new(),
        }))
    }

    pub fn uri(&self) -> &ResourceUri {
        &self.uri
    }

    pub fn initial_content(&self) -> Arc<[u8]> {
        match self.state() {
            Some(state) => Arc::clone(&state.initial_content),
            None => Arc::from(Vec::<u8>::new()),
        }
    }

    pub fn edits(&self) -> Vec<Edit> {
        self.state()
            .map(|state| state.history.snapshot())
            .unwrap_or_default()
    }

    pub fn edit_count(&self) -> usize {
        self.state().map(|state| state.history.len()).unwrap_or(0)
    }

    pub fn is_disposed(&self) -> bool {
        self.state().map(|state| state.disposed).unwrap_or(true)
    }

    /// Number of backups taken so far in this process.
    pub fn backup_sequence(&self) -> u64 {
        self.backup_seq.load(Ordering::Acquire)
    }

    fn state(&self) -> Option<MutexGuard<'_, DocumentState>> {
        self.state.lock().ok()
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(EditorError::Disposed(self.uri.to_string()));
        }
        Ok(())
    }

    // ==================== 事件订阅 ====================

    pub fn on_did_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&DocumentEditEvent) + Send + Sync + 'static,
    {
        self.on_did_change.subscribe(listener)
    }

    pub fn on_did_change_content<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&DocumentContentChange) + Send + Sync + 'static,
    {
        self.on_did_change_content.subscribe(listener)
    }

    pub fn on_did_revert<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&DocumentRevert) + Send + Sync + 'static,
    {
        self.on_did_revert.subscribe(listener)
    }

    pub fn on_did_dispose<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&()) + Send + Sync + 'static,
    {
        self.on_did_dispose.subscribe(listener)
    }

    // ==================== 编辑 ====================

    /// Appends `edit` and announces it with undo/redo callbacks.
    pub fn make_edit(&self, edit: Edit) {
        let edit = Arc::new(edit);
        {
            let Some(mut state) = self.state() else {
                return;
            };
            if state.disposed {
                tracing::warn!(uri = %self.uri, "edit on disposed document dropped");
                return;
            }
            state.history.push(Arc::clone(&edit));
        }

        let undo_doc = self.weak_self.clone();
        let redo_doc = self.weak_self.clone();
        let redo_edit = Arc::clone(&edit);
        let event = DocumentEditEvent {
            label: edit.label(),
            undo: Arc::new(move || {
                if let Some(doc) = undo_doc.upgrade() {
                    doc.undo_last();
                }
            }),
            redo: Arc::new(move || {
                if let Some(doc) = redo_doc.upgrade() {
                    doc.reapply(Arc::clone(&redo_edit));
                }
            }),
        };
        self.on_did_change.fire(&event);
    }

    fn undo_last(&self) {
        let edits = {
            let Some(mut state) = self.state() else {
                return;
            };
            if state.disposed {
                return;
            }
            if state.history.pop().is_none() {
                tracing::warn!(uri = %self.uri, "undo on empty history ignored");
                return;
            }
            state.history.snapshot()
        };
        self.on_did_change_content.fire(&DocumentContentChange { edits });
    }

    fn reapply(&self, edit: Arc<Edit>) {
        let edits = {
            let Some(mut state) = self.state() else {
                return;
            };
            if state.disposed {
                return;
            }
            state.history.push(edit);
            state.history.snapshot()
        };
        self.on_did_change_content.fire(&DocumentContentChange { edits });
    }

    // ==================== 持久化 ====================

    pub async fn save(&self, cancel: &CancellationToken) -> Result<()> {
        let path = own_path(&self.uri)?;
        self.save_to_path(&path, cancel).await
    }

    pub async fn save_as(&self, target: &ResourceUri, cancel: &CancellationToken) -> Result<()> {
        let path = own_path(target)?;
        self.save_to_path(&path, cancel).await
    }

    /// Fetches bytes from the delegate, then writes them unless `cancel` fired
    /// in the meantime. The fetch itself is not undone.
    pub async fn save_to_path(&self, target: &Path, cancel: &CancellationToken) -> Result<()> {
        self.ensure_live()?;
        let data = self.delegate.get_file_data().await?;
        if cancel.is_cancelled() {
            tracing::info!(uri = %self.uri, target = %target.display(), "save cancelled before write");
            return Ok(());
        }
        file::write_bytes(&self.files, target, data).await?;
        tracing::info!(uri = %self.uri, target = %target.display(), "document saved");
        Ok(())
    }

    /// Re-reads the resource and replaces the initial content. The edit
    /// history is left as is.
    pub async fn revert(&self, cancel: &CancellationToken) -> Result<()> {
        self.ensure_live()?;
        let content: Arc<[u8]> = Arc::from(load_content(&self.files, &self.uri, None).await?);
        if cancel.is_cancelled() {
            tracing::info!(uri = %self.uri, "revert cancelled");
            return Ok(());
        }

        let kept_edits = {
            let Some(mut state) = self.state() else {
                return Err(EditorError::Disposed(self.uri.to_string()));
            };
            if state.disposed {
                return Err(EditorError::Disposed(self.uri.to_string()));
            }
            state.initial_content = Arc::clone(&content);
            state.history.len()
        };
        tracing::info!(uri = %self.uri, bytes = content.len(), kept_edits, "document reverted");
        self.on_did_revert.fire(&DocumentRevert { content });
        Ok(())
    }

    /// Writes a recovery snapshot to `destination`. Disposing the returned
    /// handle deletes it.
    pub async fn backup(&self, destination: &Path, cancel: &CancellationToken) -> Result<Backup> {
        let sequence = self.backup_seq.fetch_add(1, Ordering::AcqRel) + 1;
        self.save_to_path(destination, cancel).await?;
        tracing::debug!(uri = %self.uri, destination = %destination.display(), sequence, "backup written");
        Ok(Backup::new(
            destination.to_path_buf(),
            sequence,
            Arc::clone(&self.files),
        ))
    }

    /// Fires the terminal event and closes every channel. Idempotent.
    pub fn dispose(&self) {
        {
            let Some(mut state) = self.state() else {
                return;
            };
            if state.disposed {
                return;
            }
            state.disposed = true;
        }
        tracing::info!(uri = %self.uri, "document disposed");
        self.on_did_dispose.fire(&());
        self.on_did_dispose.dispose();
        self.on_did_change.dispose();
        self.on_did_change_content.dispose();
        self.on_did_revert.dispose();
    }
}

fn own_path(uri: &ResourceUri) -> Result<PathBuf> {
    uri.to_file_path().ok_or_else(|| {
        EditorError::io(
            "resolve",
            uri.as_str(),
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "resource has no local file path",
            ),
        )
    })
}

async fn load_content(
    files: &Arc<dyn FileProvider>,
    uri: &ResourceUri,
    backup: Option<&Path>,
) -> Result<Vec<u8>> {
    if let Some(backup) = backup {
        match file::read_bytes(files, backup).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) => {
                tracing::warn!(uri = %uri, backup = %backup.display(), error = %e, "backup unreadable, loading resource");
            }
        }
    }

    if uri.is_untitled() {
        return Ok(Vec::new());
    }
    let path = own_path(uri)?;
    file::read_bytes(files, &path).await
}

#[cfg(test)]
#[path = "../tests/unit/document.rs"]
mod tests;
