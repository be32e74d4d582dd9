//! Editor provider: opens documents, binds webviews to them and forwards
//! document events both ways.
//!
//! Per document: loading (bytes, backup aware) -> ready (0..n webviews) ->
//! disposed (listeners detached). A new webview gets `init` only after it
//! announces `ready`.

use serde_json::json;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::core::{Emitter, Subscription};
use crate::document::{BoxFuture, Document, DocumentDelegate, DocumentEditEvent};
use crate::error::{EditorError, Result};
use crate::models::ResourceUri;
use crate::services::backup::{Backup, BackupManager, BackupTargetResolver, HostBackupDestination};
use crate::services::config::{BackupStrategy, EditorConfig};
use crate::services::file::FileProvider;
use crate::webview::protocol::{self, FileDataResponse, InboundMessage, OutboundMessage};
use crate::webview::{MessageBridge, Webview, WebviewRegistry};

/// Host-facing change notification.
#[derive(Debug, Clone)]
pub struct CustomDocumentEditEvent {
    pub uri: ResourceUri,
    pub edit: DocumentEditEvent,
}

impl CustomDocumentEditEvent {
    pub fn label(&self) -> &'static str {
        self.edit.label()
    }

    pub fn undo(&self) {
        self.edit.undo()
    }

    pub fn redo(&self) {
        self.edit.redo()
    }
}

#[derive(Debug, Clone, Default)]
pub struct OpenContext {
    /// Backup location handed back by the host after a restart.
    pub backup_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BackupContext {
    /// Host-chosen destination; only used by the host strategy.
    pub destination: Option<PathBuf>,
}

/// Asks a bound webview for the serialized document.
struct WebviewFileData {
    uri: ResourceUri,
    webviews: WebviewRegistry,
    bridge: Arc<MessageBridge>,
}

impl DocumentDelegate for WebviewFileData {
    fn get_file_data(&self) -> BoxFuture<'_, Result<Vec<u8>>> {
        Box::pin(async move {
            let webview = self.webviews.first(&self.uri)?;
            let body = self
                .bridge
                .post_message_with_response(&webview, protocol::GET_FILE_DATA, json!({}))
                .await?;
            let response: FileDataResponse = serde_json::from_value(body)?;
            Ok(response.data)
        })
    }
}

pub struct EditorProvider {
    files: Arc<dyn FileProvider>,
    backups: Arc<dyn BackupTargetResolver>,
    webviews: WebviewRegistry,
    bridge: Arc<MessageBridge>,
    on_did_change_custom_document: Arc<Emitter<CustomDocumentEditEvent>>,
}

impl EditorProvider {
    pub fn new(
        files: Arc<dyn FileProvider>,
        backups: Arc<dyn BackupTargetResolver>,
        bridge: MessageBridge,
    ) -> Self {
        Self {
            files,
            backups,
            webviews: WebviewRegistry::new(),
            bridge: Arc::new(bridge),
            on_did_change_custom_document: Arc::new(Emitter::new()),
        }
    }

    pub fn from_config(config: &EditorConfig, files: Arc<dyn FileProvider>) -> Result<Self> {
        let backups: Arc<dyn BackupTargetResolver> = match config.backup_strategy {
            BackupStrategy::Hashed => {
                let root = config.backup_root().ok_or_else(|| {
                    EditorError::BackupUnavailable("no storage root configured".to_string())
                })?;
                Arc::new(BackupManager::new(root, Arc::clone(&files)))
            }
            BackupStrategy::Host => Arc::new(HostBackupDestination),
        };
        let bridge = MessageBridge::new(config.request_timeout());
        Ok(Self::new(files, backups, bridge))
    }

    pub fn webviews(&self) -> &WebviewRegistry {
        &self.webviews
    }

    pub fn bridge(&self) -> &MessageBridge {
        &self.bridge
    }

    pub fn on_did_change_custom_document<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CustomDocumentEditEvent) + Send + Sync + 'static,
    {
        self.on_did_change_custom_document.subscribe(listener)
    }

    pub async fn open_custom_document(
        &self,
        uri: ResourceUri,
        context: OpenContext,
    ) -> Result<Arc<Document>> {
        let backup = match context.backup_id.as_deref() {
            Some(id) => Some(backup_path(id)),
            None => self.backups.discover_backup(&uri),
        };
        if let Some(backup) = &backup {
            tracing::info!(uri = %uri, backup = %backup.display(), "opening from backup");
        }

        let delegate = WebviewFileData {
            uri: uri.clone(),
            webviews: self.webviews.clone(),
            bridge: Arc::clone(&self.bridge),
        };
        let document =
            Document::create(uri, backup, Box::new(delegate), Arc::clone(&self.files)).await?;
        self.wire_document(&document);
        Ok(document)
    }

    fn wire_document(&self, document: &Arc<Document>) {
        let listeners: Arc<Mutex<Vec<Subscription>>> = Arc::new(Mutex::new(Vec::new()));
        let uri = document.uri().clone();

        let host = Arc::clone(&self.on_did_change_custom_document);
        let change_uri = uri.clone();
        let on_change = document.on_did_change(move |edit| {
            host.fire(&CustomDocumentEditEvent {
                uri: change_uri.clone(),
                edit: edit.clone(),
            });
        });

        let webviews = self.webviews.clone();
        let content_uri = uri.clone();
        let on_content = document.on_did_change_content(move |change| {
            for webview in webviews.get(&content_uri) {
                webview.post_message(OutboundMessage::update(&change.edits));
            }
        });

        let webviews = self.webviews.clone();
        let revert_uri = uri.clone();
        let on_revert = document.on_did_revert(move |revert| {
            let untitled = revert_uri.is_untitled();
            for webview in webviews.get(&revert_uri) {
                webview.post_message(OutboundMessage::init(&revert.content, untitled));
            }
        });

        let detach = Arc::clone(&listeners);
        let on_dispose = document.on_did_dispose(move |_| {
            let dropped = match detach.lock() {
                Ok(mut subs) => std::mem::take(&mut *subs),
                Err(_) => Vec::new(),
            };
            tracing::debug!(uri = %uri, listeners = dropped.len(), "document listeners detached");
            drop(dropped);
        });

        if let Ok(mut subs) = listeners.lock() {
            subs.extend([on_change, on_content, on_revert, on_dispose]);
        };
    }

    /// Binds a new webview to `document`. Inbound strokes become edits,
    /// responses resolve pending requests, `ready` triggers `init`.
    pub fn resolve_custom_editor(&self, document: &Arc<Document>, webview: Webview) {
        self.webviews.add(document.uri(), webview.clone());

        let doc = Arc::downgrade(document);
        let view = webview.downgrade();
        let bridge = Arc::clone(&self.bridge);
        let on_message = webview.on_did_receive_message(move |msg| match msg {
            InboundMessage::Ready => {
                let (Some(doc), Some(view)) = (doc.upgrade(), view.upgrade()) else {
                    return;
                };
                view.post_message(OutboundMessage::init(
                    &doc.initial_content(),
                    doc.uri().is_untitled(),
                ));
            }
            InboundMessage::Stroke(edit) => {
                if let Some(doc) = doc.upgrade() {
                    doc.make_edit(edit.clone());
                }
            }
            InboundMessage::Response {
                correlation_id,
                body,
            } => {
                bridge.handle_response(*correlation_id, body.clone());
            }
        });
        webview.hold(on_message);
        tracing::debug!(uri = %document.uri(), webview = %webview.title(), "webview bound");
    }

    pub async fn save_custom_document(
        &self,
        document: &Document,
        cancel: &CancellationToken,
    ) -> Result<()> {
        document.save(cancel).await
    }

    pub async fn save_custom_document_as(
        &self,
        document: &Document,
        target: &ResourceUri,
        cancel: &CancellationToken,
    ) -> Result<()> {
        document.save_as(target, cancel).await
    }

    pub async fn revert_custom_document(
        &self,
        document: &Document,
        cancel: &CancellationToken,
    ) -> Result<()> {
        document.revert(cancel).await
    }

    pub async fn backup_custom_document(
        &self,
        document: &Document,
        context: BackupContext,
        cancel: &CancellationToken,
    ) -> Result<Backup> {
        let target = self
            .backups
            .resolve_backup_target(document.uri(), context.destination.as_deref())?;
        document.backup(&target, cancel).await
    }
}

/// Backup ids are either `file:` uris or plain paths.
fn backup_path(id: &str) -> PathBuf {
    ResourceUri::parse(id)
        .to_file_path()
        .unwrap_or_else(|| PathBuf::from(id))
}

#[cfg(test)]
#[path = "../tests/unit/provider.rs"]
mod tests;
