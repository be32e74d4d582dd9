//! Line-oriented host session for one document and one surface.
//!
//! Each input line is either a surface message (`{"type":"stroke",...}`) or a
//! host command (`{"command":"save"}`). Lines are applied in arrival order;
//! only commands that wait on a surface `response` (save, saveAs, backup) run
//! as background tasks, since that response arrives as a later line.

use serde::Deserialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::core::Subscription;
use crate::document::Document;
use crate::error::Result;
use crate::models::ResourceUri;
use crate::provider::{BackupContext, CustomDocumentEditEvent, EditorProvider};
use crate::services::backup::Backup;
use crate::webview::{InboundMessage, Webview};

#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum HostCommand {
    Save,
    SaveAs {
        target: String,
    },
    Revert,
    Backup {
        #[serde(default)]
        destination: Option<PathBuf>,
    },
    Undo,
    Redo,
    Close,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum InputLine {
    Host(HostCommand),
    Surface(InboundMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Continue,
    Close,
}

/// Host-side undo/redo stacks plus the live backup.
#[derive(Default)]
struct HostState {
    undo: Vec<CustomDocumentEditEvent>,
    redo: Vec<CustomDocumentEditEvent>,
    backup: Option<Backup>,
}

pub struct HostSession {
    provider: Arc<EditorProvider>,
    document: Arc<Document>,
    webview: Webview,
    state: Arc<Mutex<HostState>>,
    _changes: Subscription,
}

impl HostSession {
    /// Binds `webview` to `document` and starts recording host-visible edits.
    pub fn new(provider: Arc<EditorProvider>, document: Arc<Document>, webview: Webview) -> Arc<Self> {
        let state = Arc::new(Mutex::new(HostState::default()));
        let recorder = Arc::clone(&state);
        let changes = provider.on_did_change_custom_document(move |event| {
            if let Ok(mut state) = recorder.lock() {
                state.undo.push(event.clone());
                state.redo.clear();
            }
        });
        provider.resolve_custom_editor(&document, webview.clone());

        Arc::new(Self {
            provider,
            document,
            webview,
            state,
            _changes: changes,
        })
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    pub fn undo_depth(&self) -> usize {
        self.state.lock().map(|s| s.undo.len()).unwrap_or(0)
    }

    pub fn redo_depth(&self) -> usize {
        self.state.lock().map(|s| s.redo.len()).unwrap_or(0)
    }

    pub async fn handle_line(self: &Arc<Self>, line: &str) -> LineOutcome {
        if line.trim().is_empty() {
            return LineOutcome::Continue;
        }
        match serde_json::from_str::<InputLine>(line) {
            Ok(InputLine::Surface(msg)) => self.webview.receive(msg),
            Ok(InputLine::Host(HostCommand::Close)) => return LineOutcome::Close,
            Ok(InputLine::Host(HostCommand::Undo)) => self.undo(),
            Ok(InputLine::Host(HostCommand::Redo)) => self.redo(),
            Ok(InputLine::Host(HostCommand::Revert)) => {
                let cancel = CancellationToken::new();
                let result = self
                    .provider
                    .revert_custom_document(&self.document, &cancel)
                    .await;
                report("revert", result);
            }
            Ok(InputLine::Host(command)) => {
                // the surface reply comes in on a later line
                let session = Arc::clone(self);
                tokio::spawn(async move {
                    let result = session.run_persistence(command).await;
                    report("persistence", result);
                });
            }
            Err(e) => tracing::warn!(error = %e, line = %line, "ignore malformed input line"),
        }
        LineOutcome::Continue
    }

    fn undo(&self) {
        let event = self.state.lock().ok().and_then(|mut s| s.undo.pop());
        let Some(event) = event else {
            tracing::debug!("nothing to undo");
            return;
        };
        event.undo();
        if let Ok(mut s) = self.state.lock() {
            s.redo.push(event);
        }
    }

    fn redo(&self) {
        let event = self.state.lock().ok().and_then(|mut s| s.redo.pop());
        let Some(event) = event else {
            tracing::debug!("nothing to redo");
            return;
        };
        event.redo();
        if let Ok(mut s) = self.state.lock() {
            s.undo.push(event);
        }
    }

    async fn run_persistence(&self, command: HostCommand) -> Result<()> {
        let cancel = CancellationToken::new();
        match command {
            HostCommand::Save => {
                self.provider
                    .save_custom_document(&self.document, &cancel)
                    .await?;
                if let Some(backup) = self.take_backup() {
                    backup.dispose();
                }
            }
            HostCommand::SaveAs { target } => {
                let target = ResourceUri::parse(&target);
                self.provider
                    .save_custom_document_as(&self.document, &target, &cancel)
                    .await?;
            }
            HostCommand::Backup { destination } => {
                let backup = self
                    .provider
                    .backup_custom_document(&self.document, BackupContext { destination }, &cancel)
                    .await?;
                tracing::info!(location = %backup.location().display(), sequence = backup.sequence(), "backup taken");
                let location = backup.location().to_path_buf();
                let previous = self
                    .state
                    .lock()
                    .ok()
                    .and_then(|mut s| s.backup.replace(backup));
                // the hashed strategy rewrites the same file in place
                if let Some(previous) = previous {
                    if previous.location() != location {
                        previous.dispose();
                    }
                }
            }
            HostCommand::Revert | HostCommand::Undo | HostCommand::Redo | HostCommand::Close => {}
        }
        Ok(())
    }

    fn take_backup(&self) -> Option<Backup> {
        self.state.lock().ok().and_then(|mut s| s.backup.take())
    }

    /// Deletes the live backup and disposes the surface and the document.
    pub fn shutdown(&self) {
        if let Some(backup) = self.take_backup() {
            backup.dispose();
        }
        self.webview.dispose();
        self.document.dispose();
    }
}

fn report(what: &str, result: Result<()>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, what, "host command failed");
        eprintln!("zdraw: {}", e);
    }
}

#[cfg(test)]
#[path = "../tests/unit/host.rs"]
mod tests;
