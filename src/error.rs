//! Error taxonomy shared by documents, the webview bridge and the provider.

use std::io;
use std::path::PathBuf;

use crate::services::file::FileError;

pub type Result<T> = std::result::Result<T, EditorError>;

#[derive(Debug)]
pub enum EditorError {
    /// A read, write or stat failed.
    Io {
        op: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    /// No rendering surface is bound to the document that must be serialized.
    NoViewAvailable(String),
    /// A correlated request got no response in time.
    RequestTimedOut { kind: String, id: u64 },
    /// The pending entry was dropped before a response arrived.
    RequestDropped { kind: String, id: u64 },
    /// An inbound payload did not have the expected shape.
    Protocol(String),
    /// The document was disposed.
    Disposed(String),
    /// The backup strategy could not produce a destination.
    BackupUnavailable(String),
}

impl EditorError {
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        EditorError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn from_file(op: &'static str, path: impl Into<PathBuf>, err: FileError) -> Self {
        let path = path.into();
        let source = match err {
            FileError::Io(e) => e,
            other => io::Error::new(other.io_kind(), other.to_string()),
        };
        EditorError::Io { op, path, source }
    }

    pub fn is_io(&self) -> bool {
        matches!(self, EditorError::Io { .. })
    }
}

impl std::fmt::Display for EditorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorError::Io { op, path, source } => {
                write!(f, "{} failed for {}: {}", op, path.display(), source)
            }
            EditorError::NoViewAvailable(uri) => write!(f, "No webview available for {}", uri),
            EditorError::RequestTimedOut { kind, id } => {
                write!(f, "Request {} (#{}) timed out", kind, id)
            }
            EditorError::RequestDropped { kind, id } => {
                write!(f, "Request {} (#{}) was dropped", kind, id)
            }
            EditorError::Protocol(msg) => write!(f, "Protocol error: {}", msg),
            EditorError::Disposed(uri) => write!(f, "Document disposed: {}", uri),
            EditorError::BackupUnavailable(msg) => write!(f, "Backup unavailable: {}", msg),
        }
    }
}

impl std::error::Error for EditorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EditorError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for EditorError {
    fn from(e: serde_json::Error) -> Self {
        EditorError::Protocol(e.to_string())
    }
}
