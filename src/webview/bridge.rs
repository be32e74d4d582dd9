//! Request/response over the fire-and-forget webview channel.
//!
//! `PendingRequests<T>` is the correlation table: every id is handed out once
//! and resolved or cancelled once. `MessageBridge` pairs it with a webview.

use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

use super::protocol::OutboundMessage;
use super::Webview;
use crate::error::{EditorError, Result};

struct PendingState<T> {
    next_id: u64,
    pending: FxHashMap<u64, oneshot::Sender<T>>,
}

pub struct PendingRequests<T> {
    state: Mutex<PendingState<T>>,
}

impl<T> PendingRequests<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PendingState {
                next_id: 1,
                pending: FxHashMap::default(),
            }),
        }
    }

    /// Allocates a fresh id and its single-use receiver.
    pub fn register(&self) -> (u64, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        let Ok(mut state) = self.state.lock() else {
            // receiver sees a closed channel
            return (0, rx);
        };
        let id = state.next_id;
        state.next_id = state.next_id.saturating_add(1);
        state.pending.insert(id, tx);
        (id, rx)
    }

    /// Completes `id`. Unknown or already consumed ids return `false`.
    pub fn resolve(&self, id: u64, value: T) -> bool {
        let tx = match self.state.lock() {
            Ok(mut state) => state.pending.remove(&id),
            Err(_) => None,
        };
        match tx {
            Some(tx) => tx.send(value).is_ok(),
            None => false,
        }
    }

    /// Drops the pending entry; its receiver observes a closed channel.
    pub fn cancel(&self, id: u64) -> bool {
        let tx = match self.state.lock() {
            Ok(mut state) => state.pending.remove(&id),
            Err(_) => None,
        };
        tx.is_some()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.state
            .lock()
            .map(|s| s.pending.contains_key(&id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.pending.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for PendingRequests<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes the entry if the awaiting future is dropped early.
struct CancelOnDrop<'a, T> {
    pending: &'a PendingRequests<T>,
    id: u64,
}

impl<T> Drop for CancelOnDrop<'_, T> {
    fn drop(&mut self) {
        self.pending.cancel(self.id);
    }
}

pub struct MessageBridge {
    pending: Arc<PendingRequests<Value>>,
    timeout: Option<Duration>,
}

impl MessageBridge {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            pending: Arc::new(PendingRequests::new()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn post_message(&self, webview: &Webview, kind: &str, body: Value) -> bool {
        webview.post_message(OutboundMessage::new(kind, body))
    }

    /// Sends `{type, correlationId, body}` and waits for the matching
    /// `response`. Fails early if the webview is gone or goes away first.
    pub async fn post_message_with_response(
        &self,
        webview: &Webview,
        kind: &str,
        body: Value,
    ) -> Result<Value> {
        let (id, rx) = self.pending.register();
        let _guard = CancelOnDrop {
            pending: self.pending.as_ref(),
            id,
        };

        let pending = Arc::downgrade(&self.pending);
        let _on_dispose = webview.on_did_dispose(move |_| {
            if let Some(pending) = pending.upgrade() {
                pending.cancel(id);
            }
        });

        if !webview.post_message(OutboundMessage::request(kind, id, body)) {
            return Err(EditorError::NoViewAvailable(webview.title().to_string()));
        }

        let received = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received,
                Err(_) => {
                    tracing::warn!(kind, id, timeout_ms = limit.as_millis() as u64, "request timed out");
                    return Err(EditorError::RequestTimedOut {
                        kind: kind.to_string(),
                        id,
                    });
                }
            },
            None => rx.await,
        };

        received.map_err(|_| {
            tracing::debug!(kind, id, "request dropped before response");
            EditorError::RequestDropped {
                kind: kind.to_string(),
                id,
            }
        })
    }

    /// Inbound `response`. Unknown or stale ids are ignored.
    pub fn handle_response(&self, id: u64, body: Value) -> bool {
        let resolved = self.pending.resolve(id, body);
        if !resolved {
            tracing::debug!(id, "ignore response with unknown correlation id");
        }
        resolved
    }
}

#[cfg(test)]
#[path = "../../tests/unit/webview/bridge.rs"]
mod tests;
