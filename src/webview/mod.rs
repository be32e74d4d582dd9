//! Rendering-surface handles.
//!
//! A [`Webview`] is the host side of one surface instance. Outbound messages
//! go through an ordered channel to the paired [`SurfaceEndpoint`]; inbound
//! messages are pushed by the transport with [`Webview::receive`] and fanned
//! out to listeners in arrival order.

pub mod bridge;
pub mod protocol;
pub mod registry;

pub use bridge::{MessageBridge, PendingRequests};
pub use protocol::{FileDataResponse, InboundMessage, OutboundMessage};
pub use registry::WebviewRegistry;

use compact_str::CompactString;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::mpsc;

use crate::core::{Emitter, Subscription};
use crate::error::{EditorError, Result};

struct WebviewInner {
    title: CompactString,
    outbound: mpsc::UnboundedSender<OutboundMessage>,
    on_did_receive_message: Emitter<InboundMessage>,
    on_did_dispose: Emitter<()>,
    disposed: AtomicBool,
    held: Mutex<Vec<Subscription>>,
}

#[derive(Clone)]
pub struct Webview {
    inner: Arc<WebviewInner>,
}

#[derive(Clone)]
pub struct WeakWebview {
    inner: Weak<WebviewInner>,
}

impl WeakWebview {
    pub fn upgrade(&self) -> Option<Webview> {
        self.inner.upgrade().map(|inner| Webview { inner })
    }
}

impl Webview {
    pub fn channel(title: &str) -> (Webview, SurfaceEndpoint) {
        let (tx, rx) = mpsc::unbounded_channel();
        let webview = Webview {
            inner: Arc::new(WebviewInner {
                title: CompactString::new(title),
                outbound: tx,
                on_did_receive_message: Emitter::new(),
                on_did_dispose: Emitter::new(),
                disposed: AtomicBool::new(false),
                held: Mutex::new(Vec::new()),
            }),
        };
        let endpoint = SurfaceEndpoint {
            webview: webview.clone(),
            rx,
        };
        (webview, endpoint)
    }

    pub fn title(&self) -> &str {
        self.inner.title.as_str()
    }

    pub fn downgrade(&self) -> WeakWebview {
        WeakWebview {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn same(&self, other: &Webview) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// Fire-and-forget. `false` when the surface is gone.
    pub fn post_message(&self, msg: OutboundMessage) -> bool {
        if self.is_disposed() {
            tracing::debug!(webview = %self.title(), kind = %msg.kind, "drop message to disposed webview");
            return false;
        }
        tracing::debug!(webview = %self.title(), kind = %msg.kind, id = ?msg.correlation_id, "post message");
        if self.inner.outbound.send(msg).is_err() {
            tracing::debug!(webview = %self.title(), "surface channel closed");
            return false;
        }
        true
    }

    pub fn on_did_receive_message<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        self.inner.on_did_receive_message.subscribe(listener)
    }

    pub fn on_did_dispose<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&()) + Send + Sync + 'static,
    {
        self.inner.on_did_dispose.subscribe(listener)
    }

    /// Keeps `sub` alive until this webview is disposed.
    pub fn hold(&self, sub: Subscription) {
        if self.is_disposed() {
            return;
        }
        if let Ok(mut held) = self.inner.held.lock() {
            held.push(sub);
        }
    }

    /// Delivers one message coming from the surface.
    pub fn receive(&self, msg: InboundMessage) {
        if self.is_disposed() {
            return;
        }
        tracing::debug!(webview = %self.title(), kind = msg.kind(), "receive message");
        self.inner.on_did_receive_message.fire(&msg);
    }

    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!(webview = %self.title(), "webview disposed");
        self.inner.on_did_dispose.fire(&());
        self.inner.on_did_dispose.dispose();
        self.inner.on_did_receive_message.dispose();

        let held = match self.inner.held.lock() {
            Ok(mut held) => std::mem::take(&mut *held),
            Err(_) => Vec::new(),
        };
        drop(held);
    }
}

impl std::fmt::Debug for Webview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Webview")
            .field("title", &self.title())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Surface side of a [`Webview`] channel.
pub struct SurfaceEndpoint {
    webview: Webview,
    rx: mpsc::UnboundedReceiver<OutboundMessage>,
}

impl SurfaceEndpoint {
    pub fn webview(&self) -> &Webview {
        &self.webview
    }

    pub async fn recv(&mut self) -> Option<OutboundMessage> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<OutboundMessage> {
        self.rx.try_recv().ok()
    }

    pub fn send(&self, msg: InboundMessage) {
        self.webview.receive(msg);
    }

    /// Parses one JSON message and delivers it.
    pub fn send_json(&self, line: &str) -> Result<()> {
        let msg: InboundMessage =
            serde_json::from_str(line).map_err(|e| EditorError::Protocol(e.to_string()))?;
        self.send(msg);
        Ok(())
    }

    /// The surface went away.
    pub fn close(&self) {
        self.webview.dispose();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/webview/mod.rs"]
mod tests;
