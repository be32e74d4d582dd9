//! Which webviews show which document.
//!
//! Multimap keyed by exact resource identity. An entry removes itself when its
//! webview is disposed.

use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};

use super::Webview;
use crate::core::Subscription;
use crate::error::{EditorError, Result};
use crate::models::ResourceUri;

struct Entry {
    webview: Webview,
    _on_dispose: Subscription,
}

#[derive(Clone, Default)]
pub struct WebviewRegistry {
    entries: Arc<Mutex<FxHashMap<ResourceUri, Vec<Entry>>>>,
}

impl WebviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, uri: &ResourceUri, webview: Webview) {
        if webview.is_disposed() {
            tracing::debug!(uri = %uri, webview = %webview.title(), "skip disposed webview");
            return;
        }

        let weak_entries = Arc::downgrade(&self.entries);
        let key = uri.clone();
        let target = webview.downgrade();
        let on_dispose = webview.on_did_dispose(move |_| {
            let (Some(entries), Some(target)) = (weak_entries.upgrade(), target.upgrade()) else {
                return;
            };
            let removed = {
                let Ok(mut entries) = entries.lock() else {
                    return;
                };
                remove_entry(&mut entries, &key, &target)
            };
            drop(removed);
        });

        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        entries.entry(uri.clone()).or_default().push(Entry {
            webview,
            _on_dispose: on_dispose,
        });
    }

    /// Snapshot of the webviews bound to `uri` right now, in no particular
    /// order. Later additions are not observed by the returned iterator.
    pub fn get(&self, uri: &ResourceUri) -> impl Iterator<Item = Webview> {
        let snapshot: Vec<Webview> = match self.entries.lock() {
            Ok(entries) => entries
                .get(uri)
                .map(|list| list.iter().map(|e| e.webview.clone()).collect())
                .unwrap_or_default(),
            Err(_) => Vec::new(),
        };
        snapshot.into_iter()
    }

    /// Any one bound webview.
    pub fn first(&self, uri: &ResourceUri) -> Result<Webview> {
        self.get(uri)
            .next()
            .ok_or_else(|| EditorError::NoViewAvailable(uri.to_string()))
    }

    pub fn count(&self, uri: &ResourceUri) -> usize {
        self.entries
            .lock()
            .map(|entries| entries.get(uri).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().map(|e| e.is_empty()).unwrap_or(true)
    }
}

fn remove_entry(
    entries: &mut FxHashMap<ResourceUri, Vec<Entry>>,
    uri: &ResourceUri,
    target: &Webview,
) -> Vec<Entry> {
    let Some(list) = entries.get_mut(uri) else {
        return Vec::new();
    };
    let (removed, kept): (Vec<Entry>, Vec<Entry>) =
        std::mem::take(list).into_iter().partition(|e| e.webview.same(target));
    if kept.is_empty() {
        entries.remove(uri);
    } else {
        *list = kept;
    }
    removed
}

#[cfg(test)]
#[path = "../../tests/unit/webview/registry.rs"]
mod tests;
