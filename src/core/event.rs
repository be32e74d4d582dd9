//! 事件分发（发布/订阅）
//!
//! 每种通知一个 `Emitter<T>`；订阅返回 `Subscription`，drop 即退订。
//! `dispose()` 之后不再派发任何事件，新的订阅直接失效。

use slotmap::{DefaultKey, SlotMap};
use std::sync::{Arc, Mutex, Weak};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct EmitterState<T> {
    listeners: SlotMap<DefaultKey, Listener<T>>,
    disposed: bool,
}

pub struct Emitter<T> {
    state: Arc<Mutex<EmitterState<T>>>,
}

impl<T: 'static> Emitter<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(EmitterState {
                listeners: SlotMap::new(),
                disposed: false,
            })),
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let Ok(mut state) = self.state.lock() else {
            return Subscription::empty();
        };
        if state.disposed {
            return Subscription::empty();
        }
        let key = state.listeners.insert(Arc::new(listener));
        drop(state);

        let weak: Weak<Mutex<EmitterState<T>>> = Arc::downgrade(&self.state);
        Subscription::new(move || {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let removed = match state.lock() {
                Ok(mut state) => state.listeners.remove(key),
                Err(_) => None,
            };
            drop(removed);
        })
    }

    /// Calls every listener registered at the time of the call. The lock is
    /// released first, so listeners may subscribe, unsubscribe or fire again.
    pub fn fire(&self, event: &T) -> usize {
        let listeners: Vec<Listener<T>> = {
            let Ok(state) = self.state.lock() else {
                return 0;
            };
            if state.disposed {
                return 0;
            }
            state.listeners.values().cloned().collect()
        };

        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }

    pub fn dispose(&self) {
        let dropped = {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            state.disposed = true;
            std::mem::take(&mut state.listeners)
        };
        drop(dropped);
    }

    pub fn is_disposed(&self) -> bool {
        self.state.lock().map(|s| s.disposed).unwrap_or(true)
    }

    pub fn listener_count(&self) -> usize {
        self.state.lock().map(|s| s.listeners.len()).unwrap_or(0)
    }
}

impl<T: 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Unsubscribe handle. Dropping it (or calling [`Subscription::dispose`])
/// removes the listener; disposing twice is a no-op.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new<F>(unsubscribe: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    pub fn empty() -> Self {
        Self { unsubscribe: None }
    }

    pub fn is_active(&self) -> bool {
        self.unsubscribe.is_some()
    }

    pub fn dispose(&mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/core/event.rs"]
mod tests;
