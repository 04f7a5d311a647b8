//! ---
//! fl_section: "02-messaging-ipc-data-model"
//! fl_subsection: "module"
//! fl_type: "source"
//! fl_scope: "code"
//! fl_description: "Message schema helpers and protocol codecs."
//! fl_version: "v0.0.0-prealpha"
//! fl_owner: "tbd"
//! ---
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

/// Shared callback invoked for every emitted payload of one event name.
///
/// Identity is the `Arc` allocation: clone the handle to remove it later.
pub type Listener<P> = Arc<dyn Fn(&P) + Send + Sync>;

/// Wrap a closure into a [`Listener`] handle.
pub fn listener<P, F>(callback: F) -> Listener<P>
where
    F: Fn(&P) + Send + Sync + 'static,
{
    Arc::new(callback)
}

fn same_listener<P>(a: &Listener<P>, b: &Listener<P>) -> bool {
    // Compare data pointers only; vtable pointers may differ across codegen units.
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// Typed multi-listener dispatch keyed by a closed set of event names.
pub struct EventBus<K, P> {
    listeners: Mutex<HashMap<K, Vec<Listener<P>>>>,
}

impl<K, P> EventBus<K, P>
where
    K: Copy + Eq + Hash + fmt::Debug,
{
    /// Create a bus without registrations.
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
        }
    }

    /// Register a listener. Returns `false` if this exact handle was already registered.
    pub fn add_listener(&self, event: K, listener: Listener<P>) -> bool {
        let mut guard = self.listeners.lock();
        let entry = guard.entry(event).or_default();
        if entry.iter().any(|existing| same_listener(existing, &listener)) {
            return false;
        }
        entry.push(listener);
        true
    }

    /// Whether at least one listener is registered for `event`.
    pub fn has_listener(&self, event: K) -> bool {
        self.listener_count(event) > 0
    }

    /// Number of listeners registered for `event`.
    pub fn listener_count(&self, event: K) -> usize {
        self.listeners.lock().get(&event).map_or(0, Vec::len)
    }

    /// Unregister one listener. Removing an unknown handle is a no-op.
    pub fn remove_listener(&self, event: K, listener: &Listener<P>) -> bool {
        let mut guard = self.listeners.lock();
        let Some(entry) = guard.get_mut(&event) else {
            return false;
        };
        let before = entry.len();
        entry.retain(|existing| !same_listener(existing, listener));
        let removed = entry.len() != before;
        if entry.is_empty() {
            guard.remove(&event);
        }
        removed
    }

    /// Drop every registration for every event name.
    pub fn remove_all_listeners(&self) {
        self.listeners.lock().clear();
    }

    /// Invoke every listener currently registered for `event`.
    ///
    /// The registration set is snapshotted before dispatch, so listeners may add
    /// or remove registrations without affecting this emission. A panicking
    /// listener is logged and skipped; its siblings still run. Returns the
    /// number of listeners invoked.
    pub fn emit(&self, event: K, payload: &P) -> usize {
        let snapshot: Vec<Listener<P>> = match self.listeners.lock().get(&event) {
            Some(entry) => entry.clone(),
            None => return 0,
        };

        for listener in &snapshot {
            if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| listener(payload))) {
                tracing::error!(
                    event = ?event,
                    reason = panic_message(panic.as_ref()),
                    "event listener panicked"
                );
            }
        }
        snapshot.len()
    }
}

impl<K, P> Default for EventBus<K, P>
where
    K: Copy + Eq + Hash + fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
