//! ---
//! fl_section: "02-messaging-ipc-data-model"
//! fl_subsection: "module"
//! fl_type: "source"
//! fl_scope: "code"
//! fl_description: "Message schema helpers and protocol codecs."
//! fl_version: "v0.0.0-prealpha"
//! fl_owner: "tbd"
//! ---
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value as JsonValue;

/// Callback receiving every raw inbound payload. `None` models an absent payload.
pub type InboundHandler = Arc<dyn Fn(Option<&JsonValue>) + Send + Sync>;

/// Failures reported by a [`Transport`] capability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// There is no host context to deliver to.
    #[error("not running inside an embedded context")]
    InvalidEnvironment,
    /// The channel refused the payload.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Cross-context delivery channel between an embedded frame and its host.
pub trait Transport: Send + Sync {
    /// Whether a counterpart context exists at all.
    fn is_embedded(&self) -> bool;
    /// Hand a raw payload to the counterpart.
    fn post_message_to_parent(&self, payload: JsonValue) -> Result<(), TransportError>;
    /// Register `handler` for every inbound payload until the subscription is dropped.
    fn on_message_received(&self, handler: InboundHandler) -> Subscription;
    /// Human-readable transport name for logging/metrics.
    fn name(&self) -> &'static str;
}

/// Registration guard returned by [`Transport::on_message_received`].
///
/// Dropping the guard, or calling [`Subscription::unsubscribe`], removes exactly
/// the registration it was created for.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Wrap the transport-specific removal routine.
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Remove the registration now.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[derive(Default)]
struct InMemoryState {
    embedded: AtomicBool,
    failure: Mutex<Option<String>>,
    outbox: Mutex<VecDeque<JsonValue>>,
    handlers: Mutex<Vec<(u64, InboundHandler)>>,
    next_handler: AtomicU64,
}

/// Loopback transport for tests, capture replay, and single-process integration.
///
/// Outbound payloads are queued for inspection with [`InMemoryTransport::recv`];
/// inbound payloads are pushed with [`InMemoryTransport::deliver`], which invokes
/// every registered handler synchronously on the caller's thread.
#[derive(Clone)]
pub struct InMemoryTransport {
    state: Arc<InMemoryState>,
}

impl InMemoryTransport {
    /// Create a transport that reports an embedded context.
    pub fn new() -> Self {
        let transport = Self {
            state: Arc::new(InMemoryState::default()),
        };
        transport.set_embedded(true);
        transport
    }

    /// Create a transport with no counterpart context.
    pub fn detached() -> Self {
        let transport = Self::new();
        transport.set_embedded(false);
        transport
    }

    /// Toggle whether a counterpart context exists.
    pub fn set_embedded(&self, embedded: bool) {
        self.state.embedded.store(embedded, Ordering::SeqCst);
    }

    /// Make every subsequent send fail with `reason`; `None` restores delivery.
    pub fn fail_sends(&self, reason: Option<&str>) {
        *self.state.failure.lock() = reason.map(str::to_owned);
    }

    /// Pop the oldest payload posted to the host.
    pub fn recv(&self) -> Option<JsonValue> {
        self.state.outbox.lock().pop_front()
    }

    /// Number of payloads posted and not yet received.
    pub fn sent_count(&self) -> usize {
        self.state.outbox.lock().len()
    }

    /// Number of live inbound registrations.
    pub fn handler_count(&self) -> usize {
        self.state.handlers.lock().len()
    }

    /// Deliver a payload from the host to every registered handler.
    pub fn deliver(&self, payload: JsonValue) -> usize {
        self.deliver_raw(Some(payload))
    }

    /// Deliver a possibly absent payload. Returns the number of handlers invoked.
    pub fn deliver_raw(&self, payload: Option<JsonValue>) -> usize {
        let handlers: Vec<InboundHandler> = self
            .state
            .handlers
            .lock()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in &handlers {
            handler(payload.as_ref());
        }
        handlers.len()
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for InMemoryTransport {
    fn is_embedded(&self) -> bool {
        self.state.embedded.load(Ordering::SeqCst)
    }

    fn post_message_to_parent(&self, payload: JsonValue) -> Result<(), TransportError> {
        if !self.is_embedded() {
            return Err(TransportError::InvalidEnvironment);
        }
        if let Some(reason) = self.state.failure.lock().clone() {
            return Err(TransportError::Delivery(reason));
        }
        self.state.outbox.lock().push_back(payload);
        Ok(())
    }

    fn on_message_received(&self, handler: InboundHandler) -> Subscription {
        let id = self.state.next_handler.fetch_add(1, Ordering::SeqCst);
        self.state.handlers.lock().push((id, handler));

        let state = Arc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                state.handlers.lock().retain(|(existing, _)| *existing != id);
            }
        })
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn counting_handler(counter: &Arc<AtomicUsize>) -> InboundHandler {
        let counter = counter.clone();
        Arc::new(move |_payload: Option<&JsonValue>| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn in_memory_transport_send_and_recv() {
        let transport = InMemoryTransport::new();
        transport
            .post_message_to_parent(json!({"type": "sdk-initialized"}))
            .expect("send succeeds");
        assert_eq!(transport.sent_count(), 1);
        let received = transport.recv().expect("message available");
        assert_eq!(received["type"], "sdk-initialized");
        assert!(transport.recv().is_none());
    }

    #[test]
    fn detached_transport_rejects_sends() {
        let transport = InMemoryTransport::detached();
        assert!(!transport.is_embedded());
        assert_eq!(
            transport.post_message_to_parent(json!({})),
            Err(TransportError::InvalidEnvironment)
        );
        assert_eq!(transport.sent_count(), 0);
    }

    #[test]
    fn injected_failure_reports_delivery_error() {
        let transport = InMemoryTransport::new();
        transport.fail_sends(Some("channel closed"));
        assert_eq!(
            transport.post_message_to_parent(json!({})),
            Err(TransportError::Delivery("channel closed".into()))
        );
        transport.fail_sends(None);
        assert!(transport.post_message_to_parent(json!({})).is_ok());
    }

    #[test]
    fn unsubscribe_removes_only_its_registration() {
        let transport = InMemoryTransport::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let sub_a = transport.on_message_received(counting_handler(&first));
        let _sub_b = transport.on_message_received(counting_handler(&second));

        assert_eq!(transport.deliver(json!({"type": "status"})), 2);
        sub_a.unsubscribe();
        assert_eq!(transport.handler_count(), 1);
        transport.deliver(json!({"type": "status"}));

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let transport = InMemoryTransport::new();
        let count = Arc::new(AtomicUsize::new(0));
        {
            let _sub = transport.on_message_received(counting_handler(&count));
            assert_eq!(transport.handler_count(), 1);
        }
        assert_eq!(transport.handler_count(), 0);
        assert_eq!(transport.deliver_raw(None), 0);
    }

    #[test]
    fn clones_share_the_same_channel() {
        let transport = InMemoryTransport::new();
        let host_view = transport.clone();
        transport
            .post_message_to_parent(json!({"type": "edit-element-clicked"}))
            .expect("send succeeds");
        assert!(host_view.recv().is_some());
    }
}
