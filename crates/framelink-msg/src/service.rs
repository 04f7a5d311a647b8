//! ---
//! fl_section: "02-messaging-ipc-data-model"
//! fl_subsection: "module"
//! fl_type: "source"
//! fl_scope: "code"
//! fl_description: "Message schema helpers and protocol codecs."
//! fl_version: "v0.0.0-prealpha"
//! fl_owner: "tbd"
//! ---
//! Protocol engine binding one [`Transport`] to an event bus and a
//! pending-request table.
//!
//! Requests never time out. A request whose reply never arrives stays pending
//! until the service is dropped, and even then its future is not rejected;
//! callers needing a bound wrap the future in their own timeout. `unlisten`
//! clears listeners but leaves pending requests untouched, so a later `listen`
//! can still complete them.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use framelink_common::config::MessagingConfig;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::deferred::{Deferred, DeferredFuture};
use crate::event_bus::{listener, EventBus, Listener};
use crate::logging::{log_message, trace_payload, MessageDirection, MessagingMetricsExporter};
use crate::transport::{InboundHandler, Subscription, Transport, TransportError};
use crate::types::{InboundMessage, InboundMessageType, OutboundMessage, RequestId};
use crate::{MessageError, Result};

/// Awaitable returned by [`MessageService::send_message_with_response`].
pub type ResponseFuture = DeferredFuture<InboundMessage, MessageError>;

/// Listener handle for inbound messages.
pub type InboundListener = Listener<InboundMessage>;

/// Snapshot of messaging counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MessagingMetrics {
    /// Messages successfully handed to the transport.
    pub sent: u64,
    /// Inbound messages fanned out on the event bus.
    pub received: u64,
    /// Inbound payloads dropped as empty or malformed.
    pub discarded: u64,
    /// Requests completed by a matching reply.
    pub resolved: u64,
    /// Replies whose correlation id matched no pending request.
    pub stale: u64,
    /// Requests rejected because the send attempt failed.
    pub failed: u64,
}

#[derive(Default)]
struct Counters {
    sent: AtomicU64,
    received: AtomicU64,
    discarded: AtomicU64,
    resolved: AtomicU64,
    stale: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> MessagingMetrics {
        MessagingMetrics {
            sent: self.sent.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            resolved: self.resolved.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// What happened to one inbound payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Empty, foreign, or malformed payload; nothing observed it.
    Discarded,
    /// Fanned out on the event bus.
    Delivered {
        kind: InboundMessageType,
        /// Number of listeners invoked.
        listeners: usize,
        /// Whether a pending request was completed.
        resolved: bool,
    },
}

struct PendingRequest {
    deferred: Deferred<InboundMessage, MessageError>,
    issued_at: Instant,
}

/// State reachable from the transport callback.
struct Shared {
    bus: EventBus<InboundMessageType, InboundMessage>,
    pending: Mutex<HashMap<RequestId, PendingRequest>>,
    counters: Counters,
    config: MessagingConfig,
    exporter: OnceCell<MessagingMetricsExporter>,
}

impl Shared {
    fn dispatch(&self, payload: Option<&JsonValue>) -> DispatchOutcome {
        let Some(payload) = payload.filter(|payload| !payload.is_null()) else {
            self.discard("empty payload");
            return DispatchOutcome::Discarded;
        };
        if self.config.trace_payloads {
            trace_payload(MessageDirection::Inbound, payload);
        }

        let message = match InboundMessage::deserialize(payload) {
            Ok(message) => message,
            Err(err) => {
                self.discard(&err.to_string());
                return DispatchOutcome::Discarded;
            }
        };

        let kind = message.kind();
        log_message(MessageDirection::Inbound, kind.as_str(), message.request_id());
        self.counters.received.fetch_add(1, Ordering::Relaxed);
        if let Some(exporter) = self.exporter.get() {
            exporter.observe_received();
        }

        let listeners = self.bus.emit(kind, &message);
        let resolved = self.resolve_pending(message);

        DispatchOutcome::Delivered {
            kind,
            listeners,
            resolved,
        }
    }

    fn resolve_pending(&self, message: InboundMessage) -> bool {
        let Some(request_id) = message.request_id().cloned() else {
            return false;
        };

        let (entry, remaining) = {
            let mut pending = self.pending.lock();
            let entry = pending.remove(&request_id);
            (entry, pending.len())
        };

        let Some(entry) = entry else {
            debug!(request_id = %request_id, kind = message.kind().as_str(), "reply matched no pending request");
            self.counters.stale.fetch_add(1, Ordering::Relaxed);
            return false;
        };

        let elapsed = entry.issued_at.elapsed();
        entry.deferred.resolve(message);
        self.counters.resolved.fetch_add(1, Ordering::Relaxed);
        if let Some(exporter) = self.exporter.get() {
            exporter.observe_resolved(elapsed);
            exporter.set_pending(remaining);
        }
        true
    }

    fn discard(&self, reason: &str) {
        debug!(reason, "discarding inbound payload");
        self.counters.discarded.fetch_add(1, Ordering::Relaxed);
        if let Some(exporter) = self.exporter.get() {
            exporter.observe_discarded();
        }
    }
}

/// Fire-and-forget sends, correlated request/response calls, and typed
/// subscriptions for unsolicited host pushes.
pub struct MessageService {
    transport: Arc<dyn Transport>,
    shared: Arc<Shared>,
    subscription: Mutex<Option<Subscription>>,
}

impl MessageService {
    /// Bind a service to `transport` with default settings.
    pub fn new<T>(transport: Arc<T>) -> Self
    where
        T: Transport + 'static,
    {
        Self::with_config(transport, MessagingConfig::default())
    }

    /// Bind a service to `transport`.
    pub fn with_config<T>(transport: Arc<T>, config: MessagingConfig) -> Self
    where
        T: Transport + 'static,
    {
        Self {
            transport: transport as Arc<dyn Transport>,
            shared: Arc::new(Shared {
                bus: EventBus::new(),
                pending: Mutex::new(HashMap::new()),
                counters: Counters::default(),
                config,
                exporter: OnceCell::new(),
            }),
            subscription: Mutex::new(None),
        }
    }

    /// Attach a Prometheus exporter. Only the first exporter is kept.
    pub fn attach_metrics(&self, exporter: MessagingMetricsExporter) -> bool {
        if !self.shared.config.metrics_enabled {
            debug!("metrics disabled by configuration; exporter ignored");
            return false;
        }
        self.shared.exporter.set(exporter).is_ok()
    }

    /// Post a message to the host without waiting for a reply.
    ///
    /// Request variants are refused; they need a correlation id and go through
    /// [`MessageService::send_message_with_response`].
    pub fn send_message(&self, message: OutboundMessage) -> Result<()> {
        let kind = message.kind();
        if kind.expects_response() {
            return Err(MessageError::ResponseRequired(kind));
        }
        self.post(&message)
    }

    /// Post a request and return a future completed by the matching reply.
    ///
    /// Failures to send reject the returned future immediately and leave no
    /// entry in the pending table. The future never completes if the host does
    /// not answer.
    pub fn send_message_with_response(&self, mut message: OutboundMessage) -> ResponseFuture {
        let (deferred, future) = Deferred::channel();
        let kind = message.kind();
        let request_id = RequestId::mint();

        if !message.stamp_request_id(request_id.clone()) {
            deferred.reject(MessageError::NoResponseExpected(kind));
            return future;
        }

        let pending = {
            let mut table = self.shared.pending.lock();
            table.insert(
                request_id.clone(),
                PendingRequest {
                    deferred,
                    issued_at: Instant::now(),
                },
            );
            table.len()
        };
        if pending > self.shared.config.pending_warn_threshold {
            warn!(
                pending,
                threshold = self.shared.config.pending_warn_threshold,
                "pending request table above threshold; replies may be missing"
            );
        }
        if let Some(exporter) = self.shared.exporter.get() {
            exporter.set_pending(pending);
        }

        if let Err(err) = self.post(&message) {
            let entry = self.shared.pending.lock().remove(&request_id);
            self.shared.counters.failed.fetch_add(1, Ordering::Relaxed);
            if let Some(exporter) = self.shared.exporter.get() {
                exporter.observe_failed();
                exporter.set_pending(self.pending_requests());
            }
            if let Some(entry) = entry {
                entry.deferred.reject(err);
            }
        }

        future
    }

    fn post(&self, message: &OutboundMessage) -> Result<()> {
        let kind = message.kind();
        if !self.transport.is_embedded() {
            return Err(MessageError::InvalidEnvironment(format!(
                "cannot send `{kind}`: no host context"
            )));
        }

        let payload = serde_json::to_value(message)?;
        if self.shared.config.trace_payloads {
            trace_payload(MessageDirection::Outbound, &payload);
        }

        self.transport
            .post_message_to_parent(payload)
            .map_err(|err| match err {
                TransportError::InvalidEnvironment => MessageError::InvalidEnvironment(format!(
                    "cannot send `{kind}`: no host context"
                )),
                TransportError::Delivery(reason) => MessageError::TransportUnavailable {
                    transport: self.transport.name(),
                    reason,
                },
            })?;

        log_message(MessageDirection::Outbound, kind.as_str(), message.request_id());
        self.shared.counters.sent.fetch_add(1, Ordering::Relaxed);
        if let Some(exporter) = self.shared.exporter.get() {
            exporter.observe_sent();
        }
        Ok(())
    }

    /// Subscribe to the transport's inbound channel.
    ///
    /// Returns `false` without registering again when already listening.
    pub fn listen(&self) -> bool {
        let mut subscription = self.subscription.lock();
        if subscription.is_some() {
            debug!(transport = self.transport.name(), "already listening");
            return false;
        }

        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        let handler: InboundHandler = Arc::new(move |payload: Option<&JsonValue>| {
            if let Some(shared) = shared.upgrade() {
                shared.dispatch(payload);
            }
        });
        *subscription = Some(self.transport.on_message_received(handler));
        debug!(transport = self.transport.name(), "listening for host messages");
        true
    }

    /// Unsubscribe from the transport and drop every event listener.
    ///
    /// Pending requests are kept.
    pub fn unlisten(&self) {
        let subscription = self.subscription.lock().take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
            debug!(transport = self.transport.name(), "stopped listening");
        }
        self.shared.bus.remove_all_listeners();
    }

    pub fn is_listening(&self) -> bool {
        self.subscription.lock().is_some()
    }

    /// Process one raw inbound payload, exactly as the transport callback does.
    pub fn dispatch(&self, payload: Option<&JsonValue>) -> DispatchOutcome {
        self.shared.dispatch(payload)
    }

    /// Register a listener for one inbound message type.
    pub fn add_listener(&self, kind: InboundMessageType, listener: InboundListener) -> bool {
        self.shared.bus.add_listener(kind, listener)
    }

    /// Register a closure and return its handle for later removal.
    pub fn on<F>(&self, kind: InboundMessageType, callback: F) -> InboundListener
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        let handle = listener(callback);
        self.shared.bus.add_listener(kind, handle.clone());
        handle
    }

    pub fn remove_listener(&self, kind: InboundMessageType, listener: &InboundListener) -> bool {
        self.shared.bus.remove_listener(kind, listener)
    }

    pub fn has_listener(&self, kind: InboundMessageType) -> bool {
        self.shared.bus.has_listener(kind)
    }

    /// Number of requests awaiting a reply.
    pub fn pending_requests(&self) -> usize {
        self.shared.pending.lock().len()
    }

    /// Whether `request_id` still awaits a reply.
    pub fn is_pending(&self, request_id: &RequestId) -> bool {
        self.shared.pending.lock().contains_key(request_id)
    }

    /// Return the current counter snapshot.
    pub fn metrics(&self) -> MessagingMetrics {
        self.shared.counters.snapshot()
    }
}
