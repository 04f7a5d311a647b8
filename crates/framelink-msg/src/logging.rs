//! ---
//! fl_section: "02-messaging-ipc-data-model"
//! fl_subsection: "module"
//! fl_type: "source"
//! fl_scope: "code"
//! fl_description: "Message schema helpers and protocol codecs."
//! fl_version: "v0.0.0-prealpha"
//! fl_owner: "tbd"
//! ---
use std::time::Duration;

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry};
use serde_json::Value as JsonValue;
use tracing::{debug, trace};

use crate::types::RequestId;

/// Direction of the message movement, used for consistent logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDirection {
    /// Message posted to the host.
    Outbound,
    /// Message received from the host.
    Inbound,
}

/// Emit a structured log entry for message activity.
pub fn log_message(direction: MessageDirection, kind: &str, request_id: Option<&RequestId>) {
    debug!(
        kind,
        request_id = request_id.map(RequestId::as_str).unwrap_or(""),
        direction = ?direction,
        "messaging activity"
    );
}

/// Emit the full message body at trace level.
pub fn trace_payload(direction: MessageDirection, payload: &JsonValue) {
    trace!(direction = ?direction, payload = %payload, "message payload");
}

/// Prometheus metric handles for messaging activity.
pub struct MessagingMetricsExporter {
    sent: IntCounter,
    received: IntCounter,
    discarded: IntCounter,
    resolved: IntCounter,
    failed: IntCounter,
    pending: IntGauge,
    latency: Histogram,
}

impl MessagingMetricsExporter {
    /// Register messaging metrics with the provided registry.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let sent = IntCounter::with_opts(Opts::new(
            "framelink_messages_sent_total",
            "Messages handed to the transport",
        ))?;
        let received = IntCounter::with_opts(Opts::new(
            "framelink_messages_received_total",
            "Inbound messages dispatched on the event bus",
        ))?;
        let discarded = IntCounter::with_opts(Opts::new(
            "framelink_messages_discarded_total",
            "Inbound payloads dropped as empty, foreign or malformed",
        ))?;
        let resolved = IntCounter::with_opts(Opts::new(
            "framelink_requests_resolved_total",
            "Pending requests completed by a matching reply",
        ))?;
        let failed = IntCounter::with_opts(Opts::new(
            "framelink_requests_failed_total",
            "Requests rejected because the send attempt failed",
        ))?;
        let pending = IntGauge::with_opts(Opts::new(
            "framelink_requests_pending",
            "Requests awaiting a reply",
        ))?;
        let latency = Histogram::with_opts(HistogramOpts::new(
            "framelink_request_roundtrip_seconds",
            "Observed latency between sending a request and dispatching its reply",
        ))?;

        registry.register(Box::new(sent.clone()))?;
        registry.register(Box::new(received.clone()))?;
        registry.register(Box::new(discarded.clone()))?;
        registry.register(Box::new(resolved.clone()))?;
        registry.register(Box::new(failed.clone()))?;
        registry.register(Box::new(pending.clone()))?;
        registry.register(Box::new(latency.clone()))?;

        Ok(Self {
            sent,
            received,
            discarded,
            resolved,
            failed,
            pending,
            latency,
        })
    }

    pub fn observe_sent(&self) {
        self.sent.inc();
    }

    pub fn observe_received(&self) {
        self.received.inc();
    }

    pub fn observe_discarded(&self) {
        self.discarded.inc();
    }

    /// Record a reply that completed a request after `elapsed`.
    pub fn observe_resolved(&self, elapsed: Duration) {
        self.resolved.inc();
        self.latency.observe(elapsed.as_secs_f64());
    }

    pub fn observe_failed(&self) {
        self.failed.inc();
    }

    /// Publish the current pending-table size.
    pub fn set_pending(&self, pending: usize) {
        self.pending.set(pending as i64);
    }
}
