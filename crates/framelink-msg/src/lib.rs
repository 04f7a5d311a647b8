//! ---
//! fl_section: "02-messaging-ipc-data-model"
//! fl_subsection: "module"
//! fl_type: "source"
//! fl_scope: "code"
//! fl_description: "Message schema helpers and protocol codecs."
//! fl_version: "v0.0.0-prealpha"
//! fl_owner: "tbd"
//! ---
//! Messaging between an embedded frame and its host.
//!
//! The frame talks to its host through an unordered, unacknowledged
//! [`Transport`]. [`MessageService`] layers fire-and-forget sends, correlated
//! request/response calls, and typed fan-out of host pushes on top of it.

pub mod deferred;
pub mod event_bus;
pub mod logging;
pub mod replay;
pub mod service;
pub mod transport;
pub mod types;

use crate::types::OutboundMessageType;

/// Shared result type for messaging operations.
pub type Result<T> = std::result::Result<T, MessageError>;

/// Errors surfaced by messaging operations.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// The operation needs a host context that is not present.
    #[error("invalid environment: {0}")]
    InvalidEnvironment(String),
    /// The transport refused the payload.
    #[error("transport `{transport}` unavailable: {reason}")]
    TransportUnavailable {
        /// Name of the failing transport.
        transport: &'static str,
        /// Reason reported by the transport.
        reason: String,
    },
    /// A request/response call was made with a message the host never answers.
    #[error("`{0}` messages do not expect a response")]
    NoResponseExpected(OutboundMessageType),
    /// A fire-and-forget send was attempted with a request variant.
    #[error("`{0}` messages must be sent with a response handler")]
    ResponseRequired(OutboundMessageType),
    /// Wrapper for IO errors encountered while reading captures.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Wrapper for JSON serialization or deserialization problems.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub use deferred::{Deferred, DeferredFuture};
pub use event_bus::{listener, EventBus, Listener};
pub use logging::{log_message, MessageDirection, MessagingMetricsExporter};
pub use replay::{replay_from_file, replay_from_reader, ReplaySummary};
pub use service::{
    DispatchOutcome, InboundListener, MessageService, MessagingMetrics, ResponseFuture,
};
pub use transport::{InMemoryTransport, InboundHandler, Subscription, Transport, TransportError};
pub use types::{InboundMessage, InboundMessageType, OutboundMessage, RequestId};
