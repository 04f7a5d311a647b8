//! ---
//! fl_section: "15-testing-qa-runbook"
//! fl_subsection: "integration-tests"
//! fl_type: "source"
//! fl_scope: "code"
//! fl_description: "Integration and validation tests for the framelink stack."
//! fl_version: "v0.0.0-prealpha"
//! fl_owner: "tbd"
//! ---
use std::sync::{Arc, Mutex};
use std::time::Duration;

use framelink_common::config::BridgeConfig;
use framelink_msg::types::{
    AddButtonActionClick, AddButtonActionTarget, AddButtonInitialClick, AddButtonTarget,
    EditElementClicked, ElementTarget, SdkInfo, SdkInitialized,
};
use framelink_msg::{
    InMemoryTransport, InboundMessage, InboundMessageType, MessageError, MessageService,
    MessagingMetricsExporter, OutboundMessage,
};
use serde_json::{json, Value as JsonValue};

/// Collects values observed by listeners.
#[derive(Default)]
struct Recorder<T>(Mutex<Vec<T>>);

impl<T: Clone> Recorder<T> {
    fn push(&self, value: T) {
        self.0.lock().expect("recorder lock").push(value);
    }

    fn values(&self) -> Vec<T> {
        self.0.lock().expect("recorder lock").clone()
    }
}

/// Scripted host: answers the two request types and ignores everything else.
fn answer(transport: &InMemoryTransport, request: &JsonValue) {
    match request["type"].as_str() {
        Some("sdk-initialized") => {
            transport.deliver(json!({
                "type": "initialized-response",
                "requestId": request["requestId"],
                "data": {"enabled": true, "locale": "de-DE"}
            }));
        }
        Some("add-button-initial-click") => {
            transport.deliver(json!({
                "type": "add-button-initial-response",
                "requestId": request["requestId"],
                "data": {"actions": [
                    {"id": "rich-text", "label": "Rich text"},
                    {"id": "image", "label": "Image"}
                ]}
            }));
        }
        _ => {}
    }
}

fn edit_title() -> OutboundMessage {
    OutboundMessage::EditElementClicked(EditElementClicked {
        data: ElementTarget {
            item_id: "landing".into(),
            field: Some("title".into()),
            locale: None,
        },
        metadata: None,
    })
}

fn sdk_handshake() -> OutboundMessage {
    OutboundMessage::SdkInitialized(SdkInitialized {
        request_id: None,
        data: SdkInfo {
            version: "3.1.0".into(),
        },
    })
}

#[tokio::test]
async fn frame_session_against_scripted_host() {
    let config = BridgeConfig::from_toml_str(
        r#"
[messaging]
trace_payloads = true
pending_warn_threshold = 4
"#,
    )
    .expect("valid config");
    let transport = Arc::new(InMemoryTransport::new());
    let service = MessageService::with_config(transport.clone(), config.messaging);
    let registry = prometheus::Registry::new();
    assert!(service.attach_metrics(
        MessagingMetricsExporter::register(&registry).expect("register metrics")
    ));
    assert!(service.listen());

    let statuses = Arc::new(Recorder::<bool>::default());
    let sink = statuses.clone();
    service.on(InboundMessageType::Status, move |message| {
        if let InboundMessage::Status(status) = message {
            sink.push(status.data.enabled);
        }
    });

    // Handshake.
    let handshake = service.send_message_with_response(sdk_handshake());
    let request = transport.recv().expect("handshake posted");
    answer(&transport, &request);
    match tokio::time::timeout(Duration::from_secs(1), handshake)
        .await
        .expect("handshake answered")
        .expect("handshake resolved")
    {
        InboundMessage::InitializedResponse(reply) => {
            assert!(reply.data.enabled);
            assert_eq!(reply.data.locale.as_deref(), Some("de-DE"));
        }
        other => panic!("unexpected handshake reply {other:?}"),
    }

    // Host pushes arrive between request and reply.
    let options = service.send_message_with_response(OutboundMessage::AddButtonInitialClick(
        AddButtonInitialClick {
            request_id: None,
            data: AddButtonTarget {
                item_id: "landing".into(),
                field: "body".into(),
                index: None,
            },
            metadata: None,
        },
    ));
    let request = transport.recv().expect("add-button request posted");
    transport.deliver(json!({"type": "status", "data": {"enabled": false}}));
    transport.deliver(json!({"type": "status", "data": {"enabled": true}}));
    answer(&transport, &request);

    let chosen = match options.await.expect("options resolved") {
        InboundMessage::AddButtonInitialResponse(reply) => reply.data.actions[1].id.clone(),
        other => panic!("unexpected options reply {other:?}"),
    };
    assert_eq!(chosen, "image");

    service
        .send_message(OutboundMessage::AddButtonActionClick(AddButtonActionClick {
            data: AddButtonActionTarget {
                target: AddButtonTarget {
                    item_id: "landing".into(),
                    field: "body".into(),
                    index: None,
                },
                action_id: chosen,
            },
            metadata: None,
        }))
        .expect("action click sent");
    let click = transport.recv().expect("action click posted");
    assert_eq!(click["type"], "add-button-action-click");
    assert_eq!(click["data"]["actionId"], "image");
    assert_eq!(click["data"]["itemId"], "landing");

    assert_eq!(statuses.values(), vec![false, true]);
    assert_eq!(service.pending_requests(), 0);

    let metrics = service.metrics();
    assert_eq!(metrics.sent, 3);
    assert_eq!(metrics.resolved, 2);
    assert_eq!(metrics.received, 4);

    let families = registry.gather();
    let sent = families
        .iter()
        .find(|family| family.get_name() == "framelink_messages_sent_total")
        .expect("sent counter exported");
    assert_eq!(sent.get_metric()[0].get_counter().get_value(), 3.0);
}

#[tokio::test]
async fn host_reload_keeps_outstanding_requests() {
    let transport = Arc::new(InMemoryTransport::new());
    let service = MessageService::new(transport.clone());
    service.listen();

    let refreshes = Arc::new(Recorder::<()>::default());
    let sink = refreshes.clone();
    service.on(InboundMessageType::RefreshPreview, move |_| sink.push(()));

    let handshake = service.send_message_with_response(sdk_handshake());
    let request = transport.recv().expect("handshake posted");

    // The frame tears down its subscriptions while the host is reloading.
    service.unlisten();
    transport.deliver(json!({"type": "refresh-preview"}));
    assert!(refreshes.values().is_empty());
    assert_eq!(service.pending_requests(), 1);

    service.listen();
    answer(&transport, &request);
    let reply = tokio::time::timeout(Duration::from_secs(1), handshake)
        .await
        .expect("answered after relisten")
        .expect("resolved");
    assert_eq!(reply.kind(), InboundMessageType::InitializedResponse);
}

#[test]
fn detached_frame_cannot_reach_host() {
    let transport = Arc::new(InMemoryTransport::detached());
    let service = MessageService::new(transport.clone());
    service.listen();
    assert!(matches!(
        service.send_message(edit_title()),
        Err(MessageError::InvalidEnvironment(_))
    ));

    transport.set_embedded(true);
    service
        .send_message(edit_title())
        .expect("send after embedding");
    let posted = transport.recv().expect("edit click posted");
    assert_eq!(posted["type"], "edit-element-clicked");
    assert_eq!(posted["data"]["field"], "title");
    assert!(posted.get("requestId").is_none());
}

#[test]
fn handshake_cannot_skip_correlation() {
    let transport = Arc::new(InMemoryTransport::new());
    let service = MessageService::new(transport.clone());
    assert!(matches!(
        service.send_message(sdk_handshake()),
        Err(MessageError::ResponseRequired(_))
    ));
    assert_eq!(transport.sent_count(), 0);
}
