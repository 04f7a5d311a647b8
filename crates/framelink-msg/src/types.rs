//! ---
//! fl_section: "02-messaging-ipc-data-model"
//! fl_subsection: "module"
//! fl_type: "source"
//! fl_scope: "code"
//! fl_description: "Message schema helpers and protocol codecs."
//! fl_version: "v0.0.0-prealpha"
//! fl_owner: "tbd"
//! ---
//! Closed message vocabulary exchanged between the embedded frame and its host.
//!
//! Both directions are internally tagged on the `type` field. Variants that take
//! part in a request/response exchange carry a `requestId`; pushes do not.
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque correlation identifier linking an outbound request to its reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Mint a fresh process-unique identifier.
    pub fn mint() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an identifier received from the wire.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty identifiers are treated as absent.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Discriminants of client to host messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutboundMessageType {
    AddButtonInitialClick,
    AddButtonActionClick,
    EditElementClicked,
    EditContentItemClicked,
    EditContentComponentClicked,
    SdkInitialized,
}

impl OutboundMessageType {
    /// Every outbound discriminant.
    pub const ALL: [OutboundMessageType; 6] = [
        OutboundMessageType::AddButtonInitialClick,
        OutboundMessageType::AddButtonActionClick,
        OutboundMessageType::EditElementClicked,
        OutboundMessageType::EditContentItemClicked,
        OutboundMessageType::EditContentComponentClicked,
        OutboundMessageType::SdkInitialized,
    ];

    /// Wire name of the discriminant.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboundMessageType::AddButtonInitialClick => "add-button-initial-click",
            OutboundMessageType::AddButtonActionClick => "add-button-action-click",
            OutboundMessageType::EditElementClicked => "edit-element-clicked",
            OutboundMessageType::EditContentItemClicked => "edit-content-item-clicked",
            OutboundMessageType::EditContentComponentClicked => "edit-content-component-clicked",
            OutboundMessageType::SdkInitialized => "sdk-initialized",
        }
    }

    /// Whether the host answers this message with a correlated reply.
    pub fn expects_response(&self) -> bool {
        matches!(
            self,
            OutboundMessageType::AddButtonInitialClick | OutboundMessageType::SdkInitialized
        )
    }
}

impl fmt::Display for OutboundMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discriminants of host to client messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InboundMessageType {
    AddButtonInitialResponse,
    InitializedResponse,
    Status,
    RefreshPreview,
}

impl InboundMessageType {
    /// Every inbound discriminant.
    pub const ALL: [InboundMessageType; 4] = [
        InboundMessageType::AddButtonInitialResponse,
        InboundMessageType::InitializedResponse,
        InboundMessageType::Status,
        InboundMessageType::RefreshPreview,
    ];

    /// Wire name of the discriminant.
    pub fn as_str(&self) -> &'static str {
        match self {
            InboundMessageType::AddButtonInitialResponse => "add-button-initial-response",
            InboundMessageType::InitializedResponse => "initialized-response",
            InboundMessageType::Status => "status",
            InboundMessageType::RefreshPreview => "refresh-preview",
        }
    }

    /// Whether the message answers a specific outbound request.
    pub fn is_reply(&self) -> bool {
        matches!(
            self,
            InboundMessageType::AddButtonInitialResponse | InboundMessageType::InitializedResponse
        )
    }
}

impl fmt::Display for InboundMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Viewport-relative bounding rectangle of a highlighted element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementRect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

/// Presentation hints attached to click messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementMetadata {
    pub rect: ElementRect,
}

/// Insertion point an add button represents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddButtonTarget {
    pub item_id: String,
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

/// An action chosen from the options the host offered for an add button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddButtonActionTarget {
    #[serde(flatten)]
    pub target: AddButtonTarget,
    pub action_id: String,
}

/// A single editable field inside a content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementTarget {
    pub item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItemTarget {
    pub item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentComponentTarget {
    pub item_id: String,
    pub component_id: String,
}

/// Announced by the frame once its messaging layer is listening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkInfo {
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddButtonInitialClick {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
    pub data: AddButtonTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ElementMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddButtonActionClick {
    pub data: AddButtonActionTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ElementMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditElementClicked {
    pub data: ElementTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ElementMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditContentItemClicked {
    pub data: ContentItemTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ElementMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditContentComponentClicked {
    pub data: ContentComponentTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ElementMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkInitialized {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
    pub data: SdkInfo,
}

/// Client to host message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutboundMessage {
    AddButtonInitialClick(AddButtonInitialClick),
    AddButtonActionClick(AddButtonActionClick),
    EditElementClicked(EditElementClicked),
    EditContentItemClicked(EditContentItemClicked),
    EditContentComponentClicked(EditContentComponentClicked),
    SdkInitialized(SdkInitialized),
}

impl OutboundMessage {
    /// Discriminant of this message.
    pub fn kind(&self) -> OutboundMessageType {
        match self {
            OutboundMessage::AddButtonInitialClick(_) => OutboundMessageType::AddButtonInitialClick,
            OutboundMessage::AddButtonActionClick(_) => OutboundMessageType::AddButtonActionClick,
            OutboundMessage::EditElementClicked(_) => OutboundMessageType::EditElementClicked,
            OutboundMessage::EditContentItemClicked(_) => {
                OutboundMessageType::EditContentItemClicked
            }
            OutboundMessage::EditContentComponentClicked(_) => {
                OutboundMessageType::EditContentComponentClicked
            }
            OutboundMessage::SdkInitialized(_) => OutboundMessageType::SdkInitialized,
        }
    }

    /// Correlation identifier, when one has been stamped.
    pub fn request_id(&self) -> Option<&RequestId> {
        match self {
            OutboundMessage::AddButtonInitialClick(msg) => msg.request_id.as_ref(),
            OutboundMessage::SdkInitialized(msg) => msg.request_id.as_ref(),
            OutboundMessage::AddButtonActionClick(_)
            | OutboundMessage::EditElementClicked(_)
            | OutboundMessage::EditContentItemClicked(_)
            | OutboundMessage::EditContentComponentClicked(_) => None,
        }
    }

    /// Stamp a correlation identifier onto a request variant.
    ///
    /// Returns `false` and leaves the message untouched for variants that never
    /// receive a reply.
    pub fn stamp_request_id(&mut self, id: RequestId) -> bool {
        match self {
            OutboundMessage::AddButtonInitialClick(msg) => {
                msg.request_id = Some(id);
                true
            }
            OutboundMessage::SdkInitialized(msg) => {
                msg.request_id = Some(id);
                true
            }
            OutboundMessage::AddButtonActionClick(_)
            | OutboundMessage::EditElementClicked(_)
            | OutboundMessage::EditContentItemClicked(_)
            | OutboundMessage::EditContentComponentClicked(_) => false,
        }
    }
}

/// Entry in the list of actions offered for an add button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddButtonOption {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddButtonOptions {
    #[serde(default)]
    pub actions: Vec<AddButtonOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializedData {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

/// Editing mode toggled by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusData {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddButtonInitialResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
    #[serde(default)]
    pub data: AddButtonOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializedResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
    pub data: InitializedData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub data: StatusData,
}

/// Host to client message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InboundMessage {
    AddButtonInitialResponse(AddButtonInitialResponse),
    InitializedResponse(InitializedResponse),
    Status(Status),
    RefreshPreview,
}

impl InboundMessage {
    /// Discriminant of this message.
    pub fn kind(&self) -> InboundMessageType {
        match self {
            InboundMessage::AddButtonInitialResponse(_) => {
                InboundMessageType::AddButtonInitialResponse
            }
            InboundMessage::InitializedResponse(_) => InboundMessageType::InitializedResponse,
            InboundMessage::Status(_) => InboundMessageType::Status,
            InboundMessage::RefreshPreview => InboundMessageType::RefreshPreview,
        }
    }

    /// Correlation identifier carried by a reply. Empty identifiers read as absent.
    pub fn request_id(&self) -> Option<&RequestId> {
        let id = match self {
            InboundMessage::AddButtonInitialResponse(msg) => msg.request_id.as_ref(),
            InboundMessage::InitializedResponse(msg) => msg.request_id.as_ref(),
            InboundMessage::Status(_) | InboundMessage::RefreshPreview => None,
        };
        id.filter(|id| !id.is_empty())
    }
}
