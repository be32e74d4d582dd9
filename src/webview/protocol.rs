//! Messages exchanged with a rendering surface.
//!
//! Outbound: `{type, correlationId?, body}`. Inbound: `ready`, `stroke`, `response`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::Edit;

pub const INIT: &str = "init";
pub const UPDATE: &str = "update";
pub const GET_FILE_DATA: &str = "getFileData";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(
        rename = "correlationId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub correlation_id: Option<u64>,
    #[serde(default)]
    pub body: Value,
}

impl OutboundMessage {
    pub fn new(kind: impl Into<String>, body: Value) -> Self {
        Self {
            kind: kind.into(),
            correlation_id: None,
            body,
        }
    }

    pub fn request(kind: impl Into<String>, correlation_id: u64, body: Value) -> Self {
        Self {
            kind: kind.into(),
            correlation_id: Some(correlation_id),
            body,
        }
    }

    /// Full content push; the surface discards local state and reloads.
    pub fn init(content: &[u8], untitled: bool) -> Self {
        let body = if untitled {
            json!({ "value": content, "untitled": true })
        } else {
            json!({ "value": content })
        };
        Self::new(INIT, body)
    }

    /// Whole current history, not a diff.
    pub fn update(edits: &[Edit]) -> Self {
        Self::new(UPDATE, json!({ "edits": edits }))
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    /// `body.value` of an `init` message.
    pub fn init_value(&self) -> Option<Vec<u8>> {
        serde_json::from_value(self.body.get("value")?.clone()).ok()
    }

    /// `body.edits` of an `update` message.
    pub fn update_edits(&self) -> Option<Vec<Edit>> {
        serde_json::from_value(self.body.get("edits")?.clone()).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundMessage {
    /// Surface is listening and can take `init`.
    Ready,
    /// User drew a stroke.
    Stroke(Edit),
    /// Reply to a correlated request.
    Response {
        #[serde(rename = "correlationId")]
        correlation_id: u64,
        #[serde(default)]
        body: Value,
    },
}

impl InboundMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            InboundMessage::Ready => "ready",
            InboundMessage::Stroke(_) => "stroke",
            InboundMessage::Response { .. } => "response",
        }
    }
}

/// Body of the `response` to `getFileData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDataResponse {
    pub data: Vec<u8>,
}

#[cfg(test)]
#[path = "../../tests/unit/webview/protocol.rs"]
mod tests;
