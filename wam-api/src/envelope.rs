//! Decoded device messages
//!
//! Every message body pushed by a speaker is a small markup document:
//!
//! ```text
//! <UIC>
//!   <method>VolumeLevel</method>
//!   <version>1.0</version>
//!   <speakerip>192.168.1.100</speakerip>
//!   <user_identifier>public</user_identifier>
//!   <response result="ok"><volume>15</volume></response>
//! </UIC>
//! ```
//!
//! [`Envelope::decode`] never fails. Malformed input yields an error
//! envelope so that the receive loop keeps running.

use std::fmt;

use xmltree::Element;

use crate::tree::{AttributeMap, AttributeValue};

/// Root tag of a decoded message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum EnvelopeKind {
    Uic,
    Cpm,
    /// Any other root tag, including none for error envelopes
    #[default]
    Other,
}

impl EnvelopeKind {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "UIC" => EnvelopeKind::Uic,
            "CPM" => EnvelopeKind::Cpm,
            _ => EnvelopeKind::Other,
        }
    }
}

/// A decoded device message
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    /// Body exactly as received
    pub raw: String,
    pub kind: EnvelopeKind,
    pub method: String,
    /// Identity token of the client the message answers, or `public`
    pub sender_id: String,
    pub version: String,
    pub source_ip: String,
    /// `true` when the payload's `@result` marker is `ok`
    pub success: bool,
    pub payload: AttributeMap,
    pub error_message: Option<String>,
    pub error_detail: Option<String>,
}

impl Envelope {
    /// Decode one message body
    pub fn decode(body: &str) -> Self {
        match Element::parse(body.as_bytes()) {
            Ok(root) => Self::from_root(body, &root),
            Err(e) => {
                tracing::warn!("Failed to decode message body: {}", e);
                Self::error(body, "ApiDecodingError", &e.to_string())
            }
        }
    }

    fn from_root(body: &str, root: &Element) -> Self {
        let tree = AttributeValue::from_element(root);
        let field = |name: &str| {
            tree.get(name)
                .and_then(AttributeValue::as_str)
                .unwrap_or_default()
                .to_string()
        };

        // Some firmware answers with `async_response` instead of `response`.
        let payload = tree
            .get("response")
            .or_else(|| tree.get("async_response"))
            .and_then(AttributeValue::as_map)
            .cloned()
            .unwrap_or_default();

        let success = payload
            .get("@result")
            .and_then(AttributeValue::as_str)
            .is_some_and(|result| result == "ok");

        Self {
            raw: body.to_string(),
            kind: EnvelopeKind::from_tag(&root.name),
            method: field("method"),
            sender_id: field("user_identifier"),
            version: field("version"),
            source_ip: field("speakerip"),
            success,
            payload,
            error_message: None,
            error_detail: None,
        }
    }

    /// Envelope standing in for a message that could not be decoded
    pub fn error(raw: &str, message: &str, detail: &str) -> Self {
        Self {
            raw: raw.to_string(),
            error_message: Some(message.to_string()),
            error_detail: Some(detail.to_string()),
            ..Self::default()
        }
    }

    /// Result of a command that expects no reply
    pub fn empty_success() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error_message.is_some()
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.payload.get(key)
    }

    /// Text value of a payload field
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttributeValue::as_str)
    }

    pub fn get_subkey(&self, key: &str, subkey: &str) -> Option<&AttributeValue> {
        self.get(key).and_then(|value| value.get(subkey))
    }

    /// Entries under `key/subkey` as a list, whether the device sent one or many
    pub fn items(&self, key: &str, subkey: &str) -> Vec<&AttributeValue> {
        self.get_subkey(key, subkey)
            .map(AttributeValue::items)
            .unwrap_or_default()
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_message {
            Some(message) => write!(f, "error envelope: {message}"),
            None => write!(
                f,
                "{} from {} (success: {})",
                if self.method.is_empty() { "<none>" } else { &self.method },
                if self.source_ip.is_empty() { "<unknown>" } else { &self.source_ip },
                self.success
            ),
        }
    }
}
