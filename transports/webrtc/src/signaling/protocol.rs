//! Signaling message types
//!
//! Messages are JSON objects discriminated by a `type` field:
//!
//! - outbound `watch`: `{"type":"watch","params":{"orientation":0,"audio":true,"mic":false}}`
//! - outbound `answer`: `{"type":"answer","sdp":{"type":"answer","sdp":"v=0..."}}`
//! - inbound `offer`: `{"type":"offer","sdp":"v=0..."}`
//! - inbound `ice-candidate`: `{"type":"ice-candidate","candidate":"...","sdpMid":"0","sdpMLineIndex":0}`
//! - inbound `error`: `{"type":"error","error":"Streamer not ready"}`
//!
//! Any other inbound `type` decodes to [`InboundMessage::Other`] and is ignored.

use crate::config::SessionOptions;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of a session description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
    Pranswer,
    Rollback,
}

/// A session description as carried over signaling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

/// Remote ICE candidate fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,

    #[serde(
        default,
        rename = "sdpMLineIndex",
        skip_serializing_if = "Option::is_none"
    )]
    pub sdp_mline_index: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

/// Parameters of the `watch` request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchParams {
    pub orientation: u16,
    pub audio: bool,
    pub mic: bool,
}

impl From<&SessionOptions> for WatchParams {
    fn from(options: &SessionOptions) -> Self {
        Self {
            orientation: options.orientation(),
            audio: options.allow_audio(),
            mic: options.allow_mic(),
        }
    }
}

/// Messages sent to the signaling server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutboundMessage {
    /// Ask the server to start streaming to this viewer
    Watch { params: WatchParams },

    /// Local answer to the server's offer
    Answer { sdp: SessionDescription },
}

impl OutboundMessage {
    pub fn watch(options: &SessionOptions) -> Self {
        Self::Watch {
            params: WatchParams::from(options),
        }
    }

    pub fn answer(sdp: SessionDescription) -> Self {
        Self::Answer { sdp }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Messages received from the signaling server
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Remote offer to negotiate against
    Offer(SessionDescription),

    /// Remote ICE candidate
    IceCandidate(IceCandidate),

    /// Error reported by the server (e.g. streamer not ready)
    ServerError(String),

    /// Any other message type; carries the `type` value
    Other(String),
}

impl InboundMessage {
    /// Message type for logging
    pub fn kind(&self) -> &str {
        match self {
            Self::Offer(_) => "offer",
            Self::IceCandidate(_) => "ice-candidate",
            Self::ServerError(_) => "error",
            Self::Other(kind) => kind,
        }
    }
}

/// `sdp` of an inbound offer: either the bare SDP text or a full description
#[derive(Deserialize)]
#[serde(untagged)]
enum OfferSdp {
    Text(String),
    Description { sdp: String },
}

#[derive(Deserialize)]
struct OfferEnvelope {
    sdp: OfferSdp,
}

/// Decode one inbound text frame
///
/// # Errors
///
/// Returns an error for malformed JSON, a payload that is not an object, a
/// missing `type`, or an `offer`/`ice-candidate` whose fields do not decode.
pub fn decode_inbound(text: &str) -> Result<InboundMessage> {
    let value: Value = serde_json::from_str(text)?;

    let kind = value
        .as_object()
        .ok_or_else(|| Error::InvalidMessage("expected a JSON object".to_string()))?
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidMessage("missing message type".to_string()))?
        .to_string();

    match kind.as_str() {
        "offer" => {
            let envelope: OfferEnvelope = serde_json::from_value(value)
                .map_err(|e| Error::InvalidMessage(format!("offer: {}", e)))?;
            let sdp = match envelope.sdp {
                OfferSdp::Text(sdp) => sdp,
                OfferSdp::Description { sdp } => sdp,
            };
            Ok(InboundMessage::Offer(SessionDescription::offer(sdp)))
        }
        "ice-candidate" => {
            let candidate: IceCandidate = serde_json::from_value(value)
                .map_err(|e| Error::InvalidMessage(format!("ice-candidate: {}", e)))?;
            Ok(InboundMessage::IceCandidate(candidate))
        }
        "error" => {
            let message = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unspecified server error")
                .to_string();
            Ok(InboundMessage::ServerError(message))
        }
        _ => Ok(InboundMessage::Other(kind)),
    }
}
