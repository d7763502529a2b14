//! Signaling channel for SDP and ICE exchange with the stream server
//!
//! - [`protocol`]: JSON message types and inbound decoding
//! - [`channel`]: channel ownership, event reporting and the transport seam
//! - [`websocket`]: the `tokio-tungstenite` transport

pub mod channel;
pub mod protocol;
pub mod websocket;

pub use channel::{
    ChannelEvent, ChannelEventSender, SignalingChannel, SignalingTransport, SocketLink,
};
pub use protocol::{
    decode_inbound, IceCandidate, InboundMessage, OutboundMessage, SdpKind, SessionDescription,
    WatchParams,
};
pub use websocket::WebSocketTransport;
