//! Peer session management
//!
//! - [`session`]: the peer session seam and its events
//! - [`manager`]: session ownership, serialized negotiation and candidate handling
//! - [`connection`]: the `webrtc` crate implementation

pub mod connection;
pub mod manager;
pub mod session;

pub use connection::{is_webrtc_available, RtcPeerSession, RtcPeerSessionFactory};
pub use manager::{negotiate, PeerSessionManager};
pub use session::{
    IceConnectionState, PeerEvent, PeerEventSender, PeerSession, PeerSessionFactory,
};
