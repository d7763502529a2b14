//! Peer session seam and its event reporting

use crate::config::IceServerConfig;
use crate::generation::{Generation, Tagged};
use crate::media::MediaTrack;
use crate::signaling::{IceCandidate, SessionDescription};
use crate::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;

/// ICE connectivity state of a peer session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceConnectionState {
    New,
    Checking,
    Connected,
    Completed,
    Disconnected,
    Failed,
    Closed,
    Unspecified,
}

impl IceConnectionState {
    /// Terminal failure; the session cannot recover
    pub fn is_failed(&self) -> bool {
        matches!(self, IceConnectionState::Failed)
    }
}

impl fmt::Display for IceConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IceConnectionState::New => "new",
            IceConnectionState::Checking => "checking",
            IceConnectionState::Connected => "connected",
            IceConnectionState::Completed => "completed",
            IceConnectionState::Disconnected => "disconnected",
            IceConnectionState::Failed => "failed",
            IceConnectionState::Closed => "closed",
            IceConnectionState::Unspecified => "unspecified",
        };
        f.write_str(name)
    }
}

impl From<RTCIceConnectionState> for IceConnectionState {
    fn from(state: RTCIceConnectionState) -> Self {
        match state {
            RTCIceConnectionState::New => IceConnectionState::New,
            RTCIceConnectionState::Checking => IceConnectionState::Checking,
            RTCIceConnectionState::Connected => IceConnectionState::Connected,
            RTCIceConnectionState::Completed => IceConnectionState::Completed,
            RTCIceConnectionState::Disconnected => IceConnectionState::Disconnected,
            RTCIceConnectionState::Failed => IceConnectionState::Failed,
            RTCIceConnectionState::Closed => IceConnectionState::Closed,
            _ => IceConnectionState::Unspecified,
        }
    }
}

/// Events reported by a peer session to its owner
#[derive(Debug, Clone)]
pub enum PeerEvent {
    /// A media track was received
    Track(Arc<dyn MediaTrack>),
    /// ICE connectivity changed
    IceConnectionState(IceConnectionState),
    /// Offer negotiation finished; the local answer is ready to send
    AnswerReady(SessionDescription),
}

/// Reports peer events for one generation
#[derive(Debug, Clone)]
pub struct PeerEventSender {
    generation: Generation,
    tx: mpsc::UnboundedSender<Tagged<PeerEvent>>,
}

impl PeerEventSender {
    pub fn new(generation: Generation, tx: mpsc::UnboundedSender<Tagged<PeerEvent>>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn track(&self, track: Arc<dyn MediaTrack>) {
        self.emit(PeerEvent::Track(track));
    }

    pub fn ice_connection_state(&self, state: IceConnectionState) {
        self.emit(PeerEvent::IceConnectionState(state));
    }

    pub fn answer_ready(&self, answer: SessionDescription) {
        self.emit(PeerEvent::AnswerReady(answer));
    }

    fn emit(&self, event: PeerEvent) {
        if self.tx.send(Tagged::new(self.generation, event)).is_err() {
            debug!("Peer {} event dropped: controller is gone", self.generation);
        }
    }
}

/// A negotiated media session with the remote streamer
#[async_trait]
pub trait PeerSession: Send + Sync {
    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, description: SessionDescription) -> Result<()>;

    /// The applied local description, if any
    async fn local_description(&self) -> Option<SessionDescription>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    /// Release the session; must be safe to call repeatedly
    async fn close(&self) -> Result<()>;
}

/// Creates peer sessions
#[async_trait]
pub trait PeerSessionFactory: Send + Sync {
    /// Create a session using the given servers
    ///
    /// Tracks and connectivity changes are reported through `events`.
    async fn create(
        &self,
        ice_servers: &[IceServerConfig],
        events: PeerEventSender,
    ) -> Result<Arc<dyn PeerSession>>;
}
